pub mod storage;
pub mod synth;
pub mod types;

pub use storage::*;
pub use synth::*;
pub use types::*;
