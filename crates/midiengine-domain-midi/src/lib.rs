pub mod channel_table;
pub mod codec;

pub use channel_table::*;
pub use codec::*;
