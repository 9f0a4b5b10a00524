pub mod app;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod lifecycle;

pub use app::*;
pub use engine::*;
pub use error::*;
pub use ipc::*;
pub use lifecycle::*;
