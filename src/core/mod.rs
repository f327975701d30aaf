pub mod config;
pub mod router;
pub mod view;

pub use protocol::models;
pub use protocol::{AppError, AppResult, ResultExt};
