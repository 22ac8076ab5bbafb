pub mod cli;
pub mod core;
pub mod db;
pub mod forms;
pub mod models;
pub mod theme;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{router, AppError, AppState, Server};
pub use crate::db::Database;
pub use crate::models::Config;
pub use crate::theme::ThemeRenderer;
