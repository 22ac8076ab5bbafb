pub mod auth;
pub mod error;
pub mod media;
pub mod server;
pub mod views;

pub use error::AppError;
pub use server::{router, AppState, Server};
