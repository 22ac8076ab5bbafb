pub mod config;
pub mod types;

pub use config::Config;
pub use types::{Category, Comment, CommentWithAuthor, Location, Post, PostCard, Profile, User};
