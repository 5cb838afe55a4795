//! HTTP request handlers organized by resource type

pub mod health;
pub mod secrets;

pub use health::health_handler;
pub use secrets::{
    create_secret_handler, delete_secret_handler, get_secret_handler, list_secrets_handler,
    update_secret_handler,
};
