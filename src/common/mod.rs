pub mod axum_token;
pub mod context;
pub mod env;
pub mod error;
pub mod init;
pub mod redis_json;
pub mod redis_pool;
pub mod state;
