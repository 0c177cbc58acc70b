//! HTTP adapters: error mapping, body extraction, and the chat route.

pub mod chat;
pub mod error;
pub mod extract;

pub use error::ApiError;
pub use extract::AppJson;
