//! HTTP request handlers.

pub mod answers;
pub mod health;

pub use answers::post_answer;
pub use health::health_check;
