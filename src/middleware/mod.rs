pub mod auth;
pub mod eatery;

pub use auth::{authenticate_middleware, CurrentUser};
pub use eatery::eatery_guard_middleware;
