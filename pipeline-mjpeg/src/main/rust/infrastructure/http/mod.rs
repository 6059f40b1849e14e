pub mod handlers;
pub mod health;
pub mod rejection;
pub mod routes;

pub use rejection::{handle_rejection, reject, ApiError};
pub use routes::routes;
