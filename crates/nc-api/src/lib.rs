//! # nc-api
//!
//! JSON HTTP API for NC Ops, mounted under `/api/v1`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ApiError, ApiResult};
pub use extractors::AppState;
pub use routes::router;
