pub mod api;
pub mod error;

pub use api::{AwesomeAPI, RateSource};
pub use error::{ApiError, ApiResult};
