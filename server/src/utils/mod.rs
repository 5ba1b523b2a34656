pub mod error;
pub mod ids;
pub mod response;

pub use error::AppError;
