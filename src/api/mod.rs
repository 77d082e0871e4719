pub mod error;
pub mod txt2img;

pub use error::ApiError;
