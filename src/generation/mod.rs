pub mod service;
pub mod upstream;

pub use service::{CacheStatus, GeneratedImage, GenerationError, ImageGenerator};
pub use upstream::{UpstreamClient, UpstreamError};
