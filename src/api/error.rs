use crate::cache::StoreError;
use crate::generation::{GenerationError, UpstreamError};
use rocket::http::{ContentType, Status};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    UpstreamError(UpstreamError),
    StoreError(StoreError),
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::Upstream(e) => ApiError::UpstreamError(e),
            GenerationError::Store(e) => ApiError::StoreError(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::UpstreamError(UpstreamError::NoImages) => Status::InternalServerError,
            ApiError::UpstreamError(UpstreamError::StatusError(_)) => Status::BadGateway,
            ApiError::UpstreamError(UpstreamError::DecodeError(_)) => Status::BadGateway,
            ApiError::UpstreamError(UpstreamError::NetworkError(_)) => Status::ServiceUnavailable,
            ApiError::StoreError(_) => Status::InternalServerError,
        }
    }
}

fn json_error(status: Status, error: &str, message: String) -> rocket::response::Result<'static> {
    let body = json!({
        "error": error,
        "message": message
    })
    .to_string();

    rocket::Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(None, std::io::Cursor::new(body))
        .ok()
}

impl<'r> rocket::response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();
        match self {
            ApiError::UpstreamError(UpstreamError::NoImages) => rocket::Response::build()
                .status(status)
                .header(ContentType::Plain)
                .sized_body(None, std::io::Cursor::new("No image returned"))
                .ok(),
            ApiError::UpstreamError(UpstreamError::StatusError(upstream_status)) => json_error(
                status,
                "Upstream error",
                format!("Generation backend responded with {}", upstream_status),
            ),
            ApiError::UpstreamError(UpstreamError::DecodeError(message)) => {
                json_error(status, "Invalid upstream response", message)
            }
            ApiError::UpstreamError(UpstreamError::NetworkError(error)) => {
                json_error(status, "Upstream unreachable", error.to_string())
            }
            ApiError::StoreError(error) => json_error(status, "Cache store error", error.to_string()),
        }
    }
}
