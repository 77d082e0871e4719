use rocket::http::{ContentType, Header, Status};
use rocket::request::{self, FromRequest};
use rocket::{request::Request, response::{self, Response, Responder}};
use rocket::State;
use std::convert::Infallible;
use std::io::Cursor;

use crate::api::ApiError;
use crate::generation::{CacheStatus, GeneratedImage, ImageGenerator};
use crate::params::EscapeMode;

/// Decoded query pairs in the order they appear in the request URI.
pub struct QueryPairs(pub Vec<(String, String)>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for QueryPairs {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let pairs = req
            .uri()
            .query()
            .map(|query| {
                query
                    .segments()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        request::Outcome::Success(QueryPairs(pairs))
    }
}

#[get("/txt2img")]
pub async fn txt2img(
    query: QueryPairs,
    generator: &State<ImageGenerator>,
) -> Result<ImageResponse, ApiError> {
    generate(query, generator, EscapeMode::Standard).await
}

#[get("/txt2img/overescaped")]
pub async fn txt2img_overescaped(
    query: QueryPairs,
    generator: &State<ImageGenerator>,
) -> Result<ImageResponse, ApiError> {
    generate(query, generator, EscapeMode::Overescape).await
}

async fn generate(
    query: QueryPairs,
    generator: &ImageGenerator,
    mode: EscapeMode,
) -> Result<ImageResponse, ApiError> {
    log::debug!("txt2img request ({:?}) with {} query parameters", mode, query.0.len());

    let image = generator.handle(query.0, mode).await?;
    Ok(ImageResponse::from(image))
}

// Responder for generated images
pub struct ImageResponse {
    pub data: Vec<u8>,
    pub key: String,
    pub status: CacheStatus,
}

impl From<GeneratedImage> for ImageResponse {
    fn from(image: GeneratedImage) -> Self {
        Self {
            data: image.data,
            key: image.key.to_string(),
            status: image.status,
        }
    }
}

impl<'r> Responder<'r, 'static> for ImageResponse {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let etag = format!("\"{:x}\"", md5::compute(&self.data));
        let cache_control = match self.status {
            CacheStatus::Bypass => "no-store",
            CacheStatus::Hit | CacheStatus::Miss => "public, max-age=86400",
        };

        if let Some(if_none_match) = req.headers().get_one("If-None-Match") {
            if etag_matches(if_none_match, &etag) {
                return Response::build()
                    .status(Status::NotModified)
                    .header(Header::new("ETag", etag))
                    .header(Header::new("Cache-Control", cache_control))
                    .header(Header::new("X-Cache-Status", self.status.as_str()))
                    .header(Header::new("X-Cache-Key", self.key))
                    .ok();
            }
        }

        Response::build()
            .header(ContentType::PNG)
            .header(Header::new("Cache-Control", cache_control))
            .header(Header::new("ETag", etag))
            .header(Header::new("X-Cache-Status", self.status.as_str()))
            .header(Header::new("X-Cache-Key", self.key))
            .sized_body(self.data.len(), Cursor::new(self.data))
            .ok()
    }
}

/// Weak comparison of an `If-None-Match` list against our entity tag.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag)
}
