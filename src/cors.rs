use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response};

/// Lets browsers embed generated images from other origins.
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "GET, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "If-None-Match"));
        response.set_header(Header::new(
            "Access-Control-Expose-Headers",
            "ETag, X-Cache-Status, X-Cache-Key",
        ));
    }
}

/// Answers CORS preflight requests; the fairing adds the allow headers.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}
