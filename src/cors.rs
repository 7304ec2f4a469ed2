use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, Status},
    Request, Response,
};

use crate::config::OriginPattern;

/// Lets the configured browser origins call the api.
pub struct Cors {
    allowed_origins: Vec<String>,
    allowed_origin_regex: Option<OriginPattern>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>, allowed_origin_regex: Option<OriginPattern>) -> Self {
        Self {
            allowed_origins,
            allowed_origin_regex,
        }
    }

    fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
            || self
                .allowed_origin_regex
                .as_ref()
                .map_or(false, |pattern| pattern.is_match(origin))
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let origin = match request.headers().get_one("Origin") {
            Some(origin) if self.allows(origin) => origin.to_owned(),
            _ => return,
        };

        response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "authorization, content-type",
        ));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

/// Answers CORS preflight requests, the fairing adds the headers.
#[rocket::options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}
