use rocket::{http::Header, serde::json::Json};

use crate::database::Details;

mod guard;

pub use guard::*;

/// Response for requests turned away by the [`ApiKey`] guard.
#[derive(rocket::Responder)]
#[response(status = 401, content_type = "json")]
pub struct Unauthorized {
    body: Json<Details>,
    challenge: Header<'static>,
}

impl Unauthorized {
    pub fn new() -> Self {
        Self {
            body: Details::new("Unauthorized"),
            challenge: Header::new(
                "WWW-Authenticate",
                "Prmtv realm='Poorly secured leaderboard'",
            ),
        }
    }
}
