use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};

use crate::config::Config;

/// Proof that the request carried the shared api key in its `authorization` header.
pub struct ApiKey;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ApiKeyError {
    #[error("the key is missing")]
    Missing,
    #[error("the key is invalid")]
    Invalid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ApiKey {
    type Error = ApiKeyError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let expected = match request.rocket().state::<Config>() {
            Some(config) => config.api_key.as_str(),
            None => return Outcome::Error((Status::InternalServerError, ApiKeyError::Invalid)),
        };

        match request.headers().get_one("authorization") {
            None => {
                tracing::warn!("Unauthorized request: {}", ApiKeyError::Missing);
                Outcome::Error((Status::Unauthorized, ApiKeyError::Missing))
            }
            Some(key) if key == expected => Outcome::Success(ApiKey),
            Some(_) => {
                tracing::warn!("Unauthorized request: {}", ApiKeyError::Invalid);
                Outcome::Error((Status::Unauthorized, ApiKeyError::Invalid))
            }
        }
    }
}
