use rocket::{catch, http::Status, serde::json::Json, Request};

use crate::{
    api_key::Unauthorized,
    database::{Details, ServerError},
};

#[catch(401)]
pub fn unauthorized() -> Unauthorized {
    Unauthorized::new()
}

#[catch(500)]
pub fn server_error() -> Json<ServerError> {
    ServerError::json()
}

/// Wraps every other error status, malformed bodies and unknown routes included,
/// into the usual `details` body.
#[catch(default)]
pub fn default(status: Status, _request: &Request<'_>) -> (Status, Json<Details>) {
    (status, Details::new(status.reason().unwrap_or("Unknown error")))
}
