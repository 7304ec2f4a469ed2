use rocket::{
    http::Status,
    response::{self, Responder},
    serde::{json::Json, Serialize},
    Request, Response,
};

use super::RepositoryError;
use crate::{leaderboard::RankError, record::InvalidRecord};

#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("Record not found")]
    RecordNotFound,
    #[error("Invalid update.")]
    InvalidUpdate,
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] InvalidRecord),
    #[error("leaderboard could not be ranked: {0}")]
    Ranking(#[from] RankError),
    #[error("repository failure: {0}")]
    Repository(#[from] RepositoryError),
}

impl RequestError {
    pub fn status(&self) -> Status {
        match self {
            Self::RecordNotFound => Status::NotFound,
            Self::InvalidUpdate | Self::InvalidRecord(_) => Status::BadRequest,
            Self::Ranking(_) | Self::Repository(_) => Status::InternalServerError,
        }
    }
}

/// Body of every client error response.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Details {
    pub details: String,
}

impl Details {
    pub fn new(details: impl Into<String>) -> Json<Self> {
        Json(Self {
            details: details.into(),
        })
    }
}

/// Body of every server error response, the cause only goes to the log.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ServerError {
    pub error: &'static str,
    pub message: &'static str,
}

impl ServerError {
    pub fn json() -> Json<Self> {
        Json(Self {
            error: "Server error",
            message: "An unexpected error occurred",
        })
    }
}

impl<'r> Responder<'r, 'static> for RequestError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = if status.code >= 500 {
            tracing::error!("Unexpected error: {}", self);
            ServerError::json().respond_to(request)?
        } else {
            Details::new(self.to_string()).respond_to(request)?
        };

        Response::build_from(body).status(status).ok()
    }
}

pub type RequestResult<T, E = RequestError> = std::result::Result<T, E>;
