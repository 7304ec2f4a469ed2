use crate::record::{Record, RecordId, StoredRecord};

mod memory;
mod request_error;
pub mod requests;
mod sql;

pub use memory::InMemoryRecordsRepository;
pub use request_error::*;
pub use sql::SqlRecordsRepository;

pub type DatabasePool = sqlx::any::AnyPool;

/// The repository handed to request handlers through managed state.
pub type Repository = Box<dyn RecordsRepository>;

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored record has a malformed id: {id}")]
    MalformedId { id: String },
}

/// Storage for game records.
#[rocket::async_trait]
pub trait RecordsRepository: Send + Sync {
    /// Returns the record stored under `id`, if any.
    async fn get(&self, id: RecordId) -> RepositoryResult<Option<Record>>;

    /// Stores `record` under a freshly generated id and returns that id.
    async fn save(&self, record: Record) -> RepositoryResult<RecordId>;

    /// Overwrites the record stored under `id`.
    /// Returns `None` if nothing is stored under `id`.
    async fn update(&self, id: RecordId, record: Record) -> RepositoryResult<Option<RecordId>>;

    async fn fetch_all(&self) -> RepositoryResult<Vec<StoredRecord>>;
}
