use rocket::serde::{json::Json, Serialize};
use rocket::*;

use super::*;
use crate::{
    api_key::ApiKey,
    leaderboard::{self, Leaderboard, DEFAULT_TOP},
    record::{Record, RecordId, StoredRecord},
};

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Greeting {
    msg: &'static str,
}

#[get("/")]
pub fn index() -> Json<Greeting> {
    Json(Greeting {
        msg: "This is simple API for SET game leaderboard",
    })
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CreatedRecord {
    key: RecordId,
}

/// Stores a new game result and returns the id it was stored under.
#[post("/records", format = "json", data = "<record>")]
pub async fn create_record(
    record: Json<Record>,
    _api_key: ApiKey,
    repository: &State<Repository>,
) -> RequestResult<Json<CreatedRecord>> {
    save_record(record.0, repository).await
}

/// Same as `create_record`, for clients that post to `/records/`.
#[post("/records/", format = "json", data = "<record>")]
pub async fn create_record_slash(
    record: Json<Record>,
    _api_key: ApiKey,
    repository: &State<Repository>,
) -> RequestResult<Json<CreatedRecord>> {
    save_record(record.0, repository).await
}

async fn save_record(record: Record, repository: &Repository) -> RequestResult<Json<CreatedRecord>> {
    record.check()?;

    let key = repository.save(record).await?;
    tracing::debug!("Created record {}", key);

    Ok(Json(CreatedRecord { key }))
}

/// Returns the best `top` records, ranked by score or by time per point.
#[get("/records?<top>&<avg_time_based>")]
pub async fn get_leaderboard(
    top: Option<i64>,
    avg_time_based: Option<bool>,
    _api_key: ApiKey,
    repository: &State<Repository>,
) -> RequestResult<Json<Leaderboard<StoredRecord>>> {
    ranked_records(top, avg_time_based, repository).await
}

/// Same as `get_leaderboard`, for clients that ask for `/records/`.
#[get("/records/?<top>&<avg_time_based>")]
pub async fn get_leaderboard_slash(
    top: Option<i64>,
    avg_time_based: Option<bool>,
    _api_key: ApiKey,
    repository: &State<Repository>,
) -> RequestResult<Json<Leaderboard<StoredRecord>>> {
    ranked_records(top, avg_time_based, repository).await
}

async fn ranked_records(
    top: Option<i64>,
    avg_time_based: Option<bool>,
    repository: &Repository,
) -> RequestResult<Json<Leaderboard<StoredRecord>>> {
    let records = repository.fetch_all().await?;
    let leaderboard = leaderboard::rank(
        records,
        top.unwrap_or(DEFAULT_TOP),
        avg_time_based.unwrap_or(false),
    )?;
    tracing::debug!("Ranked {} records", leaderboard.len());

    Ok(Json(leaderboard))
}

/// Replaces the record stored under `game_id` if the new one is a valid successor.
/// The stored record is left as it was otherwise, whatever made the update invalid.
#[put("/records/<game_id>", format = "json", data = "<record>")]
pub async fn update_record(
    game_id: &str,
    record: Json<Record>,
    _api_key: ApiKey,
    repository: &State<Repository>,
) -> RequestResult<Json<Record>> {
    let record = record.0;
    let id = game_id
        .parse::<RecordId>()
        .map_err(|_| RequestError::RecordNotFound)?;

    let current = repository
        .get(id)
        .await?
        .ok_or(RequestError::RecordNotFound)?;

    if !record.is_valid_successor(&current) || record.check().is_err() {
        tracing::warn!("Invalid update requested. {:?} => {:?}", current, record);
        return Err(RequestError::InvalidUpdate);
    }

    repository
        .update(id, record.clone())
        .await?
        .ok_or(RequestError::RecordNotFound)?;

    Ok(Json(record))
}
