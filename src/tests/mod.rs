use rocket::{
    http::{Header, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::{json, Value},
};

use crate::{
    api_key::ApiKeyError,
    config::Config,
    database::{InMemoryRecordsRepository, Repository, SqlRecordsRepository},
    leaderboard::Leaderboard,
    record::{Record, StoredRecord},
};


const API_KEY: &str = "test_key";

fn test_config() -> Config {
    Config::from_lookup(|variable| match variable {
        "LEADERBOARD_API_KEY" => Some(API_KEY.to_owned()),
        "LEADERBOARD_STORAGE" => Some("memory".to_owned()),
        _ => None,
    })
    .expect("valid test configuration")
}

async fn spawn_client_with(repository: Repository) -> Client {
    Client::tracked(super::build(test_config(), repository))
        .await
        .expect("valid rocket instance")
}

async fn spawn_client() -> Client {
    spawn_client_with(Box::new(InMemoryRecordsRepository::new())).await
}

async fn deserialize_response<'a, T: rocket::serde::DeserializeOwned>(
    response: LocalResponse<'a>,
) -> rocket::serde::json::serde_json::Result<T> {
    let string = response.into_string().await.unwrap();
    rocket::serde::json::serde_json::from_str(&string)
}

fn auth() -> Header<'static> {
    Header::new("authorization", API_KEY)
}

/// Submits `record` and returns the key it was stored under
async fn create_record<'a>(
    client: &'a Client,
    record: &Record,
) -> Result<String, LocalResponse<'a>> {
    let response = client.post("/records").header(auth()).json(record).dispatch().await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    let body = deserialize_response::<Value>(response).await.unwrap();
    Ok(body["key"].as_str().expect("key in response").to_owned())
}

/// Replaces the record at `uri` and returns the echoed record
async fn update_record<'a>(
    client: &'a Client,
    uri: &'a str,
    record: &Record,
) -> Result<Record, LocalResponse<'a>> {
    let response = client
        .put(uri)
        .header(auth())
        .json(record)
        .dispatch()
        .await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    Ok(deserialize_response::<Record>(response).await.unwrap())
}

/// Fetches the leaderboard at `uri`
async fn get_leaderboard<'a>(
    client: &'a Client,
    uri: &'a str,
) -> Result<Vec<StoredRecord>, LocalResponse<'a>> {
    let response = client.get(uri).header(auth()).dispatch().await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    let leaderboard = deserialize_response::<Leaderboard<StoredRecord>>(response)
        .await
        .unwrap();
    Ok(leaderboard.iter().cloned().collect())
}

fn players(records: &[StoredRecord]) -> Vec<&str> {
    records
        .iter()
        .map(|stored| stored.record.player.as_str())
        .collect()
}

#[rocket::async_test]
async fn index_is_public() {
    let client = spawn_client().await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(
        body,
        json!({"msg": "This is simple API for SET game leaderboard"})
    );
}

/// Creates a record and finds it on the leaderboard
#[rocket::async_test]
async fn create_and_list_record() {
    let client = spawn_client().await;

    let record = Record::new("Anonym", 9, 75.3);
    let key = create_record(&client, &record).await.unwrap();
    assert_eq!(key.len(), 36);

    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(leaderboard.len(), 1);
    assert_eq!(leaderboard[0].id.to_string(), key);
    assert_eq!(leaderboard[0].record, record);
}

/// An anonymous record gets claimed, after which nobody else can take it
#[rocket::async_test]
async fn claim_then_reject_rename() {
    let client = spawn_client().await;

    let key = create_record(&client, &Record::new("Anonym", 9, 75.3))
        .await
        .unwrap();

    let uri = format!("/records/{}", key);
    let claimed = Record::new("Chosen Name", 12, 103.5);
    let response = update_record(&client, &uri, &claimed).await;
    assert_eq!(response.unwrap(), claimed);

    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(leaderboard[0].record, claimed);

    let stolen = Record::new("Another Name", 9, 78.3);
    let response = update_record(&client, &uri, &stolen).await.unwrap_err();
    assert_eq!(response.status(), Status::BadRequest);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body, json!({"details": "Invalid update."}));

    // The stored record is untouched
    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(leaderboard[0].record, claimed);
}

#[rocket::async_test]
async fn invalid_updates_are_rejected() {
    let client = spawn_client().await;

    let updates = vec![
        Record::new("Another Name", 9, 78.3),
        Record::new("Chosen Name", 12, 16.3),
        Record::new("Chosen Name", 13, 90.3),
        Record::new("Chosen Name", 7, 90.3),
    ];

    for update in &updates {
        let key = create_record(&client, &Record::new("Chosen Name", 9, 75.3))
            .await
            .unwrap();

        let uri = format!("/records/{}", key);
        let response = update_record(&client, &uri, update).await.unwrap_err();
        assert_eq!(response.status(), Status::BadRequest, "{:?}", update);
        let body = deserialize_response::<Value>(response).await.unwrap();
        assert_eq!(body, json!({"details": "Invalid update."}));
    }
}

#[rocket::async_test]
async fn update_of_unknown_record() {
    let client = spawn_client().await;
    let record = Record::new("Chosen Name", 9, 75.3);

    let unknown = "/records/6f1c1b7e-3f2a-4c55-9d5e-3e0b1f1a2b3c";
    let response = update_record(&client, unknown, &record).await.unwrap_err();
    assert_eq!(response.status(), Status::NotFound);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body, json!({"details": "Record not found"}));

    let response = update_record(&client, "/records/not-a-uuid", &record)
        .await
        .unwrap_err();
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn records_need_the_api_key() {
    let client = spawn_client().await;

    let response = client
        .post("/records")
        .json(&Record::new("Anonym", 9, 75.3))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(
        response.headers().get_one("WWW-Authenticate"),
        Some("Prmtv realm='Poorly secured leaderboard'")
    );
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body, json!({"details": "Unauthorized"}));

    let response = client
        .get("/records")
        .header(Header::new("authorization", "thatisarandomkey"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn api_key_errors_are_readable() {
    assert_eq!(ApiKeyError::Missing.to_string(), "the key is missing");
    assert_eq!(ApiKeyError::Invalid.to_string(), "the key is invalid");
}

#[rocket::async_test]
async fn impossible_records_are_refused() {
    let client = spawn_client().await;

    let records = vec![
        Record::new("", 9, 75.3),
        Record::new("Anonym", 82, 75.3),
        Record::new("Anonym", -1, 75.3),
        Record::new("Anonym", 9, -0.5),
    ];
    for record in &records {
        let response = create_record(&client, record).await.unwrap_err();
        assert_eq!(response.status(), Status::BadRequest, "{:?}", record);
    }

    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert!(leaderboard.is_empty());
}

#[rocket::async_test]
async fn malformed_body_is_unprocessable() {
    let client = spawn_client().await;

    let response = client
        .post("/records")
        .header(auth())
        .header(rocket::http::ContentType::JSON)
        .body(r#"{"player": "Anonym", "score": 9}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert!(body["details"].is_string());
}

#[rocket::async_test]
async fn leaderboard_query_parameters() {
    let client = spawn_client().await;

    for record in &[
        Record::new("A", 9, 75.3),
        Record::new("B", 12, 50.0),
        Record::new("C", 12, 60.0),
        Record::new("D", 3, 3.0),
    ] {
        create_record(&client, record).await.unwrap();
    }

    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(players(&leaderboard), vec!["B", "C", "A"]);

    let leaderboard = get_leaderboard(&client, "/records?top=1").await.unwrap();
    assert_eq!(players(&leaderboard), vec!["B"]);

    let leaderboard = get_leaderboard(&client, "/records?top=10").await.unwrap();
    assert_eq!(players(&leaderboard), vec!["B", "C", "A", "D"]);

    let leaderboard = get_leaderboard(&client, "/records?top=0").await.unwrap();
    assert!(leaderboard.is_empty());

    let leaderboard = get_leaderboard(&client, "/records?avg_time_based=true&top=4")
        .await
        .unwrap();
    assert_eq!(players(&leaderboard), vec!["D", "B", "C", "A"]);
}

#[rocket::async_test]
async fn zero_score_breaks_time_based_leaderboard() {
    let client = spawn_client().await;

    create_record(&client, &Record::new("A", 9, 75.3)).await.unwrap();
    create_record(&client, &Record::new("Zero", 0, 10.0))
        .await
        .unwrap();

    let response = get_leaderboard(&client, "/records?avg_time_based=true")
        .await
        .unwrap_err();
    assert_eq!(response.status(), Status::InternalServerError);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(
        body,
        json!({"error": "Server error", "message": "An unexpected error occurred"})
    );

    // The score based leaderboard still works
    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(players(&leaderboard), vec!["A", "Zero"]);
}

#[rocket::async_test]
async fn allowed_origins_get_cors_headers() {
    let client = spawn_client().await;

    let response = client
        .get("/")
        .header(Header::new("Origin", "http://localhost:3000"))
        .dispatch()
        .await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("http://localhost:3000")
    );
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Credentials"),
        Some("true")
    );

    let response = client
        .get("/")
        .header(Header::new("Origin", "http://evil.example"))
        .dispatch()
        .await;
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), None);

    let response = client
        .options("/records")
        .header(Header::new("Origin", "http://localhost:3001"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("http://localhost:3001")
    );
}

#[rocket::async_test]
async fn trailing_slash_reaches_the_records_routes() {
    let client = spawn_client().await;

    for record in &[Record::new("A", 9, 75.3), Record::new("B", 12, 50.0)] {
        let response = client.post("/records/").header(auth()).json(record).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    let leaderboard = get_leaderboard(&client, "/records/").await.unwrap();
    assert_eq!(players(&leaderboard), vec!["B", "A"]);

    let leaderboard = get_leaderboard(&client, "/records/?top=1").await.unwrap();
    assert_eq!(players(&leaderboard), vec!["B"]);

    let response = client.get("/records/").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

/// Updates breaking the record shape get the same answer as any other refused update
#[rocket::async_test]
async fn impossible_update_is_an_invalid_update() {
    let client = spawn_client().await;

    let key = create_record(&client, &Record::new("Chosen Name", 80, 100.0))
        .await
        .unwrap();
    let uri = format!("/records/{}", key);

    for update in &[
        Record::new("Chosen Name", 82, 101.0),
        Record::new("", 81, 101.0),
    ] {
        let response = update_record(&client, &uri, update).await.unwrap_err();
        assert_eq!(response.status(), Status::BadRequest, "{:?}", update);
        let body = deserialize_response::<Value>(response).await.unwrap();
        assert_eq!(body, json!({"details": "Invalid update."}));
    }

    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(leaderboard[0].record, Record::new("Chosen Name", 80, 100.0));
}

#[rocket::async_test]
async fn hosted_frontend_origins_match_the_pattern() {
    let client = spawn_client().await;

    for origin in &["http://34.96.45.10", "http://34.34.236.255"] {
        let response = client
            .get("/")
            .header(Header::new("Origin", *origin))
            .dispatch()
            .await;
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some(*origin)
        );
    }

    for origin in &[
        "http://34.96.44.10",
        "http://34.96.45.256",
        "https://34.96.45.10",
        "http://34.96.45.10.evil.example",
    ] {
        let response = client
            .get("/")
            .header(Header::new("Origin", *origin))
            .dispatch()
            .await;
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            None,
            "{}",
            origin
        );
    }
}

/// The same claim scenario, persisted through sqlx
#[rocket::async_test]
async fn claim_record_in_sql_database() {
    let repository = SqlRecordsRepository::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite database");
    let client = spawn_client_with(Box::new(repository)).await;

    let key = create_record(&client, &Record::new("Anonym", 9, 75.3))
        .await
        .unwrap();

    let uri = format!("/records/{}", key);
    let claimed = Record::new("Chosen Name", 12, 103.5);
    assert_eq!(update_record(&client, &uri, &claimed).await.unwrap(), claimed);

    let stolen = Record::new("Another Name", 9, 78.3);
    let response = update_record(&client, &uri, &stolen).await.unwrap_err();
    assert_eq!(response.status(), Status::BadRequest);

    let leaderboard = get_leaderboard(&client, "/records").await.unwrap();
    assert_eq!(leaderboard.len(), 1);
    assert_eq!(leaderboard[0].id.to_string(), key);
    assert_eq!(leaderboard[0].record, claimed);
}
