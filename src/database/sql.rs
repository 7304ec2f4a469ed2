use sqlx::{any::AnyPoolOptions, Row};

use super::{DatabasePool, RecordsRepository, RepositoryError, RepositoryResult};
use crate::record::{GameScore, Record, RecordId, StoredRecord};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS records (
    id VARCHAR(36) PRIMARY KEY,
    player_name VARCHAR(255) NOT NULL,
    score INTEGER NOT NULL,
    time DOUBLE PRECISION NOT NULL
)";

/// Keeps records in the `records` table of any database sqlx can talk to.
pub struct SqlRecordsRepository {
    pool: DatabasePool,
    placeholders: Placeholders,
}

impl SqlRecordsRepository {
    /// Connects to `database_url` and creates the `records` table if it is missing.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        Ok(Self {
            pool,
            placeholders: Placeholders::for_url(database_url),
        })
    }
}

#[rocket::async_trait]
impl RecordsRepository for SqlRecordsRepository {
    async fn get(&self, id: RecordId) -> RepositoryResult<Option<Record>> {
        let sql = format!(
            "SELECT player_name, score, time FROM records WHERE id = {}",
            self.placeholders.nth(1)
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Record::new(
                row.try_get::<String, usize>(0)?,
                row.try_get::<GameScore, usize>(1)?,
                row.try_get::<f64, usize>(2)?,
            ))),
            None => Ok(None),
        }
    }

    async fn save(&self, record: Record) -> RepositoryResult<RecordId> {
        let id = RecordId::generate();
        let sql = format!(
            "INSERT INTO records (id, player_name, score, time) VALUES ({}, {}, {}, {})",
            self.placeholders.nth(1),
            self.placeholders.nth(2),
            self.placeholders.nth(3),
            self.placeholders.nth(4),
        );
        sqlx::query(&sql)
            .bind(id.to_string())
            .bind(record.player)
            .bind(record.score)
            .bind(record.time)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn update(&self, id: RecordId, record: Record) -> RepositoryResult<Option<RecordId>> {
        let sql = format!(
            "UPDATE records SET player_name = {}, score = {}, time = {} WHERE id = {}",
            self.placeholders.nth(1),
            self.placeholders.nth(2),
            self.placeholders.nth(3),
            self.placeholders.nth(4),
        );
        let response = sqlx::query(&sql)
            .bind(record.player)
            .bind(record.score)
            .bind(record.time)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if response.rows_affected() > 0 {
            return Ok(Some(id));
        }
        // MySQL reports zero affected rows when nothing changed
        Ok(self.get(id).await?.map(|_| id))
    }

    async fn fetch_all(&self) -> RepositoryResult<Vec<StoredRecord>> {
        let rows = sqlx::query("SELECT id, player_name, score, time FROM records")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> RepositoryResult<StoredRecord> {
                let id = row.try_get::<String, usize>(0)?;
                let id = id
                    .parse::<RecordId>()
                    .map_err(|_| RepositoryError::MalformedId { id })?;
                let record = Record::new(
                    row.try_get::<String, usize>(1)?,
                    row.try_get::<GameScore, usize>(2)?,
                    row.try_get::<f64, usize>(3)?,
                );
                Ok(StoredRecord::new(id, record))
            })
            .collect()
    }
}

/// Bind parameter syntax of the database behind the url.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Placeholders {
    /// `?`
    QuestionMark,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@p1`, `@p2`, ...
    AtP,
}

impl Placeholders {
    fn for_url(database_url: &str) -> Self {
        let scheme = database_url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Self::Dollar,
            "mssql" | "sqlserver" => Self::AtP,
            _ => Self::QuestionMark,
        }
    }

    fn nth(self, index: usize) -> String {
        match self {
            Self::QuestionMark => "?".to_owned(),
            Self::Dollar => format!("${}", index),
            Self::AtP => format!("@p{}", index),
        }
    }
}
