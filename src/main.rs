use rocket::{catchers, routes, Build, Rocket};

use crate::config::{Config, ConfigError, Storage};
use crate::database::{
    InMemoryRecordsRepository, Repository, RepositoryError, SqlRecordsRepository,
};

mod api_key;
mod config;
mod cors;
mod database;
mod errors;
mod leaderboard;
mod logging;
mod record;
#[cfg(test)]
mod tests;

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open the records repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("failed to set up the log files: {0}")]
    Logging(#[from] tracing_appender::rolling::InitError),
    #[error("failed to launch the server: {0}")]
    Launch(#[from] rocket::Error),
}

#[rocket::main]
async fn main() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(config.environment, &config.log_directory)?;

    let repository = open_repository(&config.storage).await?;
    build(config, repository).launch().await?;

    Ok(())
}

/// Opens the repository selected by the configuration.
async fn open_repository(storage: &Storage) -> Result<Repository, RepositoryError> {
    match storage {
        Storage::Memory => {
            tracing::info!("Keeping records in memory");
            Ok(Box::new(InMemoryRecordsRepository::new()))
        }
        Storage::Sql {
            database_url,
            max_connections,
        } => {
            tracing::info!("Keeping records in the database");
            let repository = SqlRecordsRepository::connect(database_url, *max_connections).await?;
            Ok(Box::new(repository))
        }
    }
}

/// Builds the rocket around an already opened repository.
fn build(config: Config, repository: Repository) -> Rocket<Build> {
    let cors = cors::Cors::new(
        config.allowed_origins.clone(),
        config.allowed_origin_regex.clone(),
    );

    rocket::build()
        .mount(
            "/",
            routes![
                database::requests::index,
                database::requests::create_record,
                database::requests::create_record_slash,
                database::requests::get_leaderboard,
                database::requests::get_leaderboard_slash,
                database::requests::update_record,
                cors::preflight,
            ],
        )
        .register(
            "/",
            catchers![
                errors::unauthorized,
                errors::server_error,
                errors::default
            ],
        )
        .attach(logging::RequestLogger)
        .attach(cors)
        .manage::<Repository>(repository)
        .manage::<Config>(config)
}
