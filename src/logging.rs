use std::{path::Path, time::Instant};

use rocket::{
    fairing::{Fairing, Info, Kind},
    Data, Request, Response,
};
use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

pub const LOG_FILE_PREFIX: &str = "app";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const MAX_LOG_FILES: usize = 10;

/// Installs the global tracing subscriber, Rocket's own log records included.
/// Production also writes to daily rotated files in `log_directory`; the
/// returned guard flushes them and must live as long as the server.
/// Does nothing if a subscriber is already installed.
pub fn init(
    environment: Environment,
    log_directory: &Path,
) -> Result<Option<WorkerGuard>, InitError> {
    let level = match environment {
        Environment::Development => Level::DEBUG,
        Environment::Production => Level::INFO,
    };

    let (file_layer, guard) = match environment {
        Environment::Development => (None, None),
        Environment::Production => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(log_directory)?);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
    };

    let _ = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    Ok(guard)
}

/// `app.<date>.log` files in `directory`, a new one every day, the oldest
/// removed past [`MAX_LOG_FILES`].
pub fn file_appender(directory: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(directory)
}

/// Logs every request as it starts and as it completes.
pub struct RequestLogger;

#[derive(Clone, Copy)]
struct RequestStart(Option<Instant>);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(|| RequestStart(Some(Instant::now())));

        let client = match request.client_ip() {
            Some(ip) => ip.to_string(),
            None => "?".to_owned(),
        };
        tracing::info!(
            "Request from {} started: {} {}",
            client,
            request.method(),
            request.uri()
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed = match request.local_cache(|| RequestStart(None)).0 {
            Some(start) => start.elapsed().as_secs_f64(),
            None => 0.0,
        };
        tracing::info!(
            "Request completed: {} {} - Status: {} - Time: {:.3}s",
            request.method(),
            request.uri(),
            response.status(),
            elapsed
        );
    }
}
