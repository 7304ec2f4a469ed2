use std::{path::PathBuf, str::FromStr};

use regex::Regex;

pub const DEFAULT_API_KEY: &str = "set_key";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost",
    "https://localhost",
    "http://localhost:3000",
    "https://localhost:3000",
    "http://localhost:3001",
    "https://localhost:3001",
];

/// Cloud Run address ranges the hosted frontend calls from.
pub const DEFAULT_ALLOWED_ORIGIN_REGEX: &str = concat!(
    r"http://34\.96\.4[5-8]\.([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])",
    "|",
    r"http://34\.34\.23[3-6]\.([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])",
);

pub const DEFAULT_LOG_DIRECTORY: &str = ".";

/// Allows every origin the whole pattern matches.
#[derive(Clone, Debug)]
pub struct OriginPattern {
    source: String,
    regex: Regex,
}

impl OriginPattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    pub fn is_match(&self, origin: &str) -> bool {
        self.regex.is_match(origin)
    }
}

impl PartialEq for OriginPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            _ => Err(ConfigError::Invalid {
                variable: "ENVIRONMENT",
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Storage {
    Memory,
    Sql {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub environment: Environment,
    pub api_key: String,
    pub storage: Storage,
    pub allowed_origins: Vec<String>,
    pub allowed_origin_regex: Option<OriginPattern>,
    pub log_directory: PathBuf,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{variable} has an invalid value: {value}")]
    Invalid {
        variable: &'static str,
        value: String,
    },
    #[error("{variable} environment variable is not set")]
    Missing { variable: &'static str },
}

impl Config {
    /// Reads the configuration from the environment and an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|variable| dotenv::var(variable).ok())
    }

    /// Builds the configuration from whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("ENVIRONMENT") {
            Some(value) => value.parse()?,
            None => Environment::Production,
        };

        let api_key = lookup("LEADERBOARD_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_owned());

        let database_url = lookup("DATABASE_URL");
        let storage = match lookup("LEADERBOARD_STORAGE").as_deref() {
            Some("memory") => Storage::Memory,
            Some("sql") => Storage::Sql {
                database_url: database_url.ok_or(ConfigError::Missing {
                    variable: "DATABASE_URL",
                })?,
                max_connections: max_connections(&lookup)?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    variable: "LEADERBOARD_STORAGE",
                    value: other.to_owned(),
                })
            }
            None => match database_url {
                Some(database_url) => Storage::Sql {
                    database_url,
                    max_connections: max_connections(&lookup)?,
                },
                None => Storage::Memory,
            },
        };

        let allowed_origins = match lookup("LEADERBOARD_ALLOWED_ORIGINS") {
            Some(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|&origin| origin.to_owned())
                .collect(),
        };

        let allowed_origin_regex = match lookup("LEADERBOARD_ALLOWED_ORIGIN_REGEX") {
            Some(source) if source.trim().is_empty() => None,
            Some(source) => match OriginPattern::new(&source) {
                Ok(pattern) => Some(pattern),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        variable: "LEADERBOARD_ALLOWED_ORIGIN_REGEX",
                        value: source,
                    })
                }
            },
            None => OriginPattern::new(DEFAULT_ALLOWED_ORIGIN_REGEX).ok(),
        };

        let log_directory = lookup("LEADERBOARD_LOG_DIR")
            .unwrap_or_else(|| DEFAULT_LOG_DIRECTORY.to_owned())
            .into();

        Ok(Self {
            environment,
            api_key,
            storage,
            allowed_origins,
            allowed_origin_regex,
            log_directory,
        })
    }
}

fn max_connections(lookup: &impl Fn(&str) -> Option<String>) -> Result<u32, ConfigError> {
    match lookup("DATABASE_MAX_CONNECTIONS") {
        Some(value) => match value.parse() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(ConfigError::Invalid {
                variable: "DATABASE_MAX_CONNECTIONS",
                value,
            }),
        },
        None => Ok(DEFAULT_MAX_CONNECTIONS),
    }
}
