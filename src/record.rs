use rocket::serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GameScore = i32;

/// The highest score a single game of SET can reach.
pub const MAX_SCORE: GameScore = 81;

/// Player name of a result nobody has claimed yet.
pub const ANONYMOUS_PLAYER: &str = "Anonym";

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct Record {
    pub player: String,
    pub score: GameScore,
    pub time: f64,
}

impl Record {
    pub fn new(player: impl Into<String>, score: GameScore, time: f64) -> Self {
        Self {
            player: player.into(),
            score,
            time,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.player == ANONYMOUS_PLAYER
    }

    /// Checks whether `self` may replace `previous` in the database.
    ///
    /// A named record keeps its name, an anonymous one may be claimed by anyone.
    /// The score moves at most one point down or three points up and never
    /// exceeds [`MAX_SCORE`], and the time never goes back.
    pub fn is_valid_successor(&self, previous: &Record) -> bool {
        let same_player = self.player == previous.player || previous.is_anonymous();
        let score_step = previous.score.saturating_sub(1) <= self.score
            && self.score <= previous.score.saturating_add(3);
        let time_goes_on = self.time >= previous.time;
        let below_max = self.score <= MAX_SCORE;

        same_player && score_step && time_goes_on && below_max
    }

    /// Rejects records that could never come out of a real game.
    pub fn check(&self) -> Result<(), InvalidRecord> {
        if self.player.is_empty() {
            return Err(InvalidRecord::EmptyPlayer);
        }
        if !(0..=MAX_SCORE).contains(&self.score) {
            return Err(InvalidRecord::ScoreOutOfRange { score: self.score });
        }
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(InvalidRecord::InvalidTime { time: self.time });
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum InvalidRecord {
    #[error("player name is empty")]
    EmptyPlayer,
    #[error("score {score} is outside of 0..=81")]
    ScoreOutOfRange { score: GameScore },
    #[error("time {time} is not a valid duration")]
    InvalidTime { time: f64 },
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(crate = "rocket::serde", transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random (version 4) id.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A record together with the id it is stored under.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: Record,
}

impl StoredRecord {
    pub fn new(id: RecordId, record: Record) -> Self {
        Self { id, record }
    }
}
