use std::{cmp::Ordering, convert::TryFrom};

use rocket::serde::{self, Deserialize, Serialize};

use crate::record::{GameScore, Record, StoredRecord};

pub const DEFAULT_TOP: i64 = 3;

pub struct Leaderboard<T: LeaderboardItem> {
    collection: Vec<T>,
}

impl<T: LeaderboardItem> Leaderboard<T> {
    pub fn new(collection: Vec<T>) -> Self {
        Self { collection }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.collection.iter()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }
}

impl<T: LeaderboardItem> Serialize for Leaderboard<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.collection.serialize(serializer)
    }
}

impl<'de, T: LeaderboardItem> Deserialize<'de> for Leaderboard<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::new(Vec::deserialize(deserializer)?))
    }
}

/// Anything with a score and a time can take a place on the leaderboard.
pub trait LeaderboardItem: Serialize {
    fn player(&self) -> &str;
    fn score(&self) -> GameScore;
    fn time(&self) -> f64;
}

impl LeaderboardItem for Record {
    fn player(&self) -> &str {
        &self.player
    }

    fn score(&self) -> GameScore {
        self.score
    }

    fn time(&self) -> f64 {
        self.time
    }
}

impl LeaderboardItem for StoredRecord {
    fn player(&self) -> &str {
        &self.record.player
    }

    fn score(&self) -> GameScore {
        self.record.score
    }

    fn time(&self) -> f64 {
        self.record.time
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RankError {
    #[error("division by zero: {player} has a score of 0, time per point is undefined")]
    ZeroScore { player: String },
}

/// Orders `items` and keeps the best `top` of them.
///
/// By default the best score wins and the faster game breaks ties.
/// With `avg_time_based` the lowest time per point wins instead,
/// which is undefined for a zero score and fails with [`RankError::ZeroScore`].
pub fn rank<T: LeaderboardItem>(
    mut items: Vec<T>,
    top: i64,
    avg_time_based: bool,
) -> Result<Leaderboard<T>, RankError> {
    if avg_time_based {
        if let Some(item) = items.iter().find(|item| item.score() == 0) {
            return Err(RankError::ZeroScore {
                player: item.player().to_owned(),
            });
        }
        items.sort_by(|a, b| compare_times(time_per_point(a), time_per_point(b)));
    } else {
        // Both passes are stable, so ties in score stay ordered by time
        items.sort_by(|a, b| compare_times(a.time(), b.time()));
        items.sort_by(|a, b| b.score().cmp(&a.score()));
    }

    let top = usize::try_from(top.max(0)).unwrap_or(usize::MAX);
    items.truncate(top);
    Ok(Leaderboard::new(items))
}

fn time_per_point<T: LeaderboardItem>(item: &T) -> f64 {
    item.time() / f64::from(item.score())
}

/// Equal times, `0.0` and `-0.0` included, keep their order in a stable sort.
fn compare_times(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
