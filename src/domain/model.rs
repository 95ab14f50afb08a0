use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const NUMBERS_PER_DRAW: usize = 15;
pub const NUMBER_RANGE: RangeInclusive<i64> = 1..=25;

/// One Lotofácil drawing in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestRecord {
    pub number: u32,
    pub date: NaiveDate,
    /// Always ascending, distinct, within [`NUMBER_RANGE`].
    pub numbers: [u8; NUMBERS_PER_DRAW],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("contest number must be positive")]
    ZeroContest,
    #[error("expected 15 numbers, got {0}")]
    WrongCount(usize),
    #[error("number {0} is outside 1..=25")]
    OutOfRange(i64),
    #[error("number {0} was drawn twice")]
    Duplicate(u8),
}

impl ContestRecord {
    /// Validates the draw and stores its numbers sorted.
    pub fn new(number: u32, date: NaiveDate, numbers: &[i64]) -> Result<Self, DrawError> {
        if number == 0 {
            return Err(DrawError::ZeroContest);
        }
        if numbers.len() != NUMBERS_PER_DRAW {
            return Err(DrawError::WrongCount(numbers.len()));
        }

        let mut sorted = [0u8; NUMBERS_PER_DRAW];
        for (slot, &value) in sorted.iter_mut().zip(numbers) {
            if !NUMBER_RANGE.contains(&value) {
                return Err(DrawError::OutOfRange(value));
            }
            *slot = value as u8;
        }
        sorted.sort_unstable();

        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(DrawError::Duplicate(pair[0]));
        }

        Ok(Self {
            number,
            date,
            numbers: sorted,
        })
    }

    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// How a run reconciles fetched contests with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Refetch the whole history and rewrite the file.
    #[default]
    FullRefresh,
    /// Fetch contests newer than the last stored one and append them.
    Incremental,
}

/// Delay growth between fetch attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Backoff {
    #[default]
    Fixed,
    Linear,
}

/// Snapshot of the CSV store taken at run start, advanced after every write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub exists: bool,
    pub content: String,
    pub rows: usize,
    /// Highest stored contest number, 0 for an empty store.
    pub last_number: u32,
}

impl StoreState {
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    MissingNumber,
    MissingDate,
    MissingNumbers,
    InvalidDraw(DrawError),
    Duplicate,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "entry is not a JSON object"),
            SkipReason::MissingNumber => write!(f, "no contest number"),
            SkipReason::MissingDate => write!(f, "no parseable draw date"),
            SkipReason::MissingNumbers => write!(f, "no drawn numbers"),
            SkipReason::InvalidDraw(e) => write!(f, "{}", e),
            SkipReason::Duplicate => write!(f, "contest already seen in this payload"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub number: Option<u32>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    /// Deduplicated, ascending by contest number.
    pub records: Vec<ContestRecord>,
    pub skipped: Vec<SkippedRecord>,
    pub unusable_payloads: usize,
}

/// What a single `extract` call returned.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub payloads: Vec<serde_json::Value>,
    /// Set when the source became unavailable before the batch finished.
    pub interrupted: Option<String>,
}

/// A unit of fetching work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    FullHistory,
    Contests(RangeInclusive<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Fetch(Vec<Batch>),
    UpToDate { latest: u32 },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Written { rows: usize },
    Unchanged,
    DryRun { rows: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Written,
    Unchanged,
    SourceUnavailable,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub output_path: String,
    pub records_written: usize,
    pub records_skipped: usize,
    /// Payloads that were neither a contest list nor a contest object.
    pub unusable_payloads: usize,
    pub last_number: u32,
    pub interrupted: Option<String>,
}
