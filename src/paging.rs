//! Cursor resolution: turns raw `before` / `after` / `limit` parameters into a
//! single scan mode over the ordering key.
//!
//! `before` and `after` are meant to be used one at a time. When a caller sets
//! both, the `before` scan wins.

use crate::error::ValidationError;
use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 100;

/// Sentinel meaning "before not set".
pub const UNSET_BEFORE: i64 = 0;
/// Sentinel meaning "after not set".
pub const UNSET_AFTER: i64 = -1;

/// Query-string parameters as they arrive off the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPageQuery {
    pub before: Option<String>,
    pub after: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Keys strictly below the cursor, newest first.
    Before(i64),
    /// Keys strictly above the cursor, oldest first.
    After(i64),
    /// The most recent rows, newest first.
    Latest,
}

impl ScanMode {
    pub fn direction(self) -> Direction {
        match self {
            ScanMode::After(_) => Direction::Ascending,
            ScanMode::Before(_) | ScanMode::Latest => Direction::Descending,
        }
    }

    /// Whether `key` falls inside this mode's bound.
    pub fn admits(self, key: i64) -> bool {
        match self {
            ScanMode::Before(before) => key < before,
            ScanMode::After(after) => key > after,
            ScanMode::Latest => true,
        }
    }
}

/// A resolved scan: mode plus a validated limit in `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub mode: ScanMode,
    pub limit: i64,
}

impl Cursor {
    pub fn resolve(before: i64, after: i64, limit: i64) -> Result<Self, ValidationError> {
        if limit > MAX_LIMIT {
            return Err(ValidationError::OverMaxLimit {
                limit,
                max: MAX_LIMIT,
            });
        }
        if limit <= 0 {
            return Err(ValidationError::InvalidLimit(limit));
        }

        let mode = if before > 0 {
            ScanMode::Before(before)
        } else if after >= 0 {
            ScanMode::After(after)
        } else {
            ScanMode::Latest
        };

        Ok(Cursor { mode, limit })
    }

    /// Decodes the raw query string, rejecting non-integer values instead of
    /// falling back to the defaults.
    pub fn from_query(raw: &RawPageQuery) -> Result<Self, ValidationError> {
        let before = parse_param("before", raw.before.as_deref(), UNSET_BEFORE)?;
        let after = parse_param("after", raw.after.as_deref(), UNSET_AFTER)?;
        let limit = parse_param("limit", raw.limit.as_deref(), DEFAULT_LIMIT)?;
        Self::resolve(before, after, limit)
    }

    pub fn latest(limit: i64) -> Result<Self, ValidationError> {
        Self::resolve(UNSET_BEFORE, UNSET_AFTER, limit)
    }

    pub fn direction(&self) -> Direction {
        self.mode.direction()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor {
            mode: ScanMode::Latest,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_param(name: &'static str, value: Option<&str>, default: i64) -> Result<i64, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse::<i64>().map_err(|_| ValidationError::MalformedParam {
            name,
            value: v.to_string(),
        }),
    }
}
