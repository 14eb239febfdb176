//! Filter building: combines a resolved [`Cursor`] with the optional message
//! type and time-range predicates into one [`QuerySpec`].

use crate::error::ValidationError;
use crate::paging::Cursor;
use serde::Deserialize;

/// Message types the explorer knows how to filter on.
pub const KNOWN_MSG_TYPES: &[&str] = &[
    "cosmos-sdk/Send",
    "dex/NewOrder",
    "dex/CancelOrder",
    "dex/ListMsg",
    "tokens/IssueMsg",
    "tokens/BurnMsg",
    "tokens/FreezeMsg",
    "tokens/UnfreezeMsg",
    "tokens/MintMsg",
    "tokens/TimeLockMsg",
    "tokens/TimeUnlockMsg",
    "tokens/TimeRelockMsg",
    "cosmos-sdk/MsgSubmitProposal",
    "cosmos-sdk/MsgDeposit",
    "cosmos-sdk/MsgVote",
    "cosmos-sdk/MsgCreateValidator",
    "cosmos-sdk/MsgRemoveValidator",
];

pub fn is_known_msg_type(ty: &str) -> bool {
    KNOWN_MSG_TYPES.contains(&ty)
}

/// Body of the type-filtered transaction query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxTypeRequest {
    #[serde(default)]
    pub tx_type: String,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

/// Inclusive `[start, end]` range in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match on the first message's declared `type`.
    MsgType(String),
    Time(TimeRange),
}

/// Everything the query engine needs for one windowed read. Predicates are
/// ANDed with the cursor bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub cursor: Cursor,
    pub predicates: Vec<Predicate>,
}

impl QuerySpec {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            predicates: Vec::new(),
        }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Builds the spec for a type-filtered transaction query. `genesis_time`
    /// and `now` stand in for unset (or zero) `startTime` / `endTime`.
    pub fn for_tx_type(
        cursor: Cursor,
        req: &TxTypeRequest,
        genesis_time: i64,
        now: i64,
    ) -> Result<Self, ValidationError> {
        if !is_known_msg_type(&req.tx_type) {
            return Err(ValidationError::InvalidMessageType(req.tx_type.clone()));
        }

        let start = match req.start_time {
            None | Some(0) => genesis_time,
            Some(t) => t,
        };
        let end = match req.end_time {
            None | Some(0) => now,
            Some(t) => t,
        };
        if start > end {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }

        Ok(QuerySpec::new(cursor)
            .with(Predicate::MsgType(req.tx_type.clone()))
            .with(Predicate::Time(TimeRange { start, end })))
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::MsgType(ty) => Some(ty.as_str()),
            _ => None,
        })
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Time(range) => Some(*range),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENESIS_TIME;
    use crate::paging::ScanMode;

    const NOW: i64 = 1_700_000_000;

    fn request(ty: &str, start: Option<i64>, end: Option<i64>) -> TxTypeRequest {
        TxTypeRequest {
            tx_type: ty.to_string(),
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = QuerySpec::for_tx_type(
            Cursor::default(),
            &request("dex/Unknown", None, None),
            DEFAULT_GENESIS_TIME,
            NOW,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidMessageType("dex/Unknown".to_string()));
    }

    #[test]
    fn test_empty_type_is_rejected() {
        let err = QuerySpec::for_tx_type(Cursor::default(), &TxTypeRequest::default(), 0, NOW)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidMessageType(_)));
    }

    #[test]
    fn test_time_defaults() {
        let spec = QuerySpec::for_tx_type(
            Cursor::default(),
            &request("dex/NewOrder", Some(0), None),
            DEFAULT_GENESIS_TIME,
            NOW,
        )
        .unwrap();
        assert_eq!(spec.msg_type(), Some("dex/NewOrder"));
        assert_eq!(
            spec.time_range(),
            Some(TimeRange {
                start: DEFAULT_GENESIS_TIME,
                end: NOW
            })
        );
    }

    #[test]
    fn test_explicit_time_range_and_cursor_kept() {
        let cursor = Cursor::resolve(0, 10, 5).unwrap();
        let spec = QuerySpec::for_tx_type(
            cursor,
            &request("cosmos-sdk/Send", Some(100), Some(200)),
            DEFAULT_GENESIS_TIME,
            NOW,
        )
        .unwrap();
        assert_eq!(spec.cursor.mode, ScanMode::After(10));
        assert_eq!(spec.time_range(), Some(TimeRange { start: 100, end: 200 }));
        assert_eq!(spec.predicates.len(), 2);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = QuerySpec::for_tx_type(
            Cursor::default(),
            &request("dex/NewOrder", Some(300), Some(200)),
            DEFAULT_GENESIS_TIME,
            NOW,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidTimeRange { start: 300, end: 200 });
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let range = TimeRange { start: 10, end: 20 };
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(9));
        assert!(!range.contains(21));
    }

    #[test]
    fn test_request_body_is_camel_case() {
        let req: TxTypeRequest =
            serde_json::from_str(r#"{"txType":"dex/NewOrder","startTime":5}"#).unwrap();
        assert_eq!(req.tx_type, "dex/NewOrder");
        assert_eq!(req.start_time, Some(5));
        assert_eq!(req.end_time, None);
    }
}
