//! Result assembly: maps stored rows into response records and derives paging
//! metadata from the window that was actually returned.
//!
//! The cursors are taken from opposite edges depending on the scan mode. An
//! `after` scan returns rows oldest first, so `before` is the first row and
//! `after` the last. `before` and latest scans return newest first, so the
//! assignment flips. Either way `paging.before` is the cursor to ask for older
//! rows and `paging.after` the cursor to ask for newer ones.

use crate::error::{ExplorerError, Result};
use crate::paging::ScanMode;
use crate::schema::{BlockRow, Keyed, TxRow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

impl Paging {
    /// Paging for `window`. An empty window carries only the total.
    pub fn from_window<T: Keyed>(window: &[T], mode: ScanMode, total: i64) -> Self {
        let (first, last) = match (window.first(), window.last()) {
            (Some(first), Some(last)) => (first.ordering_key(), last.ordering_key()),
            _ => {
                return Paging {
                    total,
                    before: None,
                    after: None,
                }
            }
        };

        match mode {
            ScanMode::After(_) => Paging {
                total,
                before: Some(first),
                after: Some(last),
            },
            ScanMode::Before(_) | ScanMode::Latest => Paging {
                total,
                before: Some(last),
                after: Some(first),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub paging: Paging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub pubkey: String,
    pub address: String,
    pub sequence: i64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub id: i64,
    pub height: i64,
    pub result: bool,
    pub tx_hash: String,
    pub messages: Vec<Message>,
    pub signatures: Vec<Signature>,
    pub memo: String,
    pub code: i64,
    pub timestamp: i64,
}

impl TryFrom<&TxRow> for TxRecord {
    type Error = ExplorerError;

    fn try_from(row: &TxRow) -> Result<Self> {
        let messages: Vec<Message> = decode_list(row.id, "messages", &row.messages)?;
        let signatures: Vec<Signature> = decode_list(row.id, "signatures", &row.signatures)?;

        Ok(TxRecord {
            id: row.id,
            height: row.height,
            result: row.code == 0,
            tx_hash: row.tx_hash.clone(),
            messages,
            signatures,
            memo: row.memo.clone(),
            code: row.code,
            timestamp: row.timestamp,
        })
    }
}

/// Decodes a stored JSON list. `null` reads as an empty list; text that is
/// not JSON, or not a list of `T`, is a decode error.
fn decode_list<T: DeserializeOwned>(id: i64, field: &'static str, raw: &str) -> Result<Vec<T>> {
    let list: Option<Vec<T>> = serde_json::from_str(raw).map_err(|e| ExplorerError::Decode {
        id,
        field,
        reason: e.to_string(),
    })?;
    Ok(list.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub id: i64,
    pub height: i64,
    pub proposer: String,
    pub block_hash: String,
    pub parent_hash: String,
    pub num_txs: i64,
    pub total_txs: i64,
    pub timestamp: i64,
}

impl From<&BlockRow> for BlockRecord {
    fn from(row: &BlockRow) -> Self {
        BlockRecord {
            id: row.id,
            height: row.height,
            proposer: row.proposer.clone(),
            block_hash: row.block_hash.clone(),
            parent_hash: row.parent_hash.clone(),
            num_txs: row.num_txs,
            total_txs: row.total_txs,
            timestamp: row.timestamp,
        }
    }
}

/// Decodes every row, failing the whole page on the first malformed payload.
pub fn tx_records(rows: &[TxRow]) -> Result<Vec<TxRecord>> {
    rows.iter().map(TxRecord::try_from).collect()
}

pub fn assemble_txs(rows: &[TxRow], mode: ScanMode, total: i64) -> Result<Page<TxRecord>> {
    let data = tx_records(rows)?;
    Ok(Page {
        data,
        paging: Paging::from_window(rows, mode, total),
    })
}

pub fn assemble_blocks(rows: &[BlockRow], mode: ScanMode, total: i64) -> Page<BlockRecord> {
    Page {
        data: rows.iter().map(BlockRecord::from).collect(),
        paging: Paging::from_window(rows, mode, total),
    }
}
