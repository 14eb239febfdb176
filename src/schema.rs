//! Stored row types and the SQLite table layout they are read from.

/// Table layout expected by [`crate::store::SqliteStore`]. Rows are written by
/// an external ingester; ledgerscan only ever reads them.
pub const INIT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blocks (
    id INTEGER PRIMARY KEY,
    height INTEGER NOT NULL UNIQUE,
    proposer TEXT NOT NULL DEFAULT '',
    block_hash TEXT NOT NULL DEFAULT '',
    parent_hash TEXT NOT NULL DEFAULT '',
    num_txs INTEGER NOT NULL DEFAULT 0,
    total_txs INTEGER NOT NULL DEFAULT 0,
    timestamp INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    height INTEGER NOT NULL,
    code INTEGER NOT NULL DEFAULT 0,
    tx_hash TEXT NOT NULL,
    messages TEXT NOT NULL DEFAULT '[]',
    signatures TEXT NOT NULL DEFAULT '[]',
    memo TEXT NOT NULL DEFAULT '',
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_height ON transactions(height);
CREATE INDEX IF NOT EXISTS idx_transactions_timestamp ON transactions(timestamp);
"#;

/// A row of the `blocks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRow {
    pub id: i64,
    pub height: i64,
    pub proposer: String,
    pub block_hash: String,
    pub parent_hash: String,
    pub num_txs: i64,
    pub total_txs: i64,
    pub timestamp: i64,
}

/// A row of the `transactions` table. `messages` and `signatures` hold the
/// JSON payloads exactly as the ingester stored them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRow {
    pub id: i64,
    pub height: i64,
    pub code: i64,
    pub tx_hash: String,
    pub messages: String,
    pub signatures: String,
    pub memo: String,
    pub timestamp: i64,
}

impl TxRow {
    /// Declared type of the first message, if the payload has one.
    pub fn first_message_type(&self) -> Option<String> {
        let msgs: serde_json::Value = serde_json::from_str(&self.messages).ok()?;
        msgs.get(0)?.get("type")?.as_str().map(str::to_string)
    }
}

/// Rows that can be paged through by a monotonically increasing key.
pub trait Keyed {
    fn ordering_key(&self) -> i64;
}

impl Keyed for BlockRow {
    fn ordering_key(&self) -> i64 {
        self.height
    }
}

impl Keyed for TxRow {
    fn ordering_key(&self) -> i64 {
        self.id
    }
}
