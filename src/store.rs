//! Query engine over the append-only ledger tables.
//!
//! [`LedgerStore`] is the seam the API layer is written against. Two backends
//! implement it: [`SqliteStore`] for the real database and [`MemoryStore`] for
//! tests and ephemeral runs. Both return windows in the scan direction of the
//! query's cursor and treat "no rows" as an empty vector.

use crate::error::{ExplorerError, Result};
use crate::filter::{Predicate, QuerySpec};
use crate::paging::{Cursor, ScanMode};
use crate::schema::{BlockRow, Keyed, TxRow, INIT_SCHEMA};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::Mutex;
use tracing::debug;

/// Read-only access to block and transaction history.
pub trait LedgerStore: Send + Sync {
    /// Blocks inside the cursor bound and predicates, in scan order.
    fn query_blocks(&self, spec: &QuerySpec) -> Result<Vec<BlockRow>>;

    /// Transactions inside the cursor bound and predicates, in scan order.
    fn query_txs(&self, spec: &QuerySpec) -> Result<Vec<TxRow>>;

    /// Cardinality of the whole `transactions` table. Ignores any cursor or filter.
    fn count_txs(&self) -> Result<i64>;

    /// Cardinality of the whole `blocks` table.
    fn count_blocks(&self) -> Result<i64>;

    fn latest_block_height(&self) -> Result<Option<i64>>;

    fn block_by_height(&self, height: i64) -> Result<Option<BlockRow>>;

    /// All transactions included at `height`, oldest first.
    fn txs_at_height(&self, height: i64) -> Result<Vec<TxRow>>;

    /// Cumulative transaction count recorded on the block at `height`.
    fn total_txs_at(&self, height: i64) -> Result<Option<i64>> {
        Ok(self.block_by_height(height)?.map(|b| b.total_txs))
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

const BLOCK_COLUMNS: &str =
    "id, height, proposer, block_hash, parent_hash, num_txs, total_txs, timestamp";
const TX_COLUMNS: &str = "id, height, code, tx_hash, messages, signatures, memo, timestamp";

/// Type of the first message, or NULL when the payload is not valid JSON.
const FIRST_MSG_TYPE_SQL: &str =
    "CASE WHEN json_valid(messages) THEN json_extract(messages, '$[0].type') END";

struct Table {
    name: &'static str,
    columns: &'static str,
    key: &'static str,
    has_messages: bool,
}

const BLOCKS: Table = Table {
    name: "blocks",
    columns: BLOCK_COLUMNS,
    key: "height",
    has_messages: false,
};

const TRANSACTIONS: Table = Table {
    name: "transactions",
    columns: TX_COLUMNS,
    key: "id",
    has_messages: true,
};

/// Renders the windowed SELECT for `spec` against `table`.
fn window_query(table: &Table, spec: &QuerySpec) -> Result<(String, Vec<Value>)> {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    match spec.cursor.mode {
        ScanMode::Before(before) => {
            clauses.push(format!("{} < ?", table.key));
            args.push(Value::Integer(before));
        }
        ScanMode::After(after) => {
            clauses.push(format!("{} > ?", table.key));
            args.push(Value::Integer(after));
        }
        ScanMode::Latest => {}
    }

    for predicate in &spec.predicates {
        match predicate {
            Predicate::MsgType(ty) => {
                if !table.has_messages {
                    return Err(ExplorerError::Storage(format!(
                        "message type filter is not supported on {}",
                        table.name
                    )));
                }
                clauses.push(format!("{} = ?", FIRST_MSG_TYPE_SQL));
                args.push(Value::Text(ty.clone()));
            }
            Predicate::Time(range) => {
                clauses.push("timestamp BETWEEN ? AND ?".to_string());
                args.push(Value::Integer(range.start));
                args.push(Value::Integer(range.end));
            }
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} {} LIMIT ?",
        table.columns,
        table.name,
        where_sql,
        table.key,
        spec.cursor.direction().as_sql()
    );
    args.push(Value::Integer(spec.cursor.limit));

    Ok((sql, args))
}

fn block_from_row(row: &Row) -> rusqlite::Result<BlockRow> {
    Ok(BlockRow {
        id: row.get(0)?,
        height: row.get(1)?,
        proposer: row.get(2)?,
        block_hash: row.get(3)?,
        parent_hash: row.get(4)?,
        num_txs: row.get(5)?,
        total_txs: row.get(6)?,
        timestamp: row.get(7)?,
    })
}

fn tx_from_row(row: &Row) -> rusqlite::Result<TxRow> {
    Ok(TxRow {
        id: row.get(0)?,
        height: row.get(1)?,
        code: row.get(2)?,
        tx_hash: row.get(3)?,
        messages: row.get(4)?,
        signatures: row.get(5)?,
        memo: row.get(6)?,
        timestamp: row.get(7)?,
    })
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database at `path`, creating the tables if they are missing.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ExplorerError::Storage(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(INIT_SCHEMA)
            .map_err(|e| ExplorerError::Storage(format!("Failed to create tables: {}", e)))?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ExplorerError::Storage("Mutex poisoned".to_string()))?;
        Ok(f(&*conn)?)
    }

    fn query_window<T>(
        &self,
        table: &Table,
        spec: &QuerySpec,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let (sql, args) = window_query(table, spec)?;
        debug!(table = table.name, mode = ?spec.cursor.mode, limit = spec.cursor.limit, "store.window");
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), map)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    fn count(&self, table: &Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        self.with_conn(|conn| conn.query_row(&sql, [], |row| row.get(0)))
    }
}

impl LedgerStore for SqliteStore {
    fn query_blocks(&self, spec: &QuerySpec) -> Result<Vec<BlockRow>> {
        self.query_window(&BLOCKS, spec, block_from_row)
    }

    fn query_txs(&self, spec: &QuerySpec) -> Result<Vec<TxRow>> {
        self.query_window(&TRANSACTIONS, spec, tx_from_row)
    }

    fn count_txs(&self) -> Result<i64> {
        self.count(&TRANSACTIONS)
    }

    fn count_blocks(&self) -> Result<i64> {
        self.count(&BLOCKS)
    }

    fn latest_block_height(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT height FROM blocks ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn block_by_height(&self, height: i64) -> Result<Option<BlockRow>> {
        let sql = format!("SELECT {} FROM blocks WHERE height = ?1", BLOCK_COLUMNS);
        self.with_conn(|conn| conn.query_row(&sql, params![height], block_from_row).optional())
    }

    fn txs_at_height(&self, height: i64) -> Result<Vec<TxRow>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE height = ?1 ORDER BY id ASC",
            TX_COLUMNS
        );
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![height], tx_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Vector-backed store, useful for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: Vec<BlockRow>,
    txs: Vec<TxRow>,
}

impl MemoryStore {
    pub fn new(mut blocks: Vec<BlockRow>, mut txs: Vec<TxRow>) -> Self {
        blocks.sort_by_key(|b| b.ordering_key());
        txs.sort_by_key(|t| t.ordering_key());
        Self { blocks, txs }
    }
}

/// `rows` must be sorted ascending by ordering key.
fn memory_window<T: Keyed + Clone>(rows: &[T], cursor: &Cursor, keep: impl Fn(&T) -> bool) -> Vec<T> {
    let admitted = |r: &&T| cursor.mode.admits(r.ordering_key()) && keep(*r);
    let limit = cursor.limit.max(0) as usize;
    match cursor.mode {
        ScanMode::After(_) => rows.iter().filter(admitted).take(limit).cloned().collect(),
        ScanMode::Before(_) | ScanMode::Latest => {
            rows.iter().rev().filter(admitted).take(limit).cloned().collect()
        }
    }
}

impl LedgerStore for MemoryStore {
    fn query_blocks(&self, spec: &QuerySpec) -> Result<Vec<BlockRow>> {
        if spec.msg_type().is_some() {
            return Err(ExplorerError::Storage(
                "message type filter is not supported on blocks".to_string(),
            ));
        }
        let range = spec.time_range();
        Ok(memory_window(&self.blocks, &spec.cursor, |b| {
            range.map_or(true, |r| r.contains(b.timestamp))
        }))
    }

    fn query_txs(&self, spec: &QuerySpec) -> Result<Vec<TxRow>> {
        let msg_type = spec.msg_type();
        let range = spec.time_range();
        Ok(memory_window(&self.txs, &spec.cursor, |t| {
            range.map_or(true, |r| r.contains(t.timestamp))
                && msg_type.map_or(true, |ty| t.first_message_type().as_deref() == Some(ty))
        }))
    }

    fn count_txs(&self) -> Result<i64> {
        Ok(self.txs.len() as i64)
    }

    fn count_blocks(&self) -> Result<i64> {
        Ok(self.blocks.len() as i64)
    }

    fn latest_block_height(&self) -> Result<Option<i64>> {
        Ok(self.blocks.last().map(|b| b.height))
    }

    fn block_by_height(&self, height: i64) -> Result<Option<BlockRow>> {
        Ok(self.blocks.iter().find(|b| b.height == height).cloned())
    }

    fn txs_at_height(&self, height: i64) -> Result<Vec<TxRow>> {
        Ok(self.txs.iter().filter(|t| t.height == height).cloned().collect())
    }
}
