//! Read operations exposed by the explorer. Each call resolves its cursor and
//! filters, runs one windowed query and at most one count query against the
//! injected store, then assembles the response page.

use crate::assembler::{self, BlockRecord, Page, TxRecord};
use crate::error::Result;
use crate::filter::{QuerySpec, TxTypeRequest};
use crate::paging::Cursor;
use crate::store::LedgerStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub latest_height: Option<i64>,
    pub total_txs: i64,
    pub total_blocks: i64,
}

#[derive(Clone)]
pub struct Explorer {
    store: Arc<dyn LedgerStore>,
    genesis_time: i64,
}

impl Explorer {
    pub fn new(store: Arc<dyn LedgerStore>, genesis_time: i64) -> Self {
        Self {
            store,
            genesis_time,
        }
    }

    pub fn blocks(&self, cursor: Cursor) -> Result<Page<BlockRecord>> {
        let rows = self.store.query_blocks(&QuerySpec::new(cursor))?;
        let total = self.store.count_blocks()?;
        debug!(mode = ?cursor.mode, returned = rows.len(), total, "explorer.blocks");
        Ok(assembler::assemble_blocks(&rows, cursor.mode, total))
    }

    pub fn txs(&self, cursor: Cursor) -> Result<Page<TxRecord>> {
        self.run_tx_query(&QuerySpec::new(cursor))
    }

    /// Type-filtered transactions. With no cursor set this scans from the
    /// newest matching row, the same as [`Explorer::txs`].
    pub fn txs_by_type(&self, cursor: Cursor, req: &TxTypeRequest, now: i64) -> Result<Page<TxRecord>> {
        let spec = QuerySpec::for_tx_type(cursor, req, self.genesis_time, now)?;
        self.run_tx_query(&spec)
    }

    fn run_tx_query(&self, spec: &QuerySpec) -> Result<Page<TxRecord>> {
        let rows = self.store.query_txs(spec)?;
        // total is the whole table, not the filtered match count
        let total = self.store.count_txs()?;
        debug!(mode = ?spec.cursor.mode, returned = rows.len(), total, "explorer.txs");
        assembler::assemble_txs(&rows, spec.cursor.mode, total)
    }

    pub fn block(&self, height: i64) -> Result<Option<BlockRecord>> {
        Ok(self.store.block_by_height(height)?.as_ref().map(BlockRecord::from))
    }

    pub fn txs_at_height(&self, height: i64) -> Result<Vec<TxRecord>> {
        let rows = self.store.txs_at_height(height)?;
        assembler::tx_records(&rows)
    }

    pub fn status(&self) -> Result<ChainStatus> {
        Ok(ChainStatus {
            latest_height: self.store.latest_block_height()?,
            total_txs: self.store.count_txs()?,
            total_blocks: self.store.count_blocks()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENESIS_TIME;
    use crate::error::{ExplorerError, ValidationError};
    use crate::schema::{BlockRow, TxRow};
    use crate::store::MemoryStore;

    const NOW: i64 = 1_700_000_000;

    fn explorer(n: i64) -> Explorer {
        let blocks = (1..=n)
            .map(|h| BlockRow {
                id: h,
                height: h,
                proposer: String::new(),
                block_hash: format!("B{}", h),
                parent_hash: format!("B{}", h - 1),
                num_txs: 1,
                total_txs: h,
                timestamp: DEFAULT_GENESIS_TIME + h,
            })
            .collect();
        let txs = (1..=n)
            .map(|id| TxRow {
                id,
                height: id,
                code: 0,
                tx_hash: format!("T{}", id),
                messages: if id % 2 == 0 {
                    r#"[{"type":"dex/NewOrder"}]"#.to_string()
                } else {
                    r#"[{"type":"cosmos-sdk/Send"}]"#.to_string()
                },
                signatures: "[]".to_string(),
                memo: String::new(),
                timestamp: DEFAULT_GENESIS_TIME + id,
            })
            .collect();
        Explorer::new(Arc::new(MemoryStore::new(blocks, txs)), DEFAULT_GENESIS_TIME)
    }

    fn ids(page: &Page<TxRecord>) -> Vec<i64> {
        page.data.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_default_page_of_150() {
        let page = explorer(150).txs(Cursor::default()).unwrap();
        assert_eq!(ids(&page), (51..=150).rev().collect::<Vec<_>>());
        assert_eq!(page.paging.before, Some(51));
        assert_eq!(page.paging.after, Some(150));
        assert_eq!(page.paging.total, 150);
    }

    #[test]
    fn test_walk_back_without_gap_or_overlap() {
        let ex = explorer(250);
        let mut seen = Vec::new();
        let mut cursor = Cursor::latest(40).unwrap();
        loop {
            let page = ex.txs(cursor).unwrap();
            if page.data.is_empty() {
                break;
            }
            seen.extend(ids(&page));
            let before = page.paging.before.unwrap();
            cursor = Cursor::resolve(before, -1, 40).unwrap();
        }
        assert_eq!(seen, (1..=250).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_walk_forward_with_after() {
        let ex = explorer(25);
        let first = ex.txs(Cursor::resolve(0, 0, 10).unwrap()).unwrap();
        assert_eq!(ids(&first), (1..=10).collect::<Vec<_>>());
        let next = ex
            .txs(Cursor::resolve(0, first.paging.after.unwrap(), 10).unwrap())
            .unwrap();
        assert_eq!(ids(&next), (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_type_filter_default_scan_returns_most_recent() {
        // A `before = 0` bound here would select `id < 0` and return nothing;
        // the unset cursor scans from the newest matching row instead.
        let req = TxTypeRequest {
            tx_type: "dex/NewOrder".to_string(),
            start_time: None,
            end_time: None,
        };
        let page = explorer(20).txs_by_type(Cursor::latest(3).unwrap(), &req, NOW).unwrap();
        assert_eq!(ids(&page), vec![20, 18, 16]);
        assert_eq!(page.paging.total, 20);
    }

    #[test]
    fn test_type_filter_rejects_unknown_type() {
        let req = TxTypeRequest {
            tx_type: "made/Up".to_string(),
            ..Default::default()
        };
        let err = explorer(5).txs_by_type(Cursor::default(), &req, NOW).unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::Validation(ValidationError::InvalidMessageType(_))
        ));
    }

    #[test]
    fn test_type_filter_time_window() {
        let req = TxTypeRequest {
            tx_type: "cosmos-sdk/Send".to_string(),
            start_time: Some(DEFAULT_GENESIS_TIME + 3),
            end_time: Some(DEFAULT_GENESIS_TIME + 9),
        };
        let page = explorer(20).txs_by_type(Cursor::default(), &req, NOW).unwrap();
        assert_eq!(ids(&page), vec![9, 7, 5, 3]);
    }

    #[test]
    fn test_blocks_and_status() {
        let ex = explorer(12);
        let page = ex.blocks(Cursor::resolve(5, -1, 2).unwrap()).unwrap();
        let heights: Vec<i64> = page.data.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![4, 3]);
        assert_eq!(page.paging.total, 12);

        assert_eq!(
            ex.status().unwrap(),
            ChainStatus {
                latest_height: Some(12),
                total_txs: 12,
                total_blocks: 12
            }
        );
        assert_eq!(ex.block(3).unwrap().map(|b| b.block_hash), Some("B3".to_string()));
        assert!(ex.block(13).unwrap().is_none());
        assert_eq!(ex.txs_at_height(7).unwrap()[0].id, 7);
    }
}
