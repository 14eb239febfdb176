//! ledgerscan - cursor-paginated read API over an append-only ledger history
//!
//! # Architecture
//!
//! A request flows through four stages, leaves first:
//!
//! ## Query Pipeline
//! - [`paging`] - Cursor resolution (`before` / `after` / `limit`)
//! - [`filter`] - Message-type and time-range predicates, query specs
//! - [`store`] - Query engine over SQLite or in-memory tables
//! - [`assembler`] - Response records and paging metadata
//!
//! ## Service
//! - [`explorer`] - Read operations wiring the pipeline to a store
//! - [`api`] - REST endpoints (axum)
//!
//! ## Configuration & Utilities
//! - [`schema`] - Stored row types and table layout
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Query Pipeline
// ============================================================================
pub mod assembler;
pub mod filter;
pub mod paging;
pub mod store;

// ============================================================================
// Service
// ============================================================================
pub mod explorer;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod schema;
