// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Courier dispatch service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, the in-process key-value cache,
//! and the cache-aside [`MessageStore`] for the message aggregate.

pub mod cache;
pub mod database;
pub mod migrations;
pub mod store;

pub use cache::MemoryCache;
pub use database::Database;
pub use store::{MessageStore, MessageUpdate};
