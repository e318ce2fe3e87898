// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! The core only needs a handful of tenant-scoped upserts, expressed by the
//! [`Datastore`] trait. Firestore backs production; the in-memory store backs
//! tests and local development.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;

use crate::models::{Connection, SaleRecord, SyncState};

/// Collection names as constants.
pub mod collections {
    pub const CONNECTIONS: &str = "marketplace_connections";
    pub const SALES: &str = "sales";
    pub const SYNC_STATE: &str = "sync_state";
}

/// Error raised by a datastore backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DbError(pub String);

/// Tenant-scoped record store consumed by the connection and sync core.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn get_connection(&self, tenant_id: &str) -> Result<Option<Connection>, DbError>;

    /// Insert or replace the connection keyed by its tenant id.
    async fn upsert_connection(&self, connection: &Connection) -> Result<(), DbError>;

    /// Insert or update every row keyed by [`SaleRecord::natural_key`].
    /// Either all rows are written or none are.
    async fn upsert_sales(&self, rows: &[SaleRecord]) -> Result<(), DbError>;

    /// All sales for a tenant, newest first. No route serves this; it is the
    /// read side for back-office tooling and for checking what a sync stored.
    async fn list_sales(&self, tenant_id: &str) -> Result<Vec<SaleRecord>, DbError>;

    async fn get_sync_state(
        &self,
        tenant_id: &str,
        provider: &str,
        resource: &str,
    ) -> Result<Option<SyncState>, DbError>;

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<(), DbError>;
}
