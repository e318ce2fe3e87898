// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local datastore for tests and local development.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;

use super::{Datastore, DbError};
use crate::models::{Connection, SaleRecord, SyncState};

/// In-memory implementation of [`Datastore`].
#[derive(Default)]
pub struct MemoryDb {
    connections: DashMap<String, Connection>,
    /// Sales batches are applied under one lock so a batch lands whole.
    sales: Mutex<std::collections::HashMap<String, SaleRecord>>,
    sync_state: DashMap<String, SyncState>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sales for a tenant.
    pub fn sales_count(&self, tenant_id: &str) -> usize {
        self.sales
            .lock()
            .map(|sales| sales.values().filter(|s| s.tenant_id == tenant_id).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Datastore for MemoryDb {
    async fn get_connection(&self, tenant_id: &str) -> Result<Option<Connection>, DbError> {
        Ok(self.connections.get(tenant_id).map(|c| c.clone()))
    }

    async fn upsert_connection(&self, connection: &Connection) -> Result<(), DbError> {
        self.connections
            .insert(connection.tenant_id.clone(), connection.clone());
        Ok(())
    }

    async fn upsert_sales(&self, rows: &[SaleRecord]) -> Result<(), DbError> {
        let mut sales = self
            .sales
            .lock()
            .map_err(|_| DbError("sales store poisoned".to_string()))?;
        for row in rows {
            sales.insert(row.natural_key(), row.clone());
        }
        Ok(())
    }

    async fn list_sales(&self, tenant_id: &str) -> Result<Vec<SaleRecord>, DbError> {
        let sales = self
            .sales
            .lock()
            .map_err(|_| DbError("sales store poisoned".to_string()))?;
        let mut rows: Vec<SaleRecord> = sales
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        Ok(rows)
    }

    async fn get_sync_state(
        &self,
        tenant_id: &str,
        provider: &str,
        resource: &str,
    ) -> Result<Option<SyncState>, DbError> {
        Ok(self
            .sync_state
            .get(&SyncState::key(tenant_id, provider, resource))
            .map(|s| s.clone()))
    }

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<(), DbError> {
        self.sync_state.insert(state.doc_id(), state.clone());
        Ok(())
    }
}
