// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the [`Datastore`] operations over three collections:
//! - Connections (one document per tenant)
//! - Sales (one document per natural key)
//! - Sync state (one document per tenant/provider/resource)

use async_trait::async_trait;

use super::{Datastore, DbError};
use crate::db::collections;
use crate::models::{Connection, SaleRecord, SyncState};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, DbError> {
        // Emulator: use an unauthenticated connection to avoid local credential lookups.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| DbError(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, DbError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| DbError(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns an error.
    ///
    /// Not used by the server; lets tests exercise the error paths without
    /// an emulator.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, DbError> {
        self.client
            .as_ref()
            .ok_or_else(|| DbError("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl Datastore for FirestoreDb {
    // ─── Connection Operations ───────────────────────────────────

    async fn get_connection(&self, tenant_id: &str) -> Result<Option<Connection>, DbError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CONNECTIONS)
            .obj()
            .one(tenant_id)
            .await
            .map_err(|e| DbError(e.to_string()))
    }

    async fn upsert_connection(&self, connection: &Connection) -> Result<(), DbError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONNECTIONS)
            .document_id(&connection.tenant_id)
            .object(connection)
            .execute()
            .await
            .map_err(|e| DbError(e.to_string()))?;
        Ok(())
    }

    // ─── Sales Operations ────────────────────────────────────────

    /// Writes the whole batch in one transaction. Order syncs fetch a single
    /// bounded page, so a batch never approaches [`BATCH_SIZE`].
    async fn upsert_sales(&self, rows: &[SaleRecord]) -> Result<(), DbError> {
        if rows.len() > BATCH_SIZE {
            return Err(DbError(format!(
                "Sales batch of {} exceeds transaction limit {}",
                rows.len(),
                BATCH_SIZE
            )));
        }

        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| DbError(format!("Failed to begin transaction: {}", e)))?;

        for row in rows {
            client
                .fluent()
                .update()
                .in_col(collections::SALES)
                .document_id(row.natural_key())
                .object(row)
                .add_to_transaction(&mut transaction)
                .map_err(|e| DbError(format!("Failed to add sale to transaction: {}", e)))?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| DbError(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(rows = rows.len(), "Sales batch committed");
        Ok(())
    }

    async fn list_sales(&self, tenant_id: &str) -> Result<Vec<SaleRecord>, DbError> {
        let tenant_id = tenant_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SALES)
            .filter(move |q| q.for_all([q.field("tenant_id").eq(tenant_id.clone())]))
            .order_by([("sale_date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| DbError(e.to_string()))
    }

    // ─── Sync State Operations ───────────────────────────────────

    async fn get_sync_state(
        &self,
        tenant_id: &str,
        provider: &str,
        resource: &str,
    ) -> Result<Option<SyncState>, DbError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SYNC_STATE)
            .obj()
            .one(&SyncState::key(tenant_id, provider, resource))
            .await
            .map_err(|e| DbError(e.to_string()))
    }

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<(), DbError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SYNC_STATE)
            .document_id(state.doc_id())
            .object(state)
            .execute()
            .await
            .map_err(|e| DbError(e.to_string()))?;
        Ok(())
    }
}
