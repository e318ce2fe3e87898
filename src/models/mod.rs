// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod connection;
pub mod order;
pub mod sale;
pub mod sync_state;

pub use connection::{Connection, ConnectionStatus};
pub use order::{narrow_orders, NarrowedOrders, OrderRejection, RemoteOrder};
pub use sale::SaleRecord;
pub use sync_state::SyncState;

/// Encode one component of a composite storage key.
///
/// Components are joined with `_`, so `_` is escaped along with everything
/// `urlencoding` escapes. No encoded component contains the separator.
pub(crate) fn key_part(value: &str) -> String {
    urlencoding::encode(value).replace('_', "%5F")
}
