// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Remote eBay orders, narrowed from untrusted JSON.
//!
//! The Fulfillment API payload is loosely structured. Each element of the
//! `orders` array is checked on its own; elements that fail are reported as
//! rejections so one bad order never sinks the batch.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::time_utils::parse_utc_rfc3339;

/// Why an order element was excluded from a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRejection {
    NotAnObject,
    OrderIdNotString,
    CreationDateInvalid,
    LineItemsMissing,
    LineItemsNotArray,
}

impl OrderRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderRejection::NotAnObject => "not_an_object",
            OrderRejection::OrderIdNotString => "order_id_not_string",
            OrderRejection::CreationDateInvalid => "creation_date_invalid",
            OrderRejection::LineItemsMissing => "line_items_missing",
            OrderRejection::LineItemsNotArray => "line_items_not_array",
        }
    }
}

/// Monetary fields from `pricingSummary`, missing values already zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PricingSummary {
    pub total: f64,
    pub delivery_cost: f64,
    pub total_tax: f64,
    pub total_marketplace_fee: f64,
    pub payment_discount: f64,
}

/// A validated remote order plus the raw object it came from.
#[derive(Debug, Clone)]
pub struct RemoteOrder {
    pub order_id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    /// Per-line quantities (0 where the line did not state one)
    pub line_quantities: Vec<u32>,
    pub pricing: PricingSummary,
    pub raw: Value,
}

impl RemoteOrder {
    /// Narrow one element of the `orders` array.
    pub fn narrow(value: &Value) -> Result<Self, OrderRejection> {
        let obj = value.as_object().ok_or(OrderRejection::NotAnObject)?;

        let order_id = match obj.get("orderId") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(_) => return Err(OrderRejection::OrderIdNotString),
        };

        let creation_date = match obj.get("creationDate") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(
                parse_utc_rfc3339(raw).ok_or(OrderRejection::CreationDateInvalid)?,
            ),
            Some(_) => return Err(OrderRejection::CreationDateInvalid),
        };

        let line_quantities = match obj.get("lineItems") {
            None | Some(Value::Null) => return Err(OrderRejection::LineItemsMissing),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.get("quantity").map(quantity).unwrap_or(0))
                .collect(),
            Some(_) => return Err(OrderRejection::LineItemsNotArray),
        };

        let summary = obj.get("pricingSummary");
        let amount = |field: &str| {
            summary
                .and_then(|s| s.get(field))
                .and_then(|m| m.get("value"))
                .map(money)
                .unwrap_or(0.0)
        };

        Ok(Self {
            order_id,
            creation_date,
            line_quantities,
            pricing: PricingSummary {
                total: amount("total"),
                delivery_cost: amount("deliveryCost"),
                total_tax: amount("totalTax"),
                total_marketplace_fee: amount("totalMarketplaceFee"),
                payment_discount: amount("paymentDiscount"),
            },
            raw: value.clone(),
        })
    }

    /// Units sold. An order always represents at least one unit.
    pub fn quantity(&self) -> u32 {
        match self
            .line_quantities
            .iter()
            .fold(0u32, |acc, q| acc.saturating_add(*q))
        {
            0 => 1,
            n => n,
        }
    }
}

/// Result of narrowing an orders response.
#[derive(Debug, Default)]
pub struct NarrowedOrders {
    /// Number of elements the marketplace returned
    pub returned: usize,
    pub orders: Vec<RemoteOrder>,
    /// `(index, reason)` for each excluded element
    pub rejected: Vec<(usize, OrderRejection)>,
}

/// Narrow an orders response body. A body without an `orders` array is
/// treated as an empty page.
pub fn narrow_orders(body: &Value) -> NarrowedOrders {
    let Some(elements) = body.get("orders").and_then(Value::as_array) else {
        return NarrowedOrders::default();
    };

    let mut narrowed = NarrowedOrders {
        returned: elements.len(),
        ..Default::default()
    };

    for (index, element) in elements.iter().enumerate() {
        match RemoteOrder::narrow(element) {
            Ok(order) => narrowed.orders.push(order),
            Err(reason) => narrowed.rejected.push((index, reason)),
        }
    }

    narrowed
}

/// eBay money values arrive as strings ("12.34") or numbers.
fn money(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn quantity(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_narrow_full_order() {
        let order = RemoteOrder::narrow(&json!({
            "orderId": "12-34567-89012",
            "creationDate": "2025-06-01T10:00:00.000Z",
            "lineItems": [{"quantity": 2}, {"quantity": 1}],
            "pricingSummary": {
                "total": {"value": "45.50", "currency": "USD"},
                "deliveryCost": {"value": "5.00"},
                "totalTax": {"value": 3.2},
                "totalMarketplaceFee": {"value": "6.10"},
                "paymentDiscount": {"value": "-0.50"}
            }
        }))
        .unwrap();

        assert_eq!(order.order_id.as_deref(), Some("12-34567-89012"));
        assert_eq!(order.quantity(), 3);
        assert_eq!(order.pricing.total, 45.5);
        assert_eq!(order.pricing.delivery_cost, 5.0);
        assert_eq!(order.pricing.total_tax, 3.2);
        assert_eq!(order.pricing.total_marketplace_fee, 6.1);
        assert_eq!(order.pricing.payment_discount, -0.5);
    }

    #[test]
    fn test_empty_line_items_is_one_unit() {
        let order = RemoteOrder::narrow(&json!({"orderId": "A", "lineItems": []})).unwrap();
        assert_eq!(order.quantity(), 1);
    }

    #[test]
    fn test_line_items_without_quantity_is_one_unit() {
        let order =
            RemoteOrder::narrow(&json!({"orderId": "A", "lineItems": [{"sku": "x"}]})).unwrap();
        assert_eq!(order.quantity(), 1);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let order = RemoteOrder::narrow(&json!({"lineItems": []})).unwrap();
        assert!(order.order_id.is_none());
        assert!(order.creation_date.is_none());
        assert_eq!(order.pricing, PricingSummary::default());
    }

    #[test]
    fn test_unparseable_money_is_zero() {
        let order = RemoteOrder::narrow(&json!({
            "lineItems": [],
            "pricingSummary": {"total": {"value": "n/a"}, "totalTax": {"value": true}}
        }))
        .unwrap();
        assert_eq!(order.pricing.total, 0.0);
        assert_eq!(order.pricing.total_tax, 0.0);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            (json!("order"), OrderRejection::NotAnObject),
            (
                json!({"orderId": 42, "lineItems": []}),
                OrderRejection::OrderIdNotString,
            ),
            (
                json!({"creationDate": "last tuesday", "lineItems": []}),
                OrderRejection::CreationDateInvalid,
            ),
            (json!({"orderId": "A"}), OrderRejection::LineItemsMissing),
            (
                json!({"orderId": "A", "lineItems": {"quantity": 1}}),
                OrderRejection::LineItemsNotArray,
            ),
        ];

        for (value, expected) in cases {
            assert_eq!(RemoteOrder::narrow(&value).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_narrow_orders_keeps_valid_elements() {
        let body = json!({
            "total": 3,
            "orders": [
                {"orderId": "A", "lineItems": []},
                {"orderId": "B"},
                {"orderId": "C", "lineItems": [{"quantity": 1}]}
            ]
        });

        let narrowed = narrow_orders(&body);
        assert_eq!(narrowed.returned, 3);
        assert_eq!(narrowed.orders.len(), 2);
        assert_eq!(narrowed.rejected, vec![(1, OrderRejection::LineItemsMissing)]);
    }

    #[test]
    fn test_narrow_orders_without_array() {
        let narrowed = narrow_orders(&json!({"total": 0}));
        assert_eq!(narrowed.returned, 0);
        assert!(narrowed.orders.is_empty());
    }
}
