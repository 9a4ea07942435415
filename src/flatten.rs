//! Flattening engine: projects nested order records into flat rows.
//!
//! One row is produced per (order, line item) pair by evaluating every
//! mapping rule in table order. The engine is a pure function of its inputs:
//! no hidden state, identical input always yields identical rows in the same
//! order. A missing field at any traversal depth is not an error and renders
//! as an empty string; the only failure mode is a malformed creation
//! timestamp, which is surfaced rather than silently mis-sliced.

use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use crate::mapping::{FieldRule, MappingTable, SpecialRule};

/// Orders arrive as semi-structured JSON straight from the source adapter.
pub type Order = Value;

/// One output row: a rendered string per table column, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub values: Vec<String>,
}

#[derive(Debug)]
pub enum FlattenError {
    /// `created_at` did not parse as an RFC 3339 timestamp.
    MalformedTimestamp { order_id: String, raw: String },
}

impl std::fmt::Display for FlattenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlattenError::MalformedTimestamp { order_id, raw } => write!(
                f,
                "malformed created_at timestamp {raw:?} on order {order_id}"
            ),
        }
    }
}

impl std::error::Error for FlattenError {}

/// Flatten a batch of orders into one row per (order, line item) pair.
///
/// Rows preserve order-then-line-item iteration order; downstream consumers
/// rely on stable row grouping per order. An order without a `line_items`
/// array contributes zero rows.
pub fn flatten(table: &MappingTable, orders: &[Order]) -> Result<Vec<FlatRow>, FlattenError> {
    let mut rows = Vec::new();

    for order in orders {
        let line_items = match order.get("line_items").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => {
                debug!(order_id = %order_id(order), "Order has no line items, skipping");
                &[]
            }
        };

        for line_item in line_items {
            let mut values = Vec::with_capacity(table.len());
            for (_, rule) in table.iter() {
                values.push(evaluate(rule, order, line_item)?);
            }
            rows.push(FlatRow { values });
        }
    }

    Ok(rows)
}

const LINE_ITEM_PREFIX: &str = "line_items.";

fn evaluate(rule: &FieldRule, order: &Value, line_item: &Value) -> Result<String, FlattenError> {
    match rule {
        FieldRule::Empty => Ok(String::new()),
        FieldRule::Special(special) => evaluate_special(*special, order),
        FieldRule::MultiPath(paths) => Ok(paths
            .iter()
            .map(|path| resolve_scoped(path, order, line_item))
            .collect::<Vec<_>>()
            .join(" ")),
        FieldRule::LineItemPath(path) => Ok(resolve(line_item, path)),
        FieldRule::OrderPath(path) => Ok(resolve(order, path)),
    }
}

fn evaluate_special(rule: SpecialRule, order: &Value) -> Result<String, FlattenError> {
    match rule {
        SpecialRule::AcceptsMarketing => {
            // Absent counts as false; the output is never empty here.
            let accepts = order
                .get("buyer_accepts_marketing")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Ok(if accepts { "TRUE" } else { "FALSE" }.to_string())
        }
        SpecialRule::CreatedAt => reformat_created_at(order),
        SpecialRule::BillingCountry => Ok(country_code(order, "billing_address")),
        SpecialRule::ShippingCountry => Ok(country_code(order, "shipping_address")),
    }
}

/// `2025-03-27T11:51:11-04:00` becomes `27-03-2025 11:51`: day-month-year,
/// time truncated to the minute, offset dropped (wall-clock time kept).
fn reformat_created_at(order: &Value) -> Result<String, FlattenError> {
    let raw = order.get("created_at").and_then(Value::as_str).unwrap_or("");
    match DateTime::parse_from_rfc3339(raw) {
        Ok(created_at) => Ok(created_at.format("%d-%m-%Y %H:%M").to_string()),
        Err(_) => Err(FlattenError::MalformedTimestamp {
            order_id: order_id(order),
            raw: raw.to_string(),
        }),
    }
}

fn country_code(order: &Value, address_field: &str) -> String {
    order
        .get(address_field)
        .and_then(|address| address.get("country_code"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn resolve_scoped(path: &str, order: &Value, line_item: &Value) -> String {
    match path.strip_prefix(LINE_ITEM_PREFIX) {
        Some(rest) => resolve(line_item, rest),
        None => resolve(order, path),
    }
}

/// Resolve a dotted path against a semi-structured value, defaulting to an
/// empty string on any missing segment. Numeric segments index into arrays.
/// Shared by direct, line-item and multi-path resolution.
pub fn resolve(root: &Value, path: &str) -> String {
    let mut current = root;
    for segment in path.split('.') {
        let next = match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(segment),
        };
        match next {
            Some(value) => current = value,
            None => return String::new(),
        }
    }
    render(current)
}

/// Render a resolved terminal the way the export has always done it:
/// strings verbatim, `true` as "true", numbers in decimal form, and
/// falsy-but-present values (null, false, zero, empty string) as empty
/// string, indistinguishable from missing data. Non-scalar terminals are
/// emitted as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn order_id(order: &Value) -> String {
    order
        .get("id")
        .map(Value::to_string)
        .unwrap_or_else(|| "<unknown>".to_string())
}
