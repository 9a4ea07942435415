//! # mapping: the declarative column-to-field contract for order exports
//!
//! This module defines the fixed table of output columns and the extraction
//! rule behind each one. The table is the single source of truth for the CSV
//! shape: its key order *is* the column order of the delivered file, and the
//! flattening engine evaluates every rule in table order for every
//! (order, line item) pair.
//!
//! ## Rule semantics
//! - [`FieldRule::Empty`]: placeholder column, always blank.
//! - [`FieldRule::OrderPath`]: dotted path resolved against the order.
//!   Numeric segments index into arrays (e.g. `refunds.0.transactions.0.amount`).
//! - [`FieldRule::LineItemPath`]: dotted path resolved against the current
//!   line item (the `line_items.` prefix is already stripped here).
//! - [`FieldRule::MultiPath`]: several paths resolved independently and
//!   joined with a single space. Sub-paths keep their prefix so each one can
//!   pick its own root at evaluation time.
//! - [`FieldRule::Special`]: columns whose value cannot be expressed as a
//!   plain path; the set is closed and matched exhaustively in the engine.
//!
//! ## Lifecycle
//! The table is constructed once at startup via [`MappingTable::order_export`]
//! and passed explicitly into the flattening engine. Nothing mutates it at
//! runtime, so iterating twice always yields the same column order.

/// How a single output column gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Intentionally unpopulated column.
    Empty,
    /// Dotted (and optionally numerically indexed) path rooted at the order.
    OrderPath(&'static str),
    /// Dotted path rooted at the current line item, prefix already stripped.
    LineItemPath(&'static str),
    /// Paths resolved independently, then space-joined.
    MultiPath(&'static [&'static str]),
    /// Column needing custom logic beyond path traversal.
    Special(SpecialRule),
}

/// The closed set of special-cased columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialRule {
    /// `buyer_accepts_marketing` rendered as literal "TRUE"/"FALSE".
    AcceptsMarketing,
    /// `created_at` reformatted from RFC 3339 to `DD-MM-YYYY HH:MM`.
    CreatedAt,
    /// `billing_address.country_code`, not the display country name.
    BillingCountry,
    /// `shipping_address.country_code`, not the display country name.
    ShippingCountry,
}

/// Ordered, immutable list of (column name, rule) pairs.
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: Vec<(&'static str, FieldRule)>,
}

impl MappingTable {
    /// Build a table from explicit entries. Used by tests that need an
    /// alternate mapping; production code uses [`MappingTable::order_export`].
    pub fn new(entries: Vec<(&'static str, FieldRule)>) -> Self {
        Self { entries }
    }

    /// The fixed export mapping for the weekly order feed.
    pub fn order_export() -> Self {
        use FieldRule::{Empty, LineItemPath, MultiPath, OrderPath, Special};
        use SpecialRule::{AcceptsMarketing, BillingCountry, CreatedAt, ShippingCountry};

        Self::new(vec![
            ("Name", OrderPath("name")),
            ("Email", OrderPath("email")),
            ("Financial Status", OrderPath("financial_status")),
            ("Paid at", Empty),
            ("Fulfillment Status", OrderPath("fulfillment_status")),
            ("Fulfilled at", OrderPath("fulfillments.created_at")),
            ("Accepts Marketing", Special(AcceptsMarketing)),
            ("Currency", OrderPath("currency")),
            ("Subtotal", OrderPath("subtotal_price")),
            ("Shipping", OrderPath("total_shipping_price_set.shop_money.amount")),
            ("Taxes", OrderPath("total_tax")),
            ("Total", OrderPath("total_price")),
            ("Discount Code", OrderPath("discount_codes")),
            ("Discount Amount", OrderPath("current_total_discounts")),
            ("Shipping Method", OrderPath("shipping_lines.title")),
            ("Created at", Special(CreatedAt)),
            ("Lineitem quantity", LineItemPath("quantity")),
            ("Lineitem name", LineItemPath("name")),
            ("Lineitem price", LineItemPath("price")),
            ("Lineitem compare at price", Empty),
            ("Lineitem sku", LineItemPath("sku")),
            ("Lineitem requires shipping", LineItemPath("requires_shipping")),
            ("Lineitem taxable", LineItemPath("taxable")),
            ("Lineitem fulfillment status", LineItemPath("fulfillment_status")),
            ("Billing Name", OrderPath("billing_address.name")),
            (
                "Billing Street",
                MultiPath(&["billing_address.address1", "billing_address.address2"]),
            ),
            ("Billing Address1", OrderPath("billing_address.address1")),
            ("Billing Address2", OrderPath("billing_address.address2")),
            ("Billing Company", OrderPath("billing_address.company")),
            ("Billing City", OrderPath("billing_address.city")),
            ("Billing Zip", OrderPath("billing_address.zip")),
            ("Billing Province", OrderPath("billing_address.province_code")),
            ("Billing Country", Special(BillingCountry)),
            ("Billing Phone", OrderPath("billing_address.phone")),
            ("Shipping Name", OrderPath("shipping_address.name")),
            (
                "Shipping Street",
                MultiPath(&["shipping_address.address1", "shipping_address.address2"]),
            ),
            ("Shipping Address1", OrderPath("shipping_address.address1")),
            ("Shipping Address2", OrderPath("shipping_address.address2")),
            ("Shipping Company", OrderPath("shipping_address.company")),
            ("Shipping City", OrderPath("shipping_address.city")),
            ("Shipping Zip", OrderPath("shipping_address.zip")),
            ("Shipping Province", OrderPath("shipping_address.province_code")),
            ("Shipping Country", Special(ShippingCountry)),
            ("Shipping Phone", OrderPath("shipping_address.phone")),
            ("Note Attributes", OrderPath("note_attributes")),
            ("Cancelled at", OrderPath("cancelled_at")),
            ("Refunded Amount", OrderPath("refunds.0.transactions.0.amount")),
            ("Vendor", LineItemPath("vendor")),
            ("Order ID", OrderPath("id")),
            ("Lineitem discount", LineItemPath("total_discount")),
            ("Billing Province Name", OrderPath("billing_address.province_code")),
            ("Shipping Province Name", OrderPath("shipping_address.province_code")),
        ])
    }

    /// Column names in table order. This order is the CSV column order.
    pub fn columns(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Iterate entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldRule)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
