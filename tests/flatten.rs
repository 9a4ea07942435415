use serde_json::{json, Value};

use shopify_order_export::flatten::{flatten, FlatRow, FlattenError};
use shopify_order_export::mapping::{FieldRule, MappingTable};

/// A representative order with two line items, both address blocks, a refund
/// and a mix of falsy/truthy fields.
fn sample_order() -> Value {
    json!({
        "id": 450789469,
        "name": "#1001",
        "email": "bob.norman@example.com",
        "financial_status": "paid",
        "fulfillment_status": null,
        "buyer_accepts_marketing": true,
        "currency": "USD",
        "subtotal_price": "398.00",
        "total_tax": "11.94",
        "total_price": "409.94",
        "current_total_discounts": "0.00",
        "created_at": "2025-03-27T11:51:11-04:00",
        "cancelled_at": null,
        "total_shipping_price_set": { "shop_money": { "amount": "4.90" } },
        "discount_codes": [],
        "note_attributes": [],
        "shipping_lines": [ { "title": "Standard" } ],
        "billing_address": {
            "name": "Bob Norman",
            "address1": "12 Elm St",
            "address2": "",
            "company": null,
            "city": "Louisville",
            "zip": "40202",
            "province_code": "KY",
            "country": "United States",
            "country_code": "US",
            "phone": "555-625-1199"
        },
        "shipping_address": {
            "name": "Bob Norman",
            "address1": "12 Elm St",
            "address2": "Apt 2",
            "company": "",
            "city": "Louisville",
            "zip": "40202",
            "province_code": "KY",
            "country": "United States",
            "country_code": "US",
            "phone": "555-625-1199"
        },
        "refunds": [ { "transactions": [ { "amount": "10.00" } ] } ],
        "line_items": [
            {
                "quantity": 1,
                "name": "IPod Nano - 8gb - green",
                "price": "199.00",
                "sku": "IPOD2008GREEN",
                "taxable": true,
                "requires_shipping": true,
                "fulfillment_status": "fulfilled",
                "vendor": "Apple",
                "total_discount": "0.00"
            },
            {
                "quantity": 2,
                "name": "IPod Touch 8GB",
                "price": "99.50",
                "sku": "IPOD2009BLACK",
                "taxable": false,
                "requires_shipping": false,
                "fulfillment_status": null,
                "vendor": "Apple",
                "total_discount": "5.00"
            }
        ]
    })
}

/// Look up a single column value in a row by column name.
fn col<'a>(table: &MappingTable, row: &'a FlatRow, column: &str) -> &'a str {
    let index = table
        .columns()
        .iter()
        .position(|c| *c == column)
        .unwrap_or_else(|| panic!("no column named {column}"));
    &row.values[index]
}

#[test]
fn one_row_per_line_item_with_order_fields_repeated() {
    let table = MappingTable::order_export();
    let rows = flatten(&table, &[sample_order()]).expect("flatten should succeed");

    assert_eq!(rows.len(), 2, "two line items should yield two rows");
    for row in &rows {
        assert_eq!(col(&table, row, "Name"), "#1001");
        assert_eq!(col(&table, row, "Email"), "bob.norman@example.com");
        assert_eq!(col(&table, row, "Order ID"), "450789469");
    }
    assert_eq!(col(&table, &rows[0], "Lineitem name"), "IPod Nano - 8gb - green");
    assert_eq!(col(&table, &rows[1], "Lineitem name"), "IPod Touch 8GB");
    assert_eq!(col(&table, &rows[0], "Lineitem quantity"), "1");
    assert_eq!(col(&table, &rows[1], "Lineitem quantity"), "2");
}

#[test]
fn every_row_has_the_full_column_set_in_table_order() {
    let table = MappingTable::order_export();
    // Second order is nearly empty; its rows must still be full width.
    let sparse = json!({
        "created_at": "2025-01-05T00:00:00+00:00",
        "line_items": [ { "name": "Widget" } ]
    });
    let rows = flatten(&table, &[sample_order(), sparse]).expect("flatten should succeed");

    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(
            row.values.len(),
            table.len(),
            "row width must equal the mapping table key count"
        );
    }
}

#[test]
fn missing_billing_address_yields_blank_billing_columns() {
    let table = MappingTable::order_export();
    let mut order = sample_order();
    order.as_object_mut().unwrap().remove("billing_address");

    let rows = flatten(&table, &[order]).expect("flatten should succeed");
    let row = &rows[0];

    for column in table.columns() {
        if column.starts_with("Billing") {
            // The street column is a two-path join, so it keeps the joining
            // space even when both halves are missing.
            let expected = if column == "Billing Street" { " " } else { "" };
            assert_eq!(
                col(&table, row, column),
                expected,
                "column {column} should be blank without a billing address"
            );
        }
    }
}

#[test]
fn accepts_marketing_is_always_true_or_false() {
    let table = MappingTable::order_export();

    let consenting = sample_order();
    let rows = flatten(&table, &[consenting]).unwrap();
    assert_eq!(col(&table, &rows[0], "Accepts Marketing"), "TRUE");

    let mut declined = sample_order();
    declined["buyer_accepts_marketing"] = json!(false);
    let rows = flatten(&table, &[declined]).unwrap();
    assert_eq!(col(&table, &rows[0], "Accepts Marketing"), "FALSE");

    let mut absent = sample_order();
    absent.as_object_mut().unwrap().remove("buyer_accepts_marketing");
    let rows = flatten(&table, &[absent]).unwrap();
    assert_eq!(
        col(&table, &rows[0], "Accepts Marketing"),
        "FALSE",
        "absent consent must read as FALSE, never empty"
    );
}

#[test]
fn created_at_is_reformatted_day_month_year_minutes() {
    let table = MappingTable::order_export();
    let rows = flatten(&table, &[sample_order()]).unwrap();
    assert_eq!(col(&table, &rows[0], "Created at"), "27-03-2025 11:51");
}

#[test]
fn malformed_created_at_surfaces_an_error() {
    let table = MappingTable::order_export();
    let mut order = sample_order();
    order["created_at"] = json!("27/03/2025 11:51");

    let err = flatten(&table, &[order]).expect_err("malformed timestamp must not be sliced");
    match err {
        FlattenError::MalformedTimestamp { order_id, raw } => {
            assert_eq!(order_id, "450789469");
            assert_eq!(raw, "27/03/2025 11:51");
        }
    }
}

#[test]
fn multi_path_join_keeps_the_separating_space() {
    let table = MappingTable::order_export();
    let rows = flatten(&table, &[sample_order()]).unwrap();

    // address2 is empty, so the join contributes only the separator.
    assert_eq!(col(&table, &rows[0], "Billing Street"), "12 Elm St ");
    // Both halves present join naturally.
    assert_eq!(col(&table, &rows[0], "Shipping Street"), "12 Elm St Apt 2");
}

#[test]
fn numeric_path_segments_index_into_arrays() {
    let table = MappingTable::order_export();
    let rows = flatten(&table, &[sample_order()]).unwrap();
    assert_eq!(col(&table, &rows[0], "Refunded Amount"), "10.00");

    let mut unrefunded = sample_order();
    unrefunded["refunds"] = json!([]);
    let rows = flatten(&table, &[unrefunded]).unwrap();
    assert_eq!(col(&table, &rows[0], "Refunded Amount"), "");
}

#[test]
fn order_without_line_items_contributes_zero_rows() {
    let table = MappingTable::order_export();

    let mut no_items = sample_order();
    no_items["line_items"] = json!([]);
    let mut missing_items = sample_order();
    missing_items.as_object_mut().unwrap().remove("line_items");

    let rows = flatten(&table, &[no_items, missing_items, sample_order()])
        .expect("structurally incomplete orders are not an error");
    assert_eq!(rows.len(), 2, "only the complete order should produce rows");
}

#[test]
fn falsy_values_render_as_empty_and_truthy_as_text() {
    let table = MappingTable::order_export();
    let rows = flatten(&table, &[sample_order()]).unwrap();

    // Booleans: true renders "true", false is indistinguishable from missing.
    assert_eq!(col(&table, &rows[0], "Lineitem taxable"), "true");
    assert_eq!(col(&table, &rows[1], "Lineitem taxable"), "");

    // Nulls render blank, non-zero amount strings pass through verbatim.
    assert_eq!(col(&table, &rows[0], "Cancelled at"), "");
    assert_eq!(col(&table, &rows[0], "Subtotal"), "398.00");
    assert_eq!(col(&table, &rows[0], "Discount Amount"), "0.00");

    // Terminal arrays are emitted as compact JSON.
    assert_eq!(col(&table, &rows[0], "Discount Code"), "[]");

    // Traversing an object key into an array resolves to nothing.
    assert_eq!(col(&table, &rows[0], "Shipping Method"), "");
    assert_eq!(col(&table, &rows[0], "Fulfilled at"), "");

    // Placeholder columns stay blank.
    assert_eq!(col(&table, &rows[0], "Paid at"), "");
    assert_eq!(col(&table, &rows[0], "Lineitem compare at price"), "");
}

#[test]
fn country_columns_use_the_normalized_code_not_the_display_name() {
    let table = MappingTable::order_export();
    let rows = flatten(&table, &[sample_order()]).unwrap();
    assert_eq!(col(&table, &rows[0], "Billing Country"), "US");
    assert_eq!(col(&table, &rows[0], "Shipping Country"), "US");

    let mut codeless = sample_order();
    codeless["billing_address"].as_object_mut().unwrap().remove("country_code");
    let rows = flatten(&table, &[codeless]).unwrap();
    assert_eq!(col(&table, &rows[0], "Billing Country"), "");
}

#[test]
fn flatten_is_idempotent() {
    let table = MappingTable::order_export();
    let orders = vec![sample_order(), sample_order()];
    let first = flatten(&table, &orders).unwrap();
    let second = flatten(&table, &orders).unwrap();
    assert_eq!(first, second, "no hidden state may leak between calls");
}

#[test]
fn flatten_honours_an_injected_alternate_table() {
    let table = MappingTable::new(vec![
        ("Order", FieldRule::OrderPath("name")),
        ("Item", FieldRule::LineItemPath("name")),
    ]);
    let rows = flatten(&table, &[sample_order()]).unwrap();
    assert_eq!(rows[0].values, vec!["#1001", "IPod Nano - 8gb - green"]);
    assert_eq!(rows[1].values, vec!["#1001", "IPod Touch 8GB"]);
}
