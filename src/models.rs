//! Data models for table billing.
//!
//! The `models` module defines the serialisable structs and enums
//! flowing through the billing pipeline: orders as delivered by the
//! ordering backend, the owner's tax configuration, and the derived
//! per-customer bills.  Field names serialize in camelCase so that the
//! JSON matches what the ordering frontend and backend already speak.

use crate::money::round_money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an order.  Only [`OrderStatus::Completed`]
/// orders are billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

/// A single line on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    /// Unit price.  Never negative.
    pub price: Decimal,
    /// Number of units ordered.  Always positive.
    pub quantity: u32,
}

/// An order placed from a table.
///
/// Orders are owned by the ordering backend and are read-only here.
/// Fields the backend occasionally leaves out (`items`, `totalAmount`,
/// customer details) default to empty/zero so that aggregation stays
/// total instead of rejecting the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Expected to equal `Σ price * quantity`; bill subtotals are summed
    /// from this field rather than recomputed from `items`.
    #[serde(default)]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all items.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// The customer this order is billed to.
    pub fn customer_key(&self) -> CustomerKey {
        CustomerKey {
            name: self.customer_name.clone(),
            phone: self.customer_phone.clone(),
        }
    }
}

/// Identifies a customer for billing purposes.
///
/// Name and phone are kept as separate fields so that, for instance,
/// `("a_b", "c")` and `("a", "b_c")` stay distinct customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerKey {
    pub name: String,
    pub phone: String,
}

impl fmt::Display for CustomerKey {
    /// Renders the `name_phone` form used as the bill id.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.phone)
    }
}

/// The time window a bill listing covers.
///
/// Unknown values (e.g. `"yesterday"`) are read as [`DateRange::All`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DateRange {
    /// Since local midnight.
    #[default]
    Today,
    /// Since local midnight seven days ago.
    Week,
    /// Since local midnight one calendar month ago.
    Month,
    /// No time restriction.
    All,
}

impl From<&str> for DateRange {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => DateRange::Today,
            "week" => DateRange::Week,
            "month" => DateRange::Month,
            _ => DateRange::All,
        }
    }
}

impl From<String> for DateRange {
    fn from(value: String) -> Self {
        DateRange::from(value.as_str())
    }
}

/// The owner's GST policy.
///
/// `cgst + sgst` is expected to equal `rate`; see
/// [`crate::tax::validate_tax_config`].  Fields missing from a stored
/// object fall back to the values of [`TaxConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxConfig {
    pub enabled: bool,
    /// Total GST percentage, `0..=100`.
    pub rate: Decimal,
    /// Central GST percentage.
    pub cgst: Decimal,
    /// State GST percentage.
    pub sgst: Decimal,
    /// Show CGST and SGST as separate lines instead of one GST line.
    pub show_breakdown: bool,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: Decimal::new(5, 0),
            cgst: Decimal::new(25, 1),
            sgst: Decimal::new(25, 1),
            show_breakdown: true,
        }
    }
}

impl TaxConfig {
    /// Returns a copy with `rate` replaced and split evenly between CGST
    /// and SGST.
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        let half = rate / Decimal::TWO;
        self.rate = rate;
        self.cgst = half;
        self.sgst = half;
        self
    }

    /// A configuration that charges no tax.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Tax computed for one bill.
///
/// Rates are frozen into the result so that a printed receipt shows the
/// policy in force when the bill was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstBreakdown {
    pub enabled: bool,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub total: Decimal,
    pub cgst_rate: Decimal,
    pub sgst_rate: Decimal,
    pub total_rate: Decimal,
    pub show_breakdown: bool,
}

impl GstBreakdown {
    /// The breakdown used when GST is switched off.
    pub fn zero() -> Self {
        Self {
            enabled: false,
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            total: Decimal::ZERO,
            cgst_rate: Decimal::ZERO,
            sgst_rate: Decimal::ZERO,
            total_rate: Decimal::ZERO,
            show_breakdown: false,
        }
    }
}

/// All completed orders of one customer, with tax applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// `customerName_customerPhone`.
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    /// Never empty.
    pub orders: Vec<Order>,
    pub subtotal: Decimal,
    pub item_count: u64,
    pub first_order_date: DateTime<Utc>,
    pub last_order_date: DateTime<Utc>,
    pub gst: GstBreakdown,
    /// `subtotal + gst.total`.
    pub total_amount: Decimal,
}

impl Bill {
    /// Returns a copy with every monetary amount rounded to two decimal
    /// places, for display or printing.  Rates and the constituent orders
    /// are left untouched.
    pub fn for_presentation(&self) -> Bill {
        let mut bill = self.clone();
        bill.subtotal = round_money(bill.subtotal);
        bill.gst.cgst = round_money(bill.gst.cgst);
        bill.gst.sgst = round_money(bill.gst.sgst);
        bill.gst.total = round_money(bill.gst.total);
        bill.total_amount = round_money(bill.total_amount);
        bill
    }
}

/// Restaurant details printed on receipts.  Read from the `restaurant`
/// subtree of the settings blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestaurantInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub gst_number: String,
}

impl Default for RestaurantInfo {
    fn default() -> Self {
        Self {
            name: "QR Menu Restaurant".to_string(),
            address: String::new(),
            phone: String::new(),
            gst_number: String::new(),
        }
    }
}

/// Headline figures over a list of bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub total_bills: usize,
    pub unique_customers: usize,
    pub total_revenue: Decimal,
    pub total_gst: Decimal,
    /// Zero when there are no bills.
    pub average_bill_value: Decimal,
}

impl BillingSummary {
    /// Returns a copy with the amounts rounded to two decimal places.
    pub fn for_presentation(&self) -> BillingSummary {
        BillingSummary {
            total_revenue: round_money(self.total_revenue),
            total_gst: round_money(self.total_gst),
            average_bill_value: round_money(self.average_bill_value),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_deserializes_backend_shape() {
        let order: Order = serde_json::from_value(json!({
            "_id": "665f1",
            "customerName": "Alice",
            "customerPhone": "9990001111",
            "tableNumber": 4,
            "items": [
                {"name": "Paneer Tikka", "price": 180.5, "quantity": 2},
                {"name": "Lassi", "price": 60, "quantity": 1}
            ],
            "totalAmount": 421,
            "status": "completed",
            "createdAt": "2026-10-18T12:30:00Z"
        }))
        .unwrap();
        assert_eq!(order.id, "665f1");
        assert_eq!(order.table_number, Some(4));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items[0].price, "180.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_order_missing_amounts_default_to_zero() {
        let order: Order = serde_json::from_value(json!({
            "id": "o1",
            "status": "completed",
            "createdAt": "2026-10-18T12:30:00Z"
        }))
        .unwrap();
        assert_eq!(order.total_amount, Decimal::ZERO);
        assert!(order.items.is_empty());
        assert_eq!(order.customer_name, "");
    }

    #[test]
    fn test_date_range_unknown_value_means_all() {
        let range: DateRange = serde_json::from_value(json!("yesterday")).unwrap();
        assert_eq!(range, DateRange::All);
        let range: DateRange = serde_json::from_value(json!("Week")).unwrap();
        assert_eq!(range, DateRange::Week);
        assert_eq!(serde_json::to_value(DateRange::Month).unwrap(), json!("month"));
    }

    #[test]
    fn test_tax_config_partial_object_uses_defaults() {
        let config: TaxConfig = serde_json::from_value(json!({"enabled": false})).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.rate, Decimal::new(5, 0));
        assert_eq!(config.cgst, Decimal::new(25, 1));
        assert!(config.show_breakdown);
    }

    #[test]
    fn test_with_rate_splits_evenly() {
        let config = TaxConfig::default().with_rate(Decimal::new(18, 0));
        assert_eq!(config.rate, Decimal::new(18, 0));
        assert_eq!(config.cgst, Decimal::new(9, 0));
        assert_eq!(config.sgst, Decimal::new(9, 0));
    }

    #[test]
    fn test_customer_key_display() {
        let key = CustomerKey {
            name: "Alice".into(),
            phone: "9990001111".into(),
        };
        assert_eq!(key.to_string(), "Alice_9990001111");
    }
}
