//! Bill aggregation engine.
//!
//! The `engine` module turns a list of completed orders into a list of
//! per-customer [`Bill`]s.  The pipeline has three stages:
//!
//! 1. [`filter_by_date_range`] narrows the orders to a time window,
//! 2. [`group_by_customer`] accumulates them per (name, phone),
//! 3. [`assemble_bills`] applies GST to every group and sorts the bills
//!    by most recent activity.
//!
//! [`run_billing`] chains the three.  GST is applied to the groups in
//! parallel with [`rayon`]; the output does not depend on scheduling.

use crate::error::{BillingError, Result};
use crate::models::{Bill, BillingSummary, CustomerKey, DateRange, Order, OrderStatus, TaxConfig};
use crate::tax::calculate_gst;
use chrono::{DateTime, Days, Duration, Months, TimeZone, Utc};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Start of the window covered by `range`, or `None` for
/// [`DateRange::All`].
///
/// Windows open at midnight in the time zone of `now`.  `Month` steps
/// back one calendar month, clamping to the end of shorter months
/// (31 March becomes 28/29 February).
pub fn range_start<Tz: TimeZone>(range: DateRange, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let start_date = match range {
        DateRange::Today => today,
        DateRange::Week => today.checked_sub_days(Days::new(7))?,
        DateRange::Month => today.checked_sub_months(Months::new(1))?,
        DateRange::All => return None,
    };
    let midnight = start_date.and_hms_opt(0, 0, 0)?;
    let tz = now.timezone();
    tz.from_local_datetime(&midnight)
        .earliest()
        // midnight skipped by a DST transition
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|start| start.with_timezone(&Utc))
}

/// Keep the orders created inside `range`, measured back from `now`.
pub fn filter_by_date_range<Tz: TimeZone>(
    orders: Vec<Order>,
    range: DateRange,
    now: &DateTime<Tz>,
) -> Vec<Order> {
    match range_start(range, now) {
        Some(start) => orders
            .into_iter()
            .filter(|order| order.created_at >= start)
            .collect(),
        None => orders,
    }
}

/// One customer's orders before tax is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialBill {
    pub key: CustomerKey,
    pub orders: Vec<Order>,
    pub subtotal: Decimal,
    pub item_count: u64,
    pub first_order_date: DateTime<Utc>,
    pub last_order_date: DateTime<Utc>,
}

impl PartialBill {
    fn new(key: CustomerKey, order: &Order) -> Self {
        Self {
            key,
            orders: Vec::new(),
            subtotal: Decimal::ZERO,
            item_count: 0,
            first_order_date: order.created_at,
            last_order_date: order.created_at,
        }
    }

    fn add(&mut self, order: Order) -> Result<()> {
        self.subtotal = self
            .subtotal
            .checked_add(order.total_amount)
            .ok_or(BillingError::AmountOverflow("bill subtotal"))?;
        self.item_count += order.item_count();
        self.first_order_date = self.first_order_date.min(order.created_at);
        self.last_order_date = self.last_order_date.max(order.created_at);
        self.orders.push(order);
        Ok(())
    }
}

/// Orders grouped per customer.
///
/// Lookup is by [`CustomerKey`]; iteration follows the order in which
/// customers were first seen.
#[derive(Debug, Clone, Default)]
pub struct CustomerGroups {
    index: HashMap<CustomerKey, usize>,
    groups: Vec<PartialBill>,
}

impl CustomerGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &CustomerKey) -> Option<&PartialBill> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartialBill> {
        self.groups.iter()
    }

    fn insert(&mut self, order: Order) -> Result<()> {
        let key = order.customer_key();
        let slot = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.groups.len();
                self.groups.push(PartialBill::new(key.clone(), &order));
                self.index.insert(key, i);
                i
            }
        };
        self.groups[slot].add(order)
    }
}

impl IntoIterator for CustomerGroups {
    type Item = PartialBill;
    type IntoIter = std::vec::IntoIter<PartialBill>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Accumulate orders per (customer name, customer phone).
///
/// Status is not checked here; callers pass completed orders only.
/// Fails only if a customer's subtotal exceeds the [`Decimal`] range.
pub fn group_by_customer(orders: Vec<Order>) -> Result<CustomerGroups> {
    let mut groups = CustomerGroups::default();
    for order in orders {
        groups.insert(order)?;
    }
    Ok(groups)
}

/// Apply GST to every group and order the bills by most recent order
/// first.  Bills with the same last order date keep the order in which
/// their customers were first seen.
pub fn assemble_bills(groups: CustomerGroups, config: &TaxConfig) -> Result<Vec<Bill>> {
    let partials: Vec<PartialBill> = groups.into_iter().collect();
    let mut bills: Vec<Bill> = partials
        .into_par_iter()
        .map(|group| -> Result<Bill> {
            let gst = calculate_gst(group.subtotal, config)?;
            let total_amount = group
                .subtotal
                .checked_add(gst.total)
                .ok_or(BillingError::AmountOverflow("bill total"))?;
            Ok(Bill {
                id: group.key.to_string(),
                total_amount,
                customer_name: group.key.name,
                customer_phone: group.key.phone,
                orders: group.orders,
                subtotal: group.subtotal,
                item_count: group.item_count,
                first_order_date: group.first_order_date,
                last_order_date: group.last_order_date,
                gst,
            })
        })
        .collect::<Result<Vec<Bill>>>()?;
    // `sort_by` is stable
    bills.sort_by(|a, b| b.last_order_date.cmp(&a.last_order_date));
    Ok(bills)
}

/// Build the bills for the completed orders among `orders` that fall in
/// `range`.
pub fn run_billing<Tz: TimeZone>(
    orders: Vec<Order>,
    range: DateRange,
    now: &DateTime<Tz>,
    config: &TaxConfig,
) -> Result<Vec<Bill>> {
    let received = orders.len();
    let completed: Vec<Order> = orders
        .into_iter()
        .filter(|order| order.status == OrderStatus::Completed)
        .collect();
    let in_range = filter_by_date_range(completed, range, now);
    let groups = group_by_customer(in_range)?;
    debug!(
        received,
        customers = groups.len(),
        ?range,
        gst_enabled = config.enabled,
        "assembling bills"
    );
    assemble_bills(groups, config)
}

/// Keep the bills whose customer name contains `term` (ignoring case)
/// or whose phone number contains it.  A blank term keeps everything.
pub fn search_bills(bills: Vec<Bill>, term: &str) -> Vec<Bill> {
    let term = term.trim();
    if term.is_empty() {
        return bills;
    }
    let needle = term.to_lowercase();
    bills
        .into_iter()
        .filter(|bill| {
            bill.customer_name.to_lowercase().contains(&needle) || bill.customer_phone.contains(term)
        })
        .collect()
}

fn checked_sum(mut amounts: impl Iterator<Item = Decimal>, what: &'static str) -> Result<Decimal> {
    amounts.try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or(BillingError::AmountOverflow(what))
    })
}

/// Headline figures for a list of bills.
pub fn summarize(bills: &[Bill]) -> Result<BillingSummary> {
    let total_revenue = checked_sum(bills.iter().map(|bill| bill.total_amount), "total revenue")?;
    let total_gst = checked_sum(bills.iter().map(|bill| bill.gst.total), "total GST")?;
    let unique_customers = bills
        .iter()
        .map(|bill| (&bill.customer_name, &bill.customer_phone))
        .collect::<HashSet<_>>()
        .len();
    let average_bill_value = if bills.is_empty() {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(bills.len())
    };
    Ok(BillingSummary {
        total_bills: bills.len(),
        unique_customers,
        total_revenue,
        total_gst,
        average_bill_value,
    })
}
