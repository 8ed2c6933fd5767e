//! HTTP API for table billing.
//!
//! This module exposes the billing pipeline and the GST settings store
//! using the [`axum`](https://crates.io/crates/axum) framework.  Clients
//! post the completed orders they fetched from the ordering backend and
//! receive per-customer bills, rounded for display, together with
//! headline figures.
//!
//! | Method | Path | |
//! |---|---|---|
//! | `POST` | `/api/bills` | build bills from orders |
//! | `GET` | `/api/settings/gst` | current GST settings |
//! | `PUT` | `/api/settings/gst` | update, validate and save GST settings |
//! | `GET` | `/api/settings/restaurant` | restaurant details for receipts |

use crate::config::Config;
use crate::engine::{run_billing, search_bills, summarize};
use crate::error::BillingError;
use crate::models::{Bill, BillingSummary, DateRange, Order, RestaurantInfo, TaxConfig};
use crate::settings::{
    load_restaurant_info, load_tax_config, merge_tax_config, save_tax_config, FileStorage,
    SettingsRepository,
};
use crate::tax::validate_tax_config;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Application state shared across requests.
pub struct AppState {
    pub storage: Arc<dyn SettingsRepository>,
    /// Held across the read-modify-write of a settings save.
    save_lock: Mutex<()>,
}

/// Body of `POST /api/bills`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRequest {
    pub orders: Vec<Order>,
    /// Defaults to `today`.
    #[serde(default)]
    pub range: DateRange,
    /// Reference time for `range`; the server's local time if absent.
    #[serde(default)]
    pub now: Option<DateTime<FixedOffset>>,
    /// Optional customer name/phone filter.
    #[serde(default)]
    pub search: Option<String>,
    /// Tax settings for this request only, instead of the stored ones.
    /// Fields left out take their default values.
    #[serde(default)]
    pub tax: Option<Value>,
}

/// Response of `POST /api/bills`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingResponse {
    pub bills: Vec<Bill>,
    pub summary: BillingSummary,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            error!(error = %self, "billing request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = Json(serde_json::json!({"error": self.to_string()}));
        (status, body).into_response()
    }
}

/// Build the API router around the given settings store.  Returns the
/// router and a handle to the state.
pub fn build_router(storage: Arc<dyn SettingsRepository>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        storage,
        save_lock: Mutex::new(()),
    });
    let router = Router::new()
        .route("/api/bills", post(bills_handler))
        .route("/api/settings/gst", get(get_gst_handler).put(put_gst_handler))
        .route("/api/settings/restaurant", get(restaurant_handler))
        .with_state(state.clone());
    (router, state)
}

/// Handler for POST /api/bills
async fn bills_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<BillingRequest>,
) -> Result<Json<BillingResponse>, BillingError> {
    let config = match request.tax {
        Some(tax) => {
            let tax = merge_tax_config(&TaxConfig::default(), tax)?;
            validate_tax_config(&tax)?;
            tax
        }
        None => load_tax_config(app_state.storage.as_ref()),
    };
    let now = request.now.unwrap_or_else(|| Local::now().fixed_offset());

    let bills = run_billing(request.orders, request.range, &now, &config)?;
    let bills = match request.search.as_deref() {
        Some(term) => search_bills(bills, term),
        None => bills,
    };
    let summary = summarize(&bills)?;

    Ok(Json(BillingResponse {
        bills: bills.iter().map(Bill::for_presentation).collect(),
        summary: summary.for_presentation(),
    }))
}

/// Handler for GET /api/settings/gst
async fn get_gst_handler(State(app_state): State<Arc<AppState>>) -> Json<TaxConfig> {
    Json(load_tax_config(app_state.storage.as_ref()))
}

/// Handler for PUT /api/settings/gst
///
/// Fields left out of the body keep their stored values.
async fn put_gst_handler(
    State(app_state): State<Arc<AppState>>,
    Json(patch): Json<Value>,
) -> Result<Json<TaxConfig>, BillingError> {
    let _guard = app_state.save_lock.lock().await;
    let current = load_tax_config(app_state.storage.as_ref());
    let config = merge_tax_config(&current, patch)?;
    save_tax_config(app_state.storage.as_ref(), &config)?;
    Ok(Json(config))
}

/// Handler for GET /api/settings/restaurant
async fn restaurant_handler(State(app_state): State<Arc<AppState>>) -> Json<RestaurantInfo> {
    Json(load_restaurant_info(app_state.storage.as_ref()))
}

/// Launch the API server.  Settings are kept as files under the
/// configured directory.  Blocks until the server terminates.
pub async fn serve(config: &Config) -> Result<()> {
    let storage: Arc<dyn SettingsRepository> = Arc::new(FileStorage::new(config.settings_dir.clone()));
    let (router, _state) = build_router(storage);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        settings_dir = ?config.settings_dir,
        "billing server listening"
    );
    axum::serve(listener, router).await?;
    Ok(())
}
