//! JSON API routes for the grocery assistant.
//!
//! Endpoints (all under `/api/v1`, `user` query param defaults to `default`):
//! - `GET    /api/v1/suggestions?limit=`          — ranked suggestions for the current list
//! - `GET    /api/v1/suggestions/patterns/{item}` — association rules for an item
//! - `GET    /api/v1/suggestions/frequency/{item}`— replenishment status for an item
//! - `GET    /api/v1/suggestions/insights`        — shopping-pattern summary
//! - `GET    /api/v1/expirations`                 — expiration reminders
//! - `GET    /api/v1/list`                        — current shopping list
//! - `POST   /api/v1/list/items`                  — add an item to the list
//! - `DELETE /api/v1/list/items/{id}`             — remove an item from the list
//! - `POST   /api/v1/list/purchase`               — mark the whole list purchased
//! - `GET    /api/v1/history`                     — full purchase log, oldest first
//! - `POST   /api/v1/history/items`               — append a purchase record
//! - `GET    /api/v1/history/stats`               — shopping-pattern summary

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use cartwise_core::config::SuggestionsConfig;
use cartwise_core::domain::purchase::{PurchaseRecord, PurchaseRecordId};
use cartwise_core::domain::shopping_list::{ListItem, ListItemId, ShoppingList};
use cartwise_core::errors::ApplicationError;
use cartwise_core::suggestions::{
    analyze_patterns, expiration_reminders, AssociationRule, ExpirationReminder, FrequencyReport,
    PatternInsights, Suggestion, SuggestionEngine, SuggestionRequest,
};
use cartwise_db::repositories::{
    PurchaseLogRepository, RepositoryError, ShoppingListRepository, SqlPurchaseLogRepository,
    SqlShoppingListRepository,
};
use cartwise_db::DbPool;

#[derive(Clone)]
pub struct ApiState {
    db_pool: DbPool,
    engine: SuggestionEngine,
}

impl ApiState {
    pub fn new(db_pool: DbPool, config: SuggestionsConfig) -> Self {
        Self { db_pool, engine: SuggestionEngine::with_config(config) }
    }

    fn purchases(&self) -> SqlPurchaseLogRepository {
        SqlPurchaseLogRepository::new(self.db_pool.clone())
    }

    fn shopping_list(&self) -> SqlShoppingListRepository {
        SqlShoppingListRepository::new(self.db_pool.clone())
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct UserQuery {
    pub user: Option<String>,
    pub limit: Option<usize>,
}

impl UserQuery {
    fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Deserialize)]
pub struct AddListItemRequest {
    pub name: String,
    pub category: String,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPurchaseRequest {
    pub name: String,
    pub category: String,
    pub quantity: Option<u32>,
    pub unit_price: Option<Decimal>,
    /// RFC 3339; defaults to the current instant when omitted
    pub purchased_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseListResponse {
    pub message: String,
    pub purchased_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn storage_error(context: &'static str, source: RepositoryError) -> (StatusCode, Json<ApiError>) {
    let correlation_id = Uuid::new_v4().to_string();
    error!(
        event_name = "api.storage_error",
        correlation_id = %correlation_id,
        context = %context,
        error = %source,
        "storage operation failed"
    );

    let interface =
        ApplicationError::Persistence(source.to_string()).into_interface(correlation_id);
    (StatusCode::SERVICE_UNAVAILABLE, Json(ApiError { error: interface.user_message().to_string() }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into() }))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(db_pool: DbPool, config: SuggestionsConfig) -> Router {
    Router::new()
        .route("/api/v1/suggestions", get(get_suggestions))
        .route("/api/v1/suggestions/patterns/{item}", get(get_association_patterns))
        .route("/api/v1/suggestions/frequency/{item}", get(get_frequency_status))
        .route("/api/v1/suggestions/insights", get(get_insights))
        .route("/api/v1/expirations", get(get_expirations))
        .route("/api/v1/list", get(get_list))
        .route("/api/v1/list/items", post(add_list_item))
        .route("/api/v1/list/items/{id}", delete(delete_list_item))
        .route("/api/v1/list/purchase", post(purchase_list))
        .route("/api/v1/history", get(get_history))
        .route("/api/v1/history/items", post(add_history_item))
        .route("/api/v1/history/stats", get(get_insights))
        .with_state(ApiState::new(db_pool, config))
}

// ---------------------------------------------------------------------------
// Suggestion handlers
// ---------------------------------------------------------------------------

async fn get_suggestions(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<Suggestion>>> {
    let user = query.user();
    let list = state
        .shopping_list()
        .list_for_user(user)
        .await
        .map_err(|e| storage_error("suggestions.list", e))?;
    let log = state
        .purchases()
        .list_for_user(user)
        .await
        .map_err(|e| storage_error("suggestions.log", e))?;

    let limit = query.limit.unwrap_or(state.engine.config().max_suggestions);
    let request =
        SuggestionRequest::new(Utc::now()).with_current_items(list.item_names()).with_limit(limit);

    Ok(Json(state.engine.suggest(&request, &log)))
}

async fn get_association_patterns(
    State(state): State<ApiState>,
    Path(item): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<AssociationRule>>> {
    let log = state
        .purchases()
        .list_for_user(query.user())
        .await
        .map_err(|e| storage_error("patterns.log", e))?;

    Ok(Json(state.engine.association_patterns(&item, &log)))
}

async fn get_frequency_status(
    State(state): State<ApiState>,
    Path(item): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<FrequencyReport>> {
    let log = state
        .purchases()
        .list_for_user(query.user())
        .await
        .map_err(|e| storage_error("frequency.log", e))?;

    Ok(Json(state.engine.frequency_status(&item, &log, Utc::now())))
}

async fn get_insights(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<PatternInsights>> {
    let log = state
        .purchases()
        .list_for_user(query.user())
        .await
        .map_err(|e| storage_error("insights.log", e))?;

    Ok(Json(analyze_patterns(&log)))
}

async fn get_expirations(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<ExpirationReminder>>> {
    let log = state
        .purchases()
        .list_for_user(query.user())
        .await
        .map_err(|e| storage_error("expirations.log", e))?;

    Ok(Json(expiration_reminders(&log, Utc::now())))
}

// ---------------------------------------------------------------------------
// Shopping-list handlers
// ---------------------------------------------------------------------------

async fn get_list(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<ShoppingList>> {
    let list = state
        .shopping_list()
        .list_for_user(query.user())
        .await
        .map_err(|e| storage_error("list.read", e))?;
    Ok(Json(list))
}

async fn add_list_item(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<AddListItemRequest>,
) -> ApiResult<(StatusCode, Json<ListItem>)> {
    if request.name.trim().is_empty() {
        return Err(bad_request("item name must not be empty"));
    }

    let item = ListItem {
        id: ListItemId(Uuid::new_v4().to_string()),
        user_id: query.user().to_string(),
        name: request.name,
        category: request.category,
        quantity: request.quantity.unwrap_or(1),
        unit: request.unit.unwrap_or_else(|| "pieces".to_string()),
        added_at: Utc::now(),
    };

    state.shopping_list().add_item(item.clone()).await.map_err(|e| storage_error("list.add", e))?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_list_item(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<StatusCode> {
    let removed = state
        .shopping_list()
        .remove_item(query.user(), &ListItemId(id))
        .await
        .map_err(|e| storage_error("list.remove", e))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, Json(ApiError { error: "list item not found".to_string() })))
    }
}

/// Mark the whole list purchased: append one purchase record per list item
/// (a single atomic batch, so this trip lands as one basket), then clear
/// the list.
async fn purchase_list(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<PurchaseListResponse>> {
    let user = query.user();
    let list = state
        .shopping_list()
        .list_for_user(user)
        .await
        .map_err(|e| storage_error("purchase.list", e))?;

    if list.is_empty() {
        return Ok(Json(PurchaseListResponse {
            message: "shopping list is empty".to_string(),
            purchased_count: 0,
        }));
    }

    let now = Utc::now();
    let records: Vec<PurchaseRecord> = list
        .items
        .iter()
        .map(|item| PurchaseRecord {
            id: PurchaseRecordId(Uuid::new_v4().to_string()),
            user_id: user.to_string(),
            item_name: item.name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            unit_price: Decimal::ZERO,
            purchased_at: now,
        })
        .collect();
    let purchased_count = records.len();

    state
        .purchases()
        .append_many(records)
        .await
        .map_err(|e| storage_error("purchase.append", e))?;
    state
        .shopping_list()
        .clear_for_user(user)
        .await
        .map_err(|e| storage_error("purchase.clear", e))?;

    info!(
        event_name = "api.list_purchased",
        user_id = %user,
        purchased_count = purchased_count,
        "shopping list marked purchased"
    );

    Ok(Json(PurchaseListResponse {
        message: "items marked as purchased".to_string(),
        purchased_count,
    }))
}

// ---------------------------------------------------------------------------
// Purchase-history handlers
// ---------------------------------------------------------------------------

async fn get_history(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<PurchaseRecord>>> {
    let log = state
        .purchases()
        .list_for_user(query.user())
        .await
        .map_err(|e| storage_error("history.read", e))?;
    Ok(Json(log))
}

async fn add_history_item(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<AddPurchaseRequest>,
) -> ApiResult<(StatusCode, Json<PurchaseRecord>)> {
    if request.name.trim().is_empty() {
        return Err(bad_request("item name must not be empty"));
    }

    let purchased_at = match request.purchased_at.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| bad_request(format!("invalid purchased_at `{raw}`: expected RFC 3339")))?,
        None => Utc::now(),
    };

    let record = PurchaseRecord {
        id: PurchaseRecordId(Uuid::new_v4().to_string()),
        user_id: query.user().to_string(),
        item_name: request.name,
        category: request.category,
        quantity: request.quantity.unwrap_or(1),
        unit_price: request.unit_price.unwrap_or(Decimal::ZERO),
        purchased_at,
    };

    state
        .purchases()
        .append(record.clone())
        .await
        .map_err(|e| storage_error("history.append", e))?;
    Ok((StatusCode::CREATED, Json(record)))
}
