pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;
pub mod loyalty;
pub mod orders;
pub mod stock;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use validator::Validate;

use catalog::{CatalogRepository, MenuItem, UpdateAvailabilityRequest};
use config::EngineConfig;
use error::ApiError;
use geo::{Coordinates, GeoValidator, GeofenceDecision};
use loyalty::{LoyaltyAccount, LoyaltyCalculator, LoyaltyError, LoyaltyRepository, LoyaltySummary};
use orders::{ActorRole, OrderService, OrdersRepository};
use stock::{StockAdjustment, StockEntry, StockError, StockLedger};
use store::MemoryStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub order_service: OrderService,
    pub catalog: CatalogRepository,
    pub stock: StockLedger,
    pub loyalty_repo: LoyaltyRepository,
    pub loyalty_calculator: LoyaltyCalculator,
    pub geo_validator: GeoValidator,
}

impl AppState {
    /// Wire up all services over fresh in-memory stores
    pub fn new(config: EngineConfig) -> Self {
        let catalog = CatalogRepository::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        let stock = StockLedger::new(Arc::new(MemoryStore::new()));
        let loyalty_repo = LoyaltyRepository::new(
            Arc::new(MemoryStore::new()),
            config.loyalty.welcome_bonus,
        );
        let loyalty_calculator = LoyaltyCalculator::new(config.loyalty.clone());
        let geo_validator = GeoValidator::new(&config.geofence);
        let orders_repo = OrdersRepository::new(Arc::new(MemoryStore::new()));

        let order_service = OrderService::new(
            orders_repo,
            catalog.clone(),
            stock.clone(),
            loyalty_repo.clone(),
            loyalty_calculator.clone(),
            geo_validator.clone(),
            Arc::new(orders::DefaultTransitionPolicy),
        );

        Self {
            order_service,
            catalog,
            stock,
            loyalty_repo,
            loyalty_calculator,
            geo_validator,
        }
    }
}

fn require_operator(headers: &HeaderMap) -> Result<(), ApiError> {
    let role = headers
        .get("x-actor-role")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| ActorRole::from_str(raw).ok());
    match role {
        Some(ActorRole::Operator) => Ok(()),
        _ => Err(ApiError::Forbidden(
            "Operator role required".to_string(),
        )),
    }
}

/// Handler for GET /api/menu
/// Lists the catalog with current availability
async fn list_menu(State(state): State<AppState>) -> Json<Vec<MenuItem>> {
    Json(state.catalog.list().await)
}

/// Handler for GET /api/menu/:id
async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MenuItem>, ApiError> {
    let item = state.catalog.find_by_id(id).await?;
    Ok(Json(item))
}

/// Handler for PATCH /api/menu/:id/availability
/// Operator-only: the engine only ever disables items on stock depletion,
/// so re-enabling after a restock comes through here.
async fn update_menu_availability(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<MenuItem>, ApiError> {
    require_operator(&headers)?;
    let item = state.catalog.set_available(id, request.available).await?;
    tracing::info!(
        "Operator set menu item {} availability to {}",
        id,
        item.available
    );
    Ok(Json(item))
}

/// Request body for the standalone geofence check
#[derive(Debug, Deserialize, Validate)]
struct GeofenceCheckRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
}

/// Handler for POST /api/geofence/check
/// Standalone eligibility probe the storefront calls before checkout
async fn check_geofence(
    State(state): State<AppState>,
    Json(request): Json<GeofenceCheckRequest>,
) -> Result<Json<GeofenceDecision>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let decision = state
        .geo_validator
        .validate(Coordinates::new(request.latitude, request.longitude))
        .map_err(|_| ApiError::InvalidCoordinates)?;
    Ok(Json(decision))
}

/// Request body for customer registration
#[derive(Debug, Deserialize)]
struct RegisterCustomerRequest {
    customer_id: i32,
}

/// Handler for POST /api/customers
/// Creates the loyalty account and grants the one-time welcome bonus
async fn register_customer(
    State(state): State<AppState>,
    Json(request): Json<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<LoyaltyAccount>), LoyaltyError> {
    let account = state.loyalty_repo.create_account(request.customer_id).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Handler for GET /api/customers/:id/loyalty
/// Points with the tier derived on read, for display
async fn get_loyalty_summary(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> Result<Json<LoyaltySummary>, LoyaltyError> {
    let account = state.loyalty_repo.find_by_customer(customer_id).await?;
    let summary = LoyaltySummary {
        customer_id: account.customer_id,
        points: account.points,
        tier: state.loyalty_calculator.tier_of(account.points),
        points_to_next_tier: state.loyalty_calculator.points_to_next_tier(account.points),
    };
    Ok(Json(summary))
}

/// Handler for GET /api/stock/low
/// Entries at or below their minimum threshold, for back-office alerting
async fn list_low_stock(State(state): State<AppState>) -> Json<Vec<StockEntry>> {
    let mut entries: Vec<StockEntry> = state.stock.low_stock().collect();
    entries.sort_by_key(|entry| entry.ingredient_id);
    Json(entries)
}

/// Request body for a manual stock adjustment
#[derive(Debug, Deserialize)]
struct AdjustStockRequest {
    delta: i64,
}

/// Handler for POST /api/stock/:id/adjust
/// Operator-only restock/correction; depletion through here disables
/// dependent menu items exactly like order fulfillment does
async fn adjust_stock(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i32>,
    headers: HeaderMap,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<StockAdjustment>, ApiError> {
    require_operator(&headers)?;
    let adjustment = state.stock.adjust(ingredient_id, request.delta).await?;
    if !adjustment.disabled_menu_items.is_empty() {
        state
            .catalog
            .mark_unavailable(&adjustment.disabled_menu_items)
            .await;
    }
    Ok(Json(adjustment))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Ordering flow
        .route("/api/orders", post(orders::place_order_handler))
        .route("/api/orders", get(orders::list_orders_handler))
        .route("/api/orders/:id", get(orders::get_order_handler))
        .route("/api/orders/:id/status", patch(orders::advance_order_handler))
        // Catalog
        .route("/api/menu", get(list_menu))
        .route("/api/menu/:id", get(get_menu_item))
        .route("/api/menu/:id/availability", patch(update_menu_availability))
        // Standalone checks and back-office views
        .route("/api/geofence/check", post(check_geofence))
        .route("/api/customers", post(register_customer))
        .route("/api/customers/:id/loyalty", get(get_loyalty_summary))
        .route("/api/stock/low", get(list_low_stock))
        .route("/api/stock/:id/adjust", post(adjust_stock))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Bistro API - Starting...");

    let config = EngineConfig::from_env();
    tracing::info!(
        "Geofence: ({}, {}) radius {} m",
        config.geofence.restaurant_lat,
        config.geofence.restaurant_lon,
        config.geofence.radius_meters
    );

    let state = AppState::new(config);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Bistro API is running on http://{}", addr);

    axum::serve(listener, app).await.expect("Server error");
}
