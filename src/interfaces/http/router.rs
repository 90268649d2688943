//! API router with Swagger UI

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    DistrictService, InventoryService, ItemService, SpatialService, StoreService, UserService,
};
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{ApiResponse, MessageResponse, PaginatedResponse};
use crate::interfaces::http::middleware::{auth_middleware, optional_auth_middleware, AuthState};
use crate::interfaces::http::modules::{
    auth, districts, health, inventory, items, metrics, request_id, spatial, stores, users,
};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::refresh,
        auth::logout,
        auth::verify,
        // Users
        users::list_users,
        users::search_users,
        users::create_user,
        users::get_profile,
        users::update_profile,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::change_role,
        users::change_password,
        // Districts
        districts::list_districts,
        districts::create_district,
        districts::get_district,
        districts::update_district,
        districts::delete_district,
        districts::search_districts,
        districts::district_statistics,
        districts::district_density,
        districts::locate_district,
        districts::district_stores,
        // Stores
        stores::list_stores,
        stores::create_store,
        stores::get_store,
        stores::update_store,
        stores::delete_store,
        stores::search_stores,
        stores::nearest_stores,
        stores::store_statistics,
        stores::store_inventory,
        // Items
        items::list_items,
        items::search_items,
        items::create_item,
        items::get_item,
        items::update_item,
        items::delete_item,
        items::item_statistics,
        items::item_stores,
        // Inventory
        inventory::list_inventory,
        inventory::create_inventory,
        inventory::get_inventory,
        inventory::update_inventory,
        inventory::delete_inventory,
        inventory::nearby_inventory,
        inventory::search_inventory,
        inventory::inventory_statistics,
        inventory::available_items,
        // Spatial
        spatial::spatial_statistics,
        spatial::spatial_search,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            MessageResponse,
            PaginatedResponse<stores::StoreDto>,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::TokenPair,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::VerifyRequest,
            auth::VerifyResponse,
            // Users
            users::UserDto,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::UpdateProfileRequest,
            users::ChangeRoleRequest,
            users::ChangePasswordRequest,
            // Districts
            districts::DistrictDto,
            districts::DistrictSummaryDto,
            districts::PointDto,
            districts::CreateDistrictRequest,
            districts::UpdateDistrictRequest,
            districts::DistrictStatisticsDto,
            districts::DistrictDensityDto,
            // Stores
            stores::StoreDto,
            stores::CreateStoreRequest,
            stores::UpdateStoreRequest,
            stores::SearchMetadata,
            stores::StoreSearchResponse,
            stores::StoreStatisticsDto,
            // Items
            items::ItemDto,
            items::CreateItemRequest,
            items::UpdateItemRequest,
            items::ItemStatisticsDto,
            // Inventory
            inventory::InventoryDto,
            inventory::CreateInventoryRequest,
            inventory::UpdateInventoryRequest,
            inventory::InventoryStatisticsDto,
            // Spatial
            spatial::SpatialOverviewDto,
            spatial::SpatialSearchResponse,
            // Health
            health::HealthResponse,
            health::DatabaseHealth,
            health::HealthStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and database readiness"),
        (name = "Authentication", description = "JWT login, refresh, logout and verification"),
        (name = "Users", description = "User accounts, roles and profiles"),
        (name = "Districts", description = "Administrative districts and their boundaries"),
        (name = "Stores", description = "Convenience stores, search and nearest-store lookup"),
        (name = "Items", description = "Product catalogue"),
        (name = "Inventory", description = "Which store carries which item"),
        (name = "Spatial", description = "City-wide statistics and radius search"),
    ),
    info(
        title = "Storemap API",
        version = "1.0.0",
        description = "Convenience store locations, districts, items and inventory",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    db: DatabaseConnection,
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    prometheus: PrometheusHandle,
) -> Router {
    let user_service = Arc::new(UserService::new(repos.clone(), jwt_config.clone()));
    let auth_state = AuthState {
        jwt_config,
        user_service: user_service.clone(),
    };
    let require_auth = middleware::from_fn_with_state(auth_state.clone(), auth_middleware);
    let optional_auth =
        middleware::from_fn_with_state(auth_state.clone(), optional_auth_middleware);

    let district_service = Arc::new(DistrictService::new(repos.clone()));
    let store_service = Arc::new(StoreService::new(repos.clone()));
    let item_service = Arc::new(ItemService::new(repos.clone()));
    let inventory_service = Arc::new(InventoryService::new(repos.clone()));
    let spatial_service = Arc::new(SpatialService::new(repos));

    // ── Auth ───────────────────────────────────────────────────
    let auth_handler_state = auth::AuthHandlerState {
        user_service: user_service.clone(),
    };
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/verify", post(auth::verify))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .layer(require_auth.clone()),
        )
        .with_state(auth_handler_state);

    // ── Users (always authenticated) ───────────────────────────
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/search", get(users::search_users))
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/change-role", post(users::change_role))
        .route("/{id}/change-password", post(users::change_password))
        .layer(require_auth)
        .with_state(users::UserHandlerState { user_service });

    // ── Catalog (public reads, role-checked writes) ────────────
    let district_routes = Router::new()
        .route(
            "/",
            get(districts::list_districts).post(districts::create_district),
        )
        .route("/search", get(districts::search_districts))
        .route("/statistics", get(districts::district_statistics))
        .route("/density", get(districts::district_density))
        .route("/locate", get(districts::locate_district))
        .route(
            "/{id}",
            get(districts::get_district)
                .put(districts::update_district)
                .delete(districts::delete_district),
        )
        .route("/{id}/stores", get(districts::district_stores))
        .layer(optional_auth.clone())
        .with_state(districts::DistrictHandlerState {
            service: district_service,
        });

    let store_routes = Router::new()
        .route("/", get(stores::list_stores).post(stores::create_store))
        .route("/search", get(stores::search_stores))
        .route("/nearest", get(stores::nearest_stores))
        .route("/statistics", get(stores::store_statistics))
        .route(
            "/{id}",
            get(stores::get_store)
                .put(stores::update_store)
                .delete(stores::delete_store),
        )
        .route("/{id}/inventory", get(stores::store_inventory))
        .layer(optional_auth.clone())
        .with_state(stores::StoreHandlerState {
            service: store_service.clone(),
        });

    let item_routes = Router::new()
        .route("/", get(items::list_items).post(items::create_item))
        .route("/search", get(items::search_items))
        .route("/statistics", get(items::item_statistics))
        .route(
            "/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/{id}/stores", get(items::item_stores))
        .layer(optional_auth.clone())
        .with_state(items::ItemHandlerState {
            service: item_service,
        });

    let inventory_routes = Router::new()
        .route(
            "/",
            get(inventory::list_inventory).post(inventory::create_inventory),
        )
        .route("/nearby", get(inventory::nearby_inventory))
        .route("/search", get(inventory::search_inventory))
        .route("/statistics", get(inventory::inventory_statistics))
        .route("/available-items", get(inventory::available_items))
        .route(
            "/{id}",
            get(inventory::get_inventory)
                .put(inventory::update_inventory)
                .delete(inventory::delete_inventory),
        )
        .layer(optional_auth)
        .with_state(inventory::InventoryHandlerState {
            service: inventory_service,
        });

    let spatial_routes = Router::new()
        .route("/statistics", get(spatial::spatial_statistics))
        .route("/spatial-search", get(spatial::spatial_search))
        .with_state(spatial::SpatialHandlerState {
            spatial: spatial_service,
            stores: store_service,
        });

    // ── Operational ────────────────────────────────────────────
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState::new(db));
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(metrics::MetricsState { handle: prometheus });

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/districts", district_routes)
        .nest("/api/v1/stores", store_routes)
        .nest("/api/v1/items", item_routes)
        .nest("/api/v1/inventory", inventory_routes)
        .nest("/api/v1", spatial_routes)
        // Middleware
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
