//! Route definitions for the Retail POS Back Office

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public login/refresh, protected user creation)
        .nest("/auth", auth_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - sales
        .nest("/sales", sale_routes())
        // Protected routes - cash sessions
        .nest("/cash", cash_routes())
        // Protected routes - promo codes
        .nest("/promocodes", promocode_routes())
        // Protected routes - stock ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - activity log
        .nest("/activity", activity_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .nest("/users", user_routes())
}

/// User management routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_user))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/low-stock", get(handlers::low_stock_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/:product_id/movements",
            get(handlers::product_movements),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale).delete(handlers::cancel_sale),
        )
        .route("/:sale_id/return", post(handlers::process_return))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Cash session routes (protected)
fn cash_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/open", post(handlers::open_session))
        .route("/sessions/current", get(handlers::current_session))
        .route(
            "/sessions/:session_id",
            get(handlers::get_session),
        )
        .route("/sessions/:session_id/close", post(handlers::close_session))
        .route("/sessions/:session_id/count", post(handlers::count_session))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Promo code routes (protected)
fn promocode_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_promocodes).post(handlers::create_promocode),
        )
        .route("/validate", post(handlers::validate_promocode))
        .route("/:promo_id", delete(handlers::delete_promocode))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(handlers::adjust_stock))
        .route("/replenish", post(handlers::replenish_stock))
        .route("/movements", get(handlers::list_movements))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Activity log routes (protected)
fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_activity))
        .route_layer(middleware::from_fn(auth_middleware))
}
