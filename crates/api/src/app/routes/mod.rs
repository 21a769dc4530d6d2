use axum::Router;

pub mod hubs;
pub mod orders;
pub mod skus;
pub mod system;

/// Router for everything under `/api/v1`.
pub fn router() -> Router {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/hubs", hubs::router())
        .nest("/skus", skus::router())
}
