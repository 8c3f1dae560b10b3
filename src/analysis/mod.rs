mod dto;
pub mod handlers;
pub mod repo;
pub mod service;
pub mod suggestions;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::analyze_routes())
        .merge(handlers::history_routes())
}
