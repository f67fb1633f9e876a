mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::project_routes())
        .merge(handlers::image_routes())
        .merge(handlers::content_routes())
}
