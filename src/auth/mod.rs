use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod verifier;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
