use axum::{Router, routing::get};

use infra::{AppState, http::handler::cep::by_code};

pub fn create_cep_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{cep}", get(by_code))
        .with_state(app_state)
}
