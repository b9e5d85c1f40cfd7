//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: orchestrator, session store and token codec wiring
//! - `routes/`: HTTP routes + handlers
//! - `cookies.rs`: the session cookie
//! - `errors.rs`: mapping auth outcomes to responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod cookies;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices) -> Router {
    let token_state = middleware::TokenState {
        codec: services.tokens.clone(),
    };

    // Bearer routes: require a valid signed token.
    let bearer = routes::token::bearer_router().route_layer(
        axum::middleware::from_fn_with_state(token_state, middleware::bearer_middleware),
    );

    let auth = routes::auth::router()
        .merge(routes::token::router())
        .merge(bearer);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", auth)
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(services))))
}
