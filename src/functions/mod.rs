//! Edge functions: small handlers served under `/functions/v1` that proxy a
//! single backend procedure with the caller's credentials.

pub mod mark_top_featured;
pub mod rpc;

use axum::{routing::post, Router};

use crate::InnerState;

pub fn create_functions_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating edge functions router");

    Router::new()
        .route(
            "/functions/v1/mark-top-featured",
            post(mark_top_featured::mark_top_featured).options(mark_top_featured::preflight),
        )
        .with_state(state)
}
