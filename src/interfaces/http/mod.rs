//! Axum HTTP surface: `/query` and `/pay`.

mod handlers;

use crate::application::engine::BountyEngine;
use crate::error::{BountyError, Result};
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::sync::Arc;
use tracing::{error, info, warn};

pub fn router(engine: Arc<BountyEngine>) -> Router {
    Router::new()
        .route("/query", get(handlers::query))
        .route("/pay", get(handlers::pay).post(handlers::pay))
        .with_state(engine)
}

/// Binds `addr` and serves requests until the process exits.
pub async fn serve(addr: &str, engine: Arc<BountyEngine>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

impl IntoResponse for BountyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BountyError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BountyError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            BountyError::StillOpen | BountyError::NotOpen => {
                (StatusCode::CONFLICT, self.to_string())
            }
            BountyError::InvalidAddress { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            BountyError::Tracker(_) | BountyError::Wallet(_) | BountyError::Market(_) => {
                warn!("upstream failure: {self}");
                (StatusCode::BAD_GATEWAY, "something went wrong".to_string())
            }
            BountyError::Conflict { .. }
            | BountyError::Integrity(_)
            | BountyError::Storage(_)
            | BountyError::Io(_) => {
                error!("internal failure: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong".to_string(),
                )
            }
        };
        (status, format!("{message}\n")).into_response()
    }
}
