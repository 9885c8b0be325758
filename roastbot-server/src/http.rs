// roastbot-server/src/http.rs
//! Read-only JSON view of the registry.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use roastbot_common::models::{ChannelSnapshot, ModuleSnapshot};
use roastbot_core::{Bot, Error};

pub fn router(bot: Arc<Bot>) -> Router {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/{name}/modules", get(list_modules))
        .with_state(bot)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any)),
        )
}

/// Binds `addr` and serves until `shutdown` fires (or its sender is dropped).
pub async fn serve(
    bot: Arc<Bot>,
    addr: SocketAddr,
    shutdown: oneshot::Receiver<()>,
) -> Result<JoinHandle<()>, Error> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP view listening on http://{}", listener.local_addr()?);

    Ok(tokio::spawn(async move {
        let server = axum::serve(listener, router(bot)).with_graceful_shutdown(async {
            let _ = shutdown.await;
        });
        if let Err(e) = server.await {
            error!("HTTP server error: {}", e);
        }
        info!("HTTP server shut down.");
    }))
}

async fn list_channels(State(bot): State<Arc<Bot>>) -> Json<Vec<ChannelSnapshot>> {
    Json(bot.channels())
}

async fn list_modules(
    State(bot): State<Arc<Bot>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ModuleSnapshot>>, ApiError> {
    Ok(Json(bot.modules(&name)?))
}

struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use roastbot_core::OutboundSender;
    use roastbot_core::platforms::ChatTransport;
    use std::time::Duration;
    use tower::ServiceExt;

    struct NullTransport;

    #[async_trait]
    impl ChatTransport for NullTransport {
        async fn join_channel(&self, _channel: &str) -> Result<(), Error> {
            Ok(())
        }
        async fn send_message(&self, _channel: &str, _text: &str) -> Result<(), Error> {
            Ok(())
        }
        async fn disconnect(&self) -> Result<(), Error> {
            Ok(())
        }
    }

    fn test_bot() -> Arc<Bot> {
        let (sender, _worker) = OutboundSender::spawn(Arc::new(NullTransport), Duration::ZERO);
        let bot = Arc::new(Bot::new("roastbot", "roastedb", sender));
        bot.bootstrap_channel("xqc").unwrap();
        bot.bootstrap_channel("forsen").unwrap();
        bot
    }

    async fn get_json(bot: Arc<Bot>, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(bot)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_list_channels_sorted() {
        let (status, body) = get_json(test_bot(), "/channels").await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["forsen", "xqc"]);
        assert!(body[0]["joined_at"].is_string());
    }

    #[tokio::test]
    async fn test_list_modules_reflects_toggles() {
        let bot = test_bot();
        bot.disable_command("forsen", "default", "uptime").unwrap();

        let (status, body) = get_json(bot, "/channels/forsen/modules").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "default");
        assert_eq!(body[0]["commands"][1]["name"], "uptime");
        assert_eq!(body[0]["commands"][1]["enabled"], false);
        assert_eq!(body[0]["commands"][1]["cooldown_seconds"], 5);
        assert_eq!(body[1]["name"], "admin");
    }

    #[tokio::test]
    async fn test_unknown_channel_is_404() {
        let (status, body) = get_json(test_bot(), "/channels/nowhere/modules").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "channel 'nowhere' is not configured");
    }

    #[tokio::test]
    async fn test_cors_header_present() {
        let response = router(test_bot())
            .oneshot(
                Request::get("/channels")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
