//! HTTP ingest API.
//!
//! Routes:
//! - `POST /guilds`, `/members`, `/errors`, `/events`, `/commands` - record reports
//! - `GET /latest` - snapshot of the metrics cache
//! - `GET /health` - liveness
//! - `GET /metrics` - Prometheus exposition of the service's own metrics
//!
//! Everything except `/health` and `/metrics` sits behind the shared-secret
//! check, which runs as a route layer before any body is extracted.

use crate::error::{ApiError, ApiResult, MessageBody};
use crate::handlers::{
    self, CommandUsage, CommandUsageValidator, CountReport, ErrorReport, EventReport,
};
use crate::state::{CacheSnapshot, MetricsCache};
use crate::telemetry::{RequestTimer, spans};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    cache: Arc<MetricsCache>,
    validator: CommandUsageValidator,
    token: Arc<str>,
}

impl AppState {
    pub fn new(cache: Arc<MetricsCache>, validator: CommandUsageValidator, token: &str) -> Self {
        Self {
            cache,
            validator,
            token: Arc::from(token),
        }
    }

    /// Byte-for-byte comparison of a presented token, in constant time.
    fn is_authorized(&self, presented: Option<&[u8]>) -> bool {
        presented.is_some_and(|bytes| bool::from(bytes.ct_eq(self.token.as_bytes())))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/guilds", post(guilds))
        .route("/members", post(members))
        .route("/errors", post(errors))
        .route("/events", post(events))
        .route("/commands", post(commands))
        .route("/latest", get(latest))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(protected)
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serve `app` on `listener` until Ctrl-C.
pub async fn run_http_server(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Ingest HTTP server listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.as_bytes());
    if !state.is_authorized(presented) {
        let path = request.uri().path().to_string();
        warn!(path = %path, "Unauthorized ingest request");
        crate::metrics::record_request(&path, "unauthorized");
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

/// Time, trace and count one report, mapping its outcome to a response.
fn respond<F>(route: &'static str, handle: F) -> ApiResult<Json<MessageBody>>
where
    F: FnOnce() -> ApiResult<String>,
{
    let _timer = RequestTimer::new(route);
    let _span = spans::request(route).entered();
    match handle() {
        Ok(message) => {
            crate::metrics::record_request(route, "ok");
            debug!(message = %message, "Report recorded");
            Ok(Json(MessageBody::new(message)))
        }
        Err(e) => {
            crate::metrics::record_request(route, "rejected");
            crate::metrics::record_rejection(route, e.error_code());
            debug!(reason = e.error_code(), error = %e, "Report rejected");
            Err(e)
        }
    }
}

fn body<T>(extracted: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    extracted
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))
}

async fn guilds(
    State(state): State<AppState>,
    report: Result<Json<CountReport>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    respond("/guilds", || handlers::record_guilds(&state.cache, &body(report)?))
}

async fn members(
    State(state): State<AppState>,
    report: Result<Json<CountReport>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    respond("/members", || handlers::record_members(&state.cache, &body(report)?))
}

async fn errors(
    State(state): State<AppState>,
    report: Result<Json<ErrorReport>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    respond("/errors", || handlers::record_error(&state.cache, &body(report)?))
}

async fn events(
    State(state): State<AppState>,
    report: Result<Json<EventReport>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    respond("/events", || handlers::record_event(&state.cache, &body(report)?))
}

async fn commands(
    State(state): State<AppState>,
    usage: Result<Json<CommandUsage>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    respond("/commands", || {
        let message = handlers::record_command(&state.validator, &body(usage)?)?;
        crate::metrics::record_command_use();
        Ok(message)
    })
}

async fn latest(State(state): State<AppState>) -> Json<CacheSnapshot> {
    Json(state.cache.snapshot())
}

async fn health() -> Json<MessageBody> {
    Json(MessageBody::new("OK"))
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::StatusCode;
    use tower::ServiceExt; // for `oneshot`

    const TOKEN: &str = "s3cret";

    fn app() -> Router {
        let schema = Arc::new(crate::schema::builtin().unwrap());
        let cache = Arc::new(MetricsCache::new(&schema, ["guildCreate", "messageCreate"]));
        let validator = CommandUsageValidator::new(schema, Arc::clone(&cache));
        router(AppState::new(cache, validator, TOKEN))
    }

    fn post_json(uri: &str, auth: Option<&str>, json: &str) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = auth {
            builder = builder.header(AUTHORIZATION, token);
        }
        builder.body(Body::from(json.to_string())).unwrap()
    }

    async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    async fn command(app: &Router, json: &str) -> (StatusCode, String) {
        let (status, body) = send(app, post_json("/commands", Some(TOKEN), json)).await;
        (status, body["message"].as_str().unwrap_or_default().to_string())
    }

    #[tokio::test]
    async fn leaf_command_counts_up() {
        let app = app();
        let (status, message) = command(&app, r#"{"command":"ping"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, "Current command count is 1 for ping");
        let (_, message) = command(&app, r#"{"command":"ping"}"#).await;
        assert_eq!(message, "Current command count is 2 for ping");
    }

    #[tokio::test]
    async fn subcommand_required() {
        let app = app();
        let (status, message) = command(&app, r#"{"command":"config"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "config requires a subcommand.");
    }

    #[tokio::test]
    async fn direct_subcommand_counts_up() {
        let app = app();
        let (status, message) =
            command(&app, r#"{"command":"config","subcommand":"set"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, "Current command count is 1 for config.set");
    }

    #[tokio::test]
    async fn group_on_command_without_groups() {
        let app = app();
        let (status, message) = command(
            &app,
            r#"{"command":"config","subcommandGroup":"roles","subcommand":"add"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("does not have subcommand groups"));
    }

    #[tokio::test]
    async fn unknown_subcommand_in_group_names_all_identifiers() {
        let app = app();
        let (status, message) = command(
            &app,
            r#"{"command":"manage","subcommandGroup":"roles","subcommand":"bogus"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "bogus is not a valid subcommand for manage.roles.");
    }

    #[tokio::test]
    async fn grouped_command_counts_up() {
        let app = app();
        let (status, message) = command(
            &app,
            r#"{"command":"manage","subcommandGroup":"roles","subcommand":"add"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, "Current command count is 1 for manage.roles.add");
    }

    #[tokio::test]
    async fn missing_auth_rejected_before_body() {
        let app = app();
        let (status, body) = send(&app, post_json("/commands", None, r#"{"command":"ping"}"#)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized.");

        // A body that would not even parse still gets 401
        let (status, _) = send(&app, post_json("/commands", None, "not json")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // And nothing was counted
        let (_, message) = command(&app, r#"{"command":"ping"}"#).await;
        assert_eq!(message, "Current command count is 1 for ping");
    }

    #[tokio::test]
    async fn wrong_token_rejected() {
        let app = app();
        for token in ["s3cre", "s3cret ", "S3CRET"] {
            let (status, _) =
                send(&app, post_json("/guilds", Some(token), r#"{"count":1}"#)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "token {token:?}");
        }
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = app();
        let (status, body) = send(&app, post_json("/commands", Some(TOKEN), "{")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));

        let (status, _) = send(
            &app,
            post_json("/commands", Some(TOKEN), r#"{"command":5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simple_counters() {
        let app = app();
        let (status, body) =
            send(&app, post_json("/guilds", Some(TOKEN), r#"{"count":12}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Current guild count is 12");

        let (_, body) = send(&app, post_json("/members", Some(TOKEN), r#"{}"#)).await;
        assert_eq!(body["message"], "No count provided.");

        let (_, body) =
            send(&app, post_json("/errors", Some(TOKEN), r#"{"handled":false}"#)).await;
        assert_eq!(
            body["message"],
            "Current error count is 0 handled and 1 unhandled"
        );

        let (status, body) =
            send(&app, post_json("/events", Some(TOKEN), r#"{"event":"nope"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "nope is not a valid event type.");
    }

    #[tokio::test]
    async fn latest_requires_auth_and_reflects_counts() {
        let app = app();
        command(&app, r#"{"command":"config","subcommand":"view"}"#).await;

        let unauthorized = axum::http::Request::builder()
            .uri("/latest")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = axum::http::Request::builder()
            .uri("/latest")
            .header(AUTHORIZATION, TOKEN)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["commands"]["config"]["view"], 1);
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app();
        let request = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "OK");
    }
}
