//! HTTP route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use specflow_core::{
    ApplyError, ApplyFailure, ApplyRequest, CloudInventory, DiscoveryError, DiscoveryRequest,
    ErrorCategory, VersionControl,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::state::AppState;

/// Headers set on every response, including errors and rejections.
const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=63072000; includeSubDomains"),
];

/// Build the full service router.
pub fn router<V, C>(state: AppState<V, C>) -> Router
where
    V: VersionControl + 'static,
    C: CloudInventory + 'static,
{
    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http());
    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }
    router.with_state(state)
}

fn api_router<V, C>() -> Router<AppState<V, C>>
where
    V: VersionControl + 'static,
    C: CloudInventory + 'static,
{
    Router::new()
        .route("/apply", post(apply::<V, C>))
        .route("/discover", get(discover::<V, C>))
}

async fn health() -> &'static str {
    "ok"
}

fn status_for(category: ErrorCategory) -> StatusCode {
    StatusCode::from_u16(category.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn failure_response(failure: ApplyFailure) -> Response {
    (status_for(failure.error_category), Json(failure)).into_response()
}

/// POST /api/apply - open a pull request for a spec change.
async fn apply<V, C>(
    State(state): State<AppState<V, C>>,
    body: Result<Json<ApplyRequest>, JsonRejection>,
) -> Response
where
    V: VersionControl + 'static,
    C: CloudInventory + 'static,
{
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = ApplyError::InvalidRequest {
                field: "body",
                reason: rejection.body_text(),
            };
            return failure_response(err.to_failure());
        }
    };

    match state.applier.apply(&request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => failure_response(e.to_failure()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverParams {
    pub categories: Option<String>,
    pub parent_filter: Option<String>,
}

/// Discovery request errors carry no pipeline stage.
#[derive(Debug, Serialize)]
struct DiscoveryFailure {
    error_category: ErrorCategory,
    detail: String,
    hint: &'static str,
}

impl From<&DiscoveryError> for DiscoveryFailure {
    fn from(err: &DiscoveryError) -> Self {
        let hint = match err {
            DiscoveryError::UnknownCategory(_) => {
                "Use vpcs, subnets, load_balancers, firewall_policy_sets or all."
            }
            DiscoveryError::BlankParentFilter => "Omit parent_filter or pass a VPC id.",
        };
        Self {
            error_category: err.category(),
            detail: err.to_string(),
            hint,
        }
    }
}

/// GET /api/discover?categories=a,b&parent_filter=vpc-1
async fn discover<V, C>(
    State(state): State<AppState<V, C>>,
    Query(params): Query<DiscoverParams>,
) -> Response
where
    V: VersionControl + 'static,
    C: CloudInventory + 'static,
{
    let request =
        match DiscoveryRequest::parse(params.categories.as_deref(), params.parent_filter.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "rejected discovery request");
                let failure = DiscoveryFailure::from(&e);
                return (status_for(failure.error_category), Json(failure)).into_response();
            }
        };

    Json(state.discovery.discover(&request).await).into_response()
}
