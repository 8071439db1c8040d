use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::account::account_router;
use super::admin::admin_router;
use super::billing::billing_router;
use super::content::content_router;
use super::domain::domain_router;
use super::public::public_router;
use crate::billing::Billing;
use crate::lifecycle::Lifecycle;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub data_dir: PathBuf,
    /// Parent domain of school subdomains, e.g. `schoolhub.site`.
    pub public_host_suffix: String,
    /// `None` when no payment provider keys are configured.
    pub billing: Option<Billing>,
    pub lifecycle: Lifecycle,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1/public", public_router())
        .nest("/api/v1/billing", billing_router())
        .nest(
            "/api/v1",
            account_router()
                .merge(content_router())
                .merge(domain_router()),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::LifecycleConfig;
    use crate::store::test_support;

    fn router() -> (tempfile::TempDir, Router) {
        let (dir, store) = test_support::store_with_school();
        let store: Arc<dyn Store> = Arc::new(store);
        let lifecycle = Lifecycle::new(
            store.clone(),
            LifecycleConfig::immediate(),
            "schoolhub.site".to_string(),
        );
        let state = Arc::new(AppState {
            store,
            data_dir: dir.path().to_path_buf(),
            public_host_suffix: "schoolhub.site".to_string(),
            billing: None,
            lifecycle,
        });
        (dir, create_router(state))
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = router();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_bearer() {
        let (_dir, app) = router();
        let response = app
            .oneshot(Request::get("/api/v1/notices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));
    }

    #[tokio::test]
    async fn test_plans_are_public() {
        let (_dir, app) = router();
        let response = app
            .oneshot(
                Request::get("/api/v1/billing/plans")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_public_site_is_not_found() {
        let (_dir, app) = router();
        let response = app
            .oneshot(
                Request::get("/api/v1/public/sites/nowhere.schoolhub.site")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
