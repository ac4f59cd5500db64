//! HTTP API for bmr-server
//!
//! Every handler answers with the `{success, message, error, data}` envelope.
//! Public routes (registration, OTP, login, lookups, the gateway webhook and
//! the verified-user directory) are merged next to routers guarded by
//! [`user_auth_middleware`].

pub mod auth;
pub mod health;
pub mod lookups;
pub mod memberships;
pub mod staff;
pub mod users;
pub mod views;
pub mod webhook;

use axum::Router;
use axum::routing::get;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&page_size=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// 1-based page number
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset; saturates instead of overflowing on huge page numbers
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router(&state))
        .merge(users::router(&state))
        .merge(memberships::router(&state))
        .merge(staff::router(&state))
        .merge(lookups::router())
        .merge(webhook::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn page_query_clamps() {
        let q = PageQuery {
            page: Some(0),
            page_size: Some(1_000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), MAX_PAGE_SIZE);

        let q = PageQuery {
            page: Some(3),
            page_size: Some(0),
        };
        assert_eq!(q.page_size(), 1);
        assert_eq!(q.offset(), 2);
    }

    #[test]
    fn huge_page_number_saturates() {
        let q = PageQuery {
            page: Some(i64::MAX),
            page_size: Some(MAX_PAGE_SIZE),
        };
        assert_eq!(q.offset(), i64::MAX);
        assert!(q.offset() >= 0);
    }

    #[test]
    fn page_query_offset() {
        let q = PageQuery {
            page: Some(4),
            page_size: Some(25),
        };
        assert_eq!(q.offset(), 75);
    }

    mod routes {
        use axum::body::{Body, to_bytes};
        use axum::http::{Request, StatusCode, header};
        use tower::ServiceExt;

        use crate::state::testing;

        async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let app = super::create_router(testing::state());
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, body)
        }

        #[tokio::test]
        async fn health_is_public() {
            let request = Request::get("/health").body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
        }

        #[tokio::test]
        async fn profile_requires_token() {
            let request = Request::get("/users/me").body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["success"], false);
        }

        #[tokio::test]
        async fn staff_routes_require_token() {
            let request = Request::post("/memberships/staff/annual-payments")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let (status, _) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn garbage_bearer_token_is_rejected() {
            let request = Request::get("/memberships/my-membership")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn malformed_webhook_is_bad_request() {
            let request = Request::post("/memberships/payments/webhooks/hitpay")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Invalid webhook payload.");
        }
    }
}
