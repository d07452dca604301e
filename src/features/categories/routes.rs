use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
///
/// Note: These routes are public (no authentication required)
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/{slug}", get(handlers::get_category))
        .with_state(service)
}

/// Create admin routes for category management (admin, default selection super admin only)
pub fn admin_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/admin/categories", post(handlers::create_category))
        // Static segments must be registered alongside the {id} route
        .route(
            "/api/admin/categories/rows",
            get(handlers::list_category_rows),
        )
        .route(
            "/api/admin/categories/options",
            get(handlers::list_category_options),
        )
        .route(
            "/api/admin/categories/{id}",
            get(handlers::get_category_by_id)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/api/admin/categories/{id}/default",
            put(handlers::set_default_category),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        lazy_pool, with_admin_auth, with_reader_auth, with_super_admin_auth,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use fake::{faker::lorem::en::Word, Fake};
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn admin_server(wrap: fn(Router) -> Router) -> TestServer {
        let service = Arc::new(CategoryService::new(lazy_pool()));
        TestServer::new(wrap(admin_routes(service))).unwrap()
    }

    #[tokio::test]
    async fn test_admin_routes_require_authentication() {
        let server = admin_server(|router| router);

        let response = server.get("/api/admin/categories/rows").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_reader_cannot_manage_categories() {
        let server = admin_server(with_reader_auth);

        server
            .post("/api/admin/categories")
            .json(&json!({ "name": "Teknoloji" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format!("/api/admin/categories/{}", Uuid::now_v7()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_cannot_change_default_category() {
        let server = admin_server(with_admin_auth);

        server
            .put(&format!("/api/admin/categories/{}/default", Uuid::now_v7()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_expanded_list_is_bad_request() {
        let server = admin_server(with_admin_auth);
        let word: String = Word().fake();

        let response = server
            .get("/api/admin/categories/rows")
            .add_query_param("expanded", format!("{},{}", Uuid::now_v7(), word))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("expanded"));
    }

    #[tokio::test]
    async fn test_malformed_selected_list_is_bad_request() {
        let server = admin_server(with_super_admin_auth);

        server
            .get("/api/admin/categories/options")
            .add_query_param("selected", "not-a-uuid")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payloads() {
        let server = admin_server(with_admin_auth);

        server
            .post("/api/admin/categories")
            .json(&json!({ "name": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/admin/categories")
            .json(&json!({ "name": "Web Tasarım", "slug": "Web Tasarım" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_slug() {
        let server = admin_server(with_admin_auth);

        server
            .put(&format!("/api/admin/categories/{}", Uuid::now_v7()))
            .json(&json!({ "slug": "--" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
