// ABOUTME: Integration tests for API endpoints
// ABOUTME: Tests complete request/response flows, session cookies, and role-based error codes

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::entities::Role;
    use crate::session::SESSION_COOKIE_NAME;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use axum_extra::extract::cookie::Cookie;
    use serde_json::{json, Value};
    use serial_test::serial;
    use tempfile::TempDir;
    use uuid::Uuid;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    async fn create_test_app() -> (TestServer, AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig {
            database_url: format!(
                "sqlite:{}?mode=rwc",
                temp_dir.path().join("test.db").display()
            ),
            blob_dir: temp_dir.path().join("proofs"),
            public_base_url: "http://test.local".to_string(),
            ..AppConfig::default()
        };

        let state = AppState::from_config(config).await.unwrap();
        let server = TestServer::new(build_router(state.clone())).unwrap();
        (server, state, temp_dir)
    }

    async fn register(server: &TestServer, name: &str) -> (Uuid, Cookie<'static>) {
        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": name,
                "email": format!("{}@example.com", name),
                "password": "rahasia123",
                "confirm_password": "rahasia123"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        let user_id = Uuid::parse_str(body["user_id"].as_str().unwrap()).unwrap();
        (user_id, response.cookie(SESSION_COOKIE_NAME))
    }

    async fn register_with_role(
        server: &TestServer,
        state: &AppState,
        name: &str,
        role: Role,
    ) -> (Uuid, Cookie<'static>) {
        let (user_id, cookie) = register(server, name).await;
        state.storage.set_role(user_id, role).await.unwrap();
        (user_id, cookie)
    }

    fn order_form(price: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("package_name", "Pelajar Basic")
            .add_text("package_price", price)
            .add_text("domain_name", "sekolahku.com")
            .add_part(
                "payment_proof",
                Part::bytes(PNG.to_vec())
                    .file_name("bukti.png")
                    .mime_type("image/png"),
            )
    }

    #[tokio::test]
    #[serial]
    async fn test_public_endpoints() {
        let (server, _state, _dir) = create_test_app().await;

        let health = server.get("/health").await;
        health.assert_status_ok();
        assert_eq!(health.json::<Value>()["status"], "ok");

        let packages = server.get("/packages").await;
        packages.assert_status_ok();
        let packages: Value = packages.json();
        assert_eq!(packages.as_array().unwrap().len(), 8);
        assert_eq!(packages[1]["name"], "Pelajar Basic");
        assert_eq!(packages[1]["price"], 15000);
    }

    #[tokio::test]
    #[serial]
    async fn test_security_headers_present() {
        let (server, _state, _dir) = create_test_app().await;

        let response = server.get("/health").await;
        assert_eq!(response.header("x-frame-options"), "DENY");
        assert_eq!(response.header("x-content-type-options"), "nosniff");
    }

    #[tokio::test]
    #[serial]
    async fn test_protected_endpoints_require_session() {
        let (server, _state, _dir) = create_test_app().await;

        for path in [
            "/auth/me",
            "/orders",
            "/dashboard",
            "/tickets",
            "/admin/orders",
            "/admin/users",
            "/admin/dashboard",
            "/admin/analytics",
        ] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let body: Value = response.json();
            assert_eq!(body["error"], "not_authenticated", "path {}", path);
        }

        let submit = server.post("/orders").multipart(order_form("15000")).await;
        submit.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn test_user_cannot_reach_admin_endpoints() {
        let (server, _state, _dir) = create_test_app().await;
        let (_, cookie) = register(&server, "siswa").await;
        let target = Uuid::new_v4();

        for path in ["/admin/orders", "/admin/users", "/admin/tickets", "/admin/dashboard"] {
            server
                .get(path)
                .add_cookie(cookie.clone())
                .await
                .assert_status(StatusCode::FORBIDDEN);
        }

        let block = server
            .post(&format!("/admin/users/{}/block", target))
            .add_cookie(cookie.clone())
            .json(&json!({ "blocked": true }))
            .await;
        block.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(block.json::<Value>()["error"], "forbidden");

        server
            .post(&format!("/admin/orders/{}/status", target))
            .add_cookie(cookie)
            .json(&json!({ "status": "active" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn test_register_validation() {
        let (server, _state, _dir) = create_test_app().await;

        let mismatch = server
            .post("/auth/register")
            .json(&json!({
                "username": "siswa",
                "email": "siswa@example.com",
                "password": "rahasia123",
                "confirm_password": "rahasia124"
            }))
            .await;
        mismatch.assert_status(StatusCode::BAD_REQUEST);

        let short = server
            .post("/auth/register")
            .json(&json!({
                "username": "siswa",
                "email": "siswa@example.com",
                "password": "123",
                "confirm_password": "123"
            }))
            .await;
        short.assert_status(StatusCode::BAD_REQUEST);

        register(&server, "siswa").await;
        let duplicate = server
            .post("/auth/register")
            .json(&json!({
                "username": "siswa",
                "email": "siswa@example.com",
                "password": "rahasia123",
                "confirm_password": "rahasia123"
            }))
            .await;
        duplicate.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    #[serial]
    async fn test_login_logout_and_me() {
        let (server, _state, _dir) = create_test_app().await;
        register(&server, "siswa").await;

        let bad = server
            .post("/auth/login")
            .json(&json!({ "email": "siswa@example.com", "password": "salah123" }))
            .await;
        bad.assert_status(StatusCode::UNAUTHORIZED);

        let login = server
            .post("/auth/login")
            .json(&json!({ "email": "siswa@example.com", "password": "rahasia123" }))
            .await;
        login.assert_status_ok();
        let cookie = login.cookie(SESSION_COOKIE_NAME);

        let me = server.get("/auth/me").add_cookie(cookie.clone()).await;
        me.assert_status_ok();
        let me: Value = me.json();
        assert_eq!(me["username"], "siswa");
        assert_eq!(me["role"], "user");
        let capabilities = me["capabilities"].as_array().unwrap();
        assert!(capabilities.contains(&json!("create-order")));
        assert!(!capabilities.contains(&json!("view-all-orders")));

        server
            .post("/auth/logout")
            .add_cookie(cookie.clone())
            .await
            .assert_status_ok();
        server
            .get("/auth/me")
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn test_permission_check() {
        let (server, _state, _dir) = create_test_app().await;
        let (_, cookie) = register(&server, "siswa").await;

        let allowed = server
            .get("/auth/permissions/create-order")
            .add_cookie(cookie.clone())
            .await;
        allowed.assert_status_ok();
        assert_eq!(allowed.json::<Value>()["allowed"], true);

        let denied = server
            .get("/auth/permissions/view-analytics")
            .add_cookie(cookie.clone())
            .await;
        assert_eq!(denied.json::<Value>()["allowed"], false);

        server
            .get("/auth/permissions/launch-rockets")
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn test_order_submission_and_review_flow() {
        let (server, state, _dir) = create_test_app().await;
        let (_, user_cookie) = register(&server, "siswa").await;
        let (_, admin_cookie) = register_with_role(&server, &state, "admin", Role::Admin).await;

        let wrong_price = server
            .post("/orders")
            .add_cookie(user_cookie.clone())
            .multipart(order_form("1000"))
            .await;
        wrong_price.assert_status(StatusCode::BAD_REQUEST);

        let submitted = server
            .post("/orders")
            .add_cookie(user_cookie.clone())
            .multipart(order_form("15000"))
            .await;
        submitted.assert_status(StatusCode::CREATED);
        let order: Value = submitted.json();
        assert_eq!(order["status"], "pending");
        assert_eq!(order["package_price"], 15000);
        let order_id = order["id"].as_str().unwrap().to_string();
        let proof = order["payment_proof"].as_str().unwrap().to_string();

        let all: Value = server
            .get("/admin/orders")
            .add_cookie(admin_cookie.clone())
            .await
            .json();
        assert_eq!(all.as_array().unwrap().len(), 1);
        assert_eq!(all[0]["username"], "siswa");
        assert_eq!(all[0]["email"], "siswa@example.com");

        let url: Value = server
            .get(&format!("/admin/orders/{}/payment-proof", order_id))
            .add_cookie(admin_cookie.clone())
            .await
            .json();
        assert_eq!(
            url["url"],
            format!("http://test.local/payment-proofs/{}", proof)
        );

        let image = server
            .get(&format!("/payment-proofs/{}", proof))
            .add_cookie(user_cookie.clone())
            .await;
        image.assert_status_ok();
        assert_eq!(image.header("content-type"), "image/png");
        assert_eq!(image.as_bytes().as_ref(), PNG);

        let approved = server
            .post(&format!("/admin/orders/{}/status", order_id))
            .add_cookie(admin_cookie.clone())
            .json(&json!({ "status": "active" }))
            .await;
        approved.assert_status_ok();
        assert_eq!(approved.json::<Value>()["status"], "active");

        let conflict = server
            .post(&format!("/admin/orders/{}/status", order_id))
            .add_cookie(admin_cookie)
            .json(&json!({ "status": "rejected" }))
            .await;
        conflict.assert_status(StatusCode::CONFLICT);
        assert_eq!(conflict.json::<Value>()["error"], "invalid_transition");

        let mine: Value = server
            .get("/orders")
            .add_cookie(user_cookie.clone())
            .await
            .json();
        assert_eq!(mine[0]["status"], "active");

        let dashboard: Value = server
            .get("/dashboard")
            .add_cookie(user_cookie)
            .await
            .json();
        assert_eq!(dashboard["total"], 1);
        assert_eq!(dashboard["active"], 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_ticket_flow() {
        let (server, state, _dir) = create_test_app().await;
        let (_, user_cookie) = register(&server, "siswa").await;
        let (_, admin_cookie) = register_with_role(&server, &state, "admin", Role::Admin).await;

        let created = server
            .post("/tickets")
            .add_cookie(user_cookie.clone())
            .json(&json!({ "subject": "Domain", "message": "Belum aktif" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let ticket_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

        let replied = server
            .post(&format!("/admin/tickets/{}/reply", ticket_id))
            .add_cookie(admin_cookie.clone())
            .json(&json!({ "reply": "Sudah kami aktifkan" }))
            .await;
        replied.assert_status_ok();
        let replied: Value = replied.json();
        assert_eq!(replied["admin_reply"], "Sudah kami aktifkan");
        assert_eq!(replied["status"], "open");

        for _ in 0..2 {
            let closed = server
                .post(&format!("/admin/tickets/{}/close", ticket_id))
                .add_cookie(admin_cookie.clone())
                .await;
            closed.assert_status_ok();
            assert_eq!(closed.json::<Value>()["status"], "closed");
        }

        let mine: Value = server
            .get("/tickets")
            .add_cookie(user_cookie)
            .await
            .json();
        assert_eq!(mine[0]["status"], "closed");

        let malformed = server
            .post("/admin/tickets/not-a-uuid/close")
            .add_cookie(admin_cookie)
            .await;
        malformed.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = malformed.json();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "Invalid ticket id");
    }

    #[tokio::test]
    #[serial]
    async fn test_super_admin_user_management() {
        let (server, state, _dir) = create_test_app().await;
        let (user_id, user_cookie) = register(&server, "siswa").await;
        let (_, admin_cookie) = register_with_role(&server, &state, "admin", Role::Admin).await;
        let (root_id, root_cookie) =
            register_with_role(&server, &state, "root", Role::SuperAdmin).await;

        let users: Value = server
            .get("/admin/users")
            .add_cookie(admin_cookie.clone())
            .await
            .json();
        assert_eq!(users.as_array().unwrap().len(), 3);

        server
            .get("/admin/analytics")
            .add_cookie(admin_cookie)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        let analytics = server
            .get("/admin/analytics")
            .add_cookie(root_cookie.clone())
            .await;
        analytics.assert_status_ok();
        assert_eq!(analytics.json::<Value>()["monthly"].as_array().unwrap().len(), 6);

        let blocked = server
            .post(&format!("/admin/users/{}/block", user_id))
            .add_cookie(root_cookie.clone())
            .json(&json!({ "blocked": true }))
            .await;
        blocked.assert_status_ok();
        assert_eq!(blocked.json::<Value>()["blocked"], true);

        // The live session now sees the block on mutating calls.
        server
            .post("/tickets")
            .add_cookie(user_cookie)
            .json(&json!({ "subject": "Halo", "message": "Tolong" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post("/auth/login")
            .json(&json!({ "email": "siswa@example.com", "password": "rahasia123" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let promoted = server
            .post(&format!("/admin/users/{}/promote", user_id))
            .add_cookie(root_cookie.clone())
            .await;
        promoted.assert_status_ok();
        assert_eq!(promoted.json::<Value>()["role"], "admin");

        server
            .delete(&format!("/admin/users/{}", root_id))
            .add_cookie(root_cookie.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format!("/admin/users/{}", user_id))
            .add_cookie(root_cookie.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/admin/users/{}", user_id))
            .add_cookie(root_cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
