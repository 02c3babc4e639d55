//! API routes

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;

use crate::extractors::AppState;
use crate::handlers::{audit, auth, dashboard, leaves, summaries, tasks, users, work_logs};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_router())
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/auth", auth_router())
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::me))
        .route("/dashboard", get(dashboard::show))
        .nest("/tasks", tasks_router())
        .route("/work-logs", get(work_logs::list).post(work_logs::submit))
        .nest("/leaves", leaves_router())
        .route("/summaries/daily", post(summaries::daily))
        .route("/summaries/task-review", post(summaries::task_review))
        .route("/audit-events", get(audit::list))
}

fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/first-login", post(auth::first_login))
        .route("/logout", post(auth::logout))
}

fn tasks_router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/:id", get(tasks::get_task).delete(tasks::delete_task))
        .route("/:id/tree", get(tasks::task_tree))
        .route("/:id/status", patch(tasks::update_status))
}

fn leaves_router() -> Router<AppState> {
    Router::new()
        .route("/", get(leaves::list).post(leaves::apply))
        .route("/balance", get(leaves::balance))
        .route("/:id/decision", post(leaves::decide))
}

async fn api_root() -> Json<ApiRoot> {
    Json(ApiRoot {
        type_name: "Root",
        instance_name: "NC Ops",
        core_version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ApiRoot {
    #[serde(rename = "_type")]
    type_name: &'static str,
    #[serde(rename = "instanceName")]
    instance_name: &'static str,
    #[serde(rename = "coreVersion")]
    core_version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_json, TestApp};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_api_root() {
        let app = TestApp::new().await;
        let response = app.get("/api/v1", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["_type"], "Root");
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let app = TestApp::new().await;
        let response = app.get("/api/v1/tasks", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["_type"], "Error");
        assert_eq!(body["errorIdentifier"], "urn:ncops:api:v1:errors:Unauthenticated");

        let response = app.get("/api/v1/tasks", Some("not-a-session")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_token() {
        let app = TestApp::new().await;
        let response = app
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "asha_rao@example.org", "password": crate::testing::PASSWORD})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("ncops_session="));
        assert!(cookie.contains("HttpOnly"));

        let body = body_json(response).await;
        assert_eq!(body["user"]["role"], "nc");
        assert!(body["user"].get("password_hash").is_none());
        assert_eq!(body["expires_in"], 1800);

        let token = body["token"].as_str().unwrap();
        let me = app.get("/api/v1/users/me", Some(token)).await;
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(body_json(me).await["email"], "asha_rao@example.org");
    }

    #[tokio::test]
    async fn test_login_failure_is_generic() {
        let app = TestApp::new().await;
        let response = app
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "asha_rao@example.org", "password": "nope"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let app = TestApp::new().await;
        let token = app.login("ravi_kumar@example.org").await;

        let response = app.send("POST", "/api/v1/auth/logout", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.get("/api/v1/users/me", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_management_cannot_list_users() {
        let app = TestApp::new().await;
        let worker = app.login("ravi_kumar@example.org").await;
        let response = app.get("/api/v1/users", Some(&worker)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let nc = app.login("asha_rao@example.org").await;
        let response = app.get("/api/v1/users?role=management", Some(&nc)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let app = TestApp::new().await;
        let nc = app.login("asha_rao@example.org").await;
        let worker = app.login("ravi_kumar@example.org").await;
        let worker_id = app.user_id("ravi_kumar@example.org").await;

        let response = app
            .send(
                "POST",
                "/api/v1/tasks",
                Some(&nc),
                Some(json!({"title": "School census", "assignee_id": worker_id})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let parent_id = body_json(response).await["value"]["id"].as_i64().unwrap();

        let response = app
            .send(
                "POST",
                "/api/v1/tasks",
                Some(&worker),
                Some(json!({"title": "Visit block A", "parent_id": parent_id})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let child_id = body_json(response).await["value"]["id"].as_i64().unwrap();

        let response = app
            .send(
                "PATCH",
                &format!("/api/v1/tasks/{child_id}/status"),
                Some(&worker),
                Some(json!({"status": "Completed"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .send(
                "PATCH",
                &format!("/api/v1/tasks/{child_id}/status"),
                Some(&nc),
                Some(json!({"status": "Completed"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["value"]["rolled_up"][0]["id"], parent_id);

        let tree = app.get(&format!("/api/v1/tasks/{parent_id}/tree"), Some(&worker)).await;
        assert_eq!(tree.status(), StatusCode::OK);
        assert_eq!(body_json(tree).await["children"][0]["status"], "Completed");

        let response = app
            .send("DELETE", &format!("/api/v1/tasks/{parent_id}"), Some(&worker), None)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .send("DELETE", &format!("/api/v1/tasks/{parent_id}"), Some(&nc), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["value"].as_array().unwrap().len(), 2);

        let response = app.get(&format!("/api/v1/tasks/{child_id}"), Some(&nc)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_management_self_assignment_only() {
        let app = TestApp::new().await;
        let worker = app.login("ravi_kumar@example.org").await;
        let nc_id = app.user_id("asha_rao@example.org").await;

        let response = app
            .send(
                "POST",
                "/api/v1/tasks",
                Some(&worker),
                Some(json!({"title": "Delegate", "assignee_id": nc_id})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(
            body["errorIdentifier"],
            "urn:ncops:api:v1:errors:PropertyConstraintViolation"
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = TestApp::new().await;
        let nc = app.login("asha_rao@example.org").await;
        let response = app
            .send("POST", "/api/v1/tasks", Some(&nc), Some(json!({"assignee_id": "x"})))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["_type"], "Error");
    }

    #[tokio::test]
    async fn test_work_log_and_leave_flow() {
        let app = TestApp::new().await;
        let nc = app.login("asha_rao@example.org").await;
        let worker = app.login("ravi_kumar@example.org").await;

        let response = app
            .send(
                "POST",
                "/api/v1/leaves",
                Some(&worker),
                Some(json!({
                    "leave_type": "sick",
                    "start_date": "2024-05-06",
                    "end_date": "2024-05-07",
                    "reason": "fever"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let leave_id = body_json(response).await["value"]["id"].as_i64().unwrap();

        let response = app
            .send(
                "POST",
                &format!("/api/v1/leaves/{leave_id}/decision"),
                Some(&nc),
                Some(json!({"status": "Approved"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .send(
                "POST",
                "/api/v1/work-logs",
                Some(&worker),
                Some(json!({"date": "2024-05-06", "detail": "Worked from home"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .send(
                "POST",
                "/api/v1/work-logs",
                Some(&worker),
                Some(json!({"date": "2024-05-03", "detail": "Cluster meeting"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.get("/api/v1/leaves/balance", Some(&worker)).await;
        let balances = body_json(response).await;
        let sick = balances
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["leave_type"] == "sick")
            .unwrap()
            .clone();
        assert_eq!(sick["used"], 2);

        let response = app.get("/api/v1/work-logs?date=2024-05-03", Some(&nc)).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app.get("/api/v1/audit-events?entity_kind=leave_request", Some(&nc)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summaries() {
        let app = TestApp::new().await;
        let nc = app.login("asha_rao@example.org").await;
        let worker = app.login("ravi_kumar@example.org").await;

        let response = app.send("POST", "/api/v1/summaries/daily", Some(&nc), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["warnings"][0], "No logs");

        app.send(
            "POST",
            "/api/v1/work-logs",
            Some(&worker),
            Some(json!({"detail": "Trained 12 teachers"})),
        )
        .await;
        let response = app
            .send("POST", "/api/v1/summaries/daily?date=2024-05-06", Some(&nc), None)
            .await;
        let body = body_json(response).await;
        assert_eq!(body["value"].as_array().unwrap().len(), 1);

        let response = app.send("POST", "/api/v1/summaries/task-review", Some(&worker), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_dashboard_by_role() {
        let app = TestApp::new().await;
        let worker = app.login("ravi_kumar@example.org").await;
        let response = app.get("/api/v1/dashboard", Some(&worker)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["role"], "management");
        assert_eq!(body["leave_balances"].as_array().unwrap().len(), 3);
    }
}
