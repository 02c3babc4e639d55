//! In-memory application for router tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use nc_audit::AuditService;
use nc_auth::{hash_password, Authenticator, MemorySessionStore};
use nc_core::config::AppConfig;
use nc_core::types::Role;
use nc_db::{Stores, UserFilter};
use nc_models::User;
use nc_notifications::{Notifier, RecordingEmailSender};
use nc_services::{Clock, ServiceContext, Services};
use nc_summaries::llm::LlmResult;
use nc_summaries::LlmClient;
use serde_json::Value;
use tower::ServiceExt;

use crate::extractors::AppState;
use crate::routes::router;

pub const PASSWORD: &str = "field-work-2024";

struct StubLlm;

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(&self, _prompt: &str) -> LlmResult<String> {
        Ok("Steady progress; follow up on pending visits.".into())
    }
}

pub struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    /// Today is 2024-05-06; one coordinator and one management user
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.email.official_nc_email = Some("office@example.org".into());
        let config = Arc::new(config);

        let stores = Stores::memory();
        let audit = Arc::new(AuditService::new(stores.audit.clone()));
        let notifier = Notifier::new(Arc::new(RecordingEmailSender::new()), &config.email, audit.clone());
        let ctx = ServiceContext::new(stores, audit, notifier, config.clone())
            .with_clock(Clock::Fixed(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()));

        for (email, role) in [
            ("asha_rao@example.org", Role::Nc),
            ("ravi_kumar@example.org", Role::Management),
        ] {
            let mut user = User::new(email, "", role);
            user.password_hash = Some(hash_password(PASSWORD).unwrap());
            user.must_set_password = false;
            ctx.stores.users.create(&user).await.unwrap();
        }

        let services = Services::new(ctx, Arc::new(StubLlm));
        let authenticator = Authenticator::new(Arc::new(MemorySessionStore::new()), &config.auth);
        let state = AppState::new(services, authenticator, config);

        Self {
            router: router().with_state(state.clone()),
            state,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send("GET", uri, token, None).await
    }

    /// Session token for a seeded user
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({"email": email, "password": PASSWORD})),
            )
            .await;
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    pub async fn user_id(&self, email: &str) -> i64 {
        self.state
            .services
            .users
            .all(&UserFilter::default())
            .await
            .unwrap()
            .into_iter()
            .find(|u| u.email == email)
            .and_then(|u| u.id)
            .unwrap()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
