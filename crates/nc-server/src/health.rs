//! Health checks
//!
//! The database is the only hard dependency; email and the LLM are
//! reported so operators can see a half-configured deployment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nc_db::Database;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn new(name: &'static str, status: HealthStatus, message: impl Into<String>, started: Instant) -> Self {
        Self {
            name,
            status,
            message: Some(message.into()),
            response_time_ms: started.elapsed().as_millis() as u64,
            details: None,
        }
    }
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        if self.status.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Timeout for individual health checks
    pub check_timeout: Duration,
    /// Cache duration for health results
    pub cache_duration: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            cache_duration: Duration::from_secs(10),
        }
    }
}

struct CachedHealth {
    report: HealthReport,
    cached_at: Instant,
}

pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
    cache: RwLock<Option<CachedHealth>>,
    database: Option<Database>,
    email_enabled: bool,
    llm_configured: bool,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cache: RwLock::new(None),
            database: None,
            email_enabled: false,
            llm_configured: false,
        }
    }

    pub fn with_database(mut self, database: Option<Database>) -> Self {
        self.database = database;
        self
    }

    pub fn with_email(mut self, enabled: bool) -> Self {
        self.email_enabled = enabled;
        self
    }

    pub fn with_llm(mut self, configured: bool) -> Self {
        self.llm_configured = configured;
        self
    }

    /// Cached report, refreshed once the cache window has passed
    pub async fn check(&self) -> HealthReport {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.cached_at.elapsed() < self.config.cache_duration {
                    debug!("Returning cached health report");
                    return cached.report.clone();
                }
            }
        }

        let report = self.perform_checks().await;
        *self.cache.write().await = Some(CachedHealth {
            report: report.clone(),
            cached_at: Instant::now(),
        });
        report
    }

    async fn perform_checks(&self) -> HealthReport {
        let components = vec![
            self.check_database().await,
            self.check_email(),
            self.check_llm(),
        ];

        let status = if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if components.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }

    async fn check_database(&self) -> ComponentHealth {
        let started = Instant::now();
        let Some(db) = &self.database else {
            return ComponentHealth::new(
                "database",
                HealthStatus::Degraded,
                "No database, records live in memory",
                started,
            );
        };

        let mut health = match tokio::time::timeout(self.config.check_timeout, db.ping()).await {
            Ok(Ok(())) => ComponentHealth::new("database", HealthStatus::Healthy, "Connected", started),
            Ok(Err(e)) => {
                warn!(error = %e, "Database health check failed");
                ComponentHealth::new("database", HealthStatus::Unhealthy, e.to_string(), started)
            }
            Err(_) => ComponentHealth::new("database", HealthStatus::Unhealthy, "Timed out", started),
        };
        let stats = db.stats();
        health.details = Some(serde_json::json!({
            "type": "postgresql",
            "pool_size": stats.size,
            "idle_connections": stats.idle,
        }));
        health
    }

    fn check_email(&self) -> ComponentHealth {
        let started = Instant::now();
        if self.email_enabled {
            ComponentHealth::new("email", HealthStatus::Healthy, "Delivery enabled", started)
        } else {
            ComponentHealth::new("email", HealthStatus::Degraded, "Delivery disabled", started)
        }
    }

    fn check_llm(&self) -> ComponentHealth {
        let started = Instant::now();
        if self.llm_configured {
            ComponentHealth::new("llm", HealthStatus::Healthy, "API key configured", started)
        } else {
            ComponentHealth::new("llm", HealthStatus::Degraded, "No API key, summaries will fail", started)
        }
    }
}

/// Liveness probe
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness probe with the full report
pub async fn readiness(State(health): State<Arc<HealthChecker>>) -> (StatusCode, Json<HealthReport>) {
    let report = health.check().await;
    (report.http_status(), Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_without_database_is_degraded() {
        let checker = HealthChecker::new(HealthConfig::default()).with_email(true).with_llm(true);
        let report = checker.check().await;

        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.http_status(), StatusCode::OK);
        assert_eq!(report.components.len(), 3);
        assert_eq!(report.components[0].name, "database");
    }

    #[tokio::test]
    async fn test_health_cache() {
        let checker = HealthChecker::new(HealthConfig {
            cache_duration: Duration::from_secs(60),
            ..Default::default()
        });

        let first = checker.check().await;
        let second = checker.check().await;
        assert_eq!(first.timestamp, second.timestamp);
    }

    #[test]
    fn test_unhealthy_is_unavailable() {
        let report = HealthReport {
            status: HealthStatus::Unhealthy,
            version: "0.1.0".to_string(),
            uptime_seconds: 5,
            components: vec![],
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(report.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
