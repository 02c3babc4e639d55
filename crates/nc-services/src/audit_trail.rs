//! Read access to the audit trail

use nc_audit::{AuditEvent, AuditFilter};
use nc_auth::Permission;
use nc_core::result::NcResult;
use nc_models::User;

use crate::base::{require, ServiceContext};

#[derive(Clone)]
pub struct AuditTrailService {
    ctx: ServiceContext,
}

impl AuditTrailService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Newest first, capped by the filter's limit
    pub async fn list(&self, actor: &User, filter: &AuditFilter) -> NcResult<Vec<AuditEvent>> {
        require(actor, Permission::ViewAuditLog)?;
        Ok(self.ctx.audit.list(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use crate::UserService;
    use nc_audit::{AuditAction, EntityKind};

    #[tokio::test]
    async fn test_coordinators_read_the_trail() {
        let fx = Fixture::new().await;
        let users = UserService::new(fx.ctx.clone());
        users.login("ravi_kumar@example.org", "wrong").await.unwrap_err();
        users.login("ravi_kumar@example.org", crate::testing::PASSWORD).await.unwrap();

        let trail = AuditTrailService::new(fx.ctx.clone());
        let events = trail.list(&fx.nc, &AuditFilter::default()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::Login);

        let filter = AuditFilter {
            entity_kind: Some(EntityKind::Task),
            ..Default::default()
        };
        assert!(trail.list(&fx.nc, &filter).await.unwrap().is_empty());

        let err = trail.list(&fx.worker, &AuditFilter::default()).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
