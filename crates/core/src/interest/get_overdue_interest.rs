use crate::error::BillingError;
use crate::shared::{
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{
    interest::{days_overdue, overdue_interest},
    TenantScope, ID,
};
use billing_scheduler_infra::BillingContext;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Computes the interest owed on a document at `as_of`
#[derive(Debug)]
pub struct GetOverdueInterestUseCase {
    pub tenant: TenantScope,
    pub document_id: ID,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueInterest {
    pub document_id: ID,
    pub days_overdue: i64,
    pub outstanding: Decimal,
    /// Yearly rate in percent
    pub rate: Decimal,
    pub interest: Decimal,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("The document with id: {0}, was not found.")]
    NotFound(ID),
    #[error(transparent)]
    StorageError(#[from] CollaboratorError),
}

impl From<UseCaseError> for BillingError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(_) => Self::NotFound(e.to_string()),
            UseCaseError::StorageError(_) => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for GetOverdueInterestUseCase {
    type Response = OverdueInterest;

    type Errors = UseCaseError;

    const NAME: &'static str = "GetOverdueInterest";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let document = call(
            ctx,
            "find document",
            ctx.services.documents.find(&self.tenant, &self.document_id),
        )
        .await?
        .ok_or_else(|| UseCaseError::NotFound(self.document_id.clone()))?;

        let rate = self.interest_rate(ctx).await;
        let days = days_overdue(document.due_date, self.as_of);
        let outstanding = document.outstanding();

        Ok(OverdueInterest {
            document_id: document.id,
            days_overdue: days,
            outstanding,
            rate,
            interest: overdue_interest(outstanding, rate, days),
        })
    }
}

impl GetOverdueInterestUseCase {
    /// The tenant's own rate, or the configured default
    async fn interest_rate(&self, ctx: &BillingContext) -> Decimal {
        let tenants = match &ctx.services.tenants {
            Some(tenants) => tenants,
            None => return ctx.config.default_interest_rate,
        };
        match call(ctx, "get tenant", tenants.get(&self.tenant.tenant_id)).await {
            Ok(profile) => profile
                .settings
                .interest_rate
                .unwrap_or(ctx.config.default_interest_rate),
            Err(e) => {
                warn!(
                    "Using the default interest rate for tenant: {}. {}",
                    self.tenant.tenant_id, e
                );
                ctx.config.default_interest_rate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::{date, insert_invoice, setup, time, TestContext};
    use billing_scheduler_domain::{TenantProfile, TenantSettings};

    fn test_context() -> TestContext {
        let mut test = setup();
        test.ctx.config.default_interest_rate = Decimal::from(8);
        test
    }

    fn usecase(test: &TestContext, document_id: &ID, as_of: DateTime<Utc>) -> GetOverdueInterestUseCase {
        GetOverdueInterestUseCase {
            tenant: test.tenant.clone(),
            document_id: document_id.clone(),
            as_of,
        }
    }

    #[tokio::test]
    async fn uses_default_rate_and_truncates_partial_days() {
        let test = test_context();
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 1));

        let interest = usecase(&test, &document.id, time(2025, 1, 31, 23))
            .execute(&test.ctx)
            .await
            .unwrap();

        assert_eq!(interest.days_overdue, 30);
        assert_eq!(interest.outstanding, Decimal::new(12100, 2));
        assert_eq!(interest.rate, Decimal::from(8));
        // 121.00 * 8% * 30 / 365
        assert_eq!(interest.interest, Decimal::new(80, 2));
    }

    #[tokio::test]
    async fn tenant_rate_takes_precedence() {
        let test = test_context();
        test.fakes.back_office.add_tenant(TenantProfile {
            id: test.tenant.tenant_id.clone(),
            name: "Acme".into(),
            settings: TenantSettings {
                interest_rate: Some(Decimal::from(12)),
                ..Default::default()
            },
        });
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 1));

        let interest = usecase(&test, &document.id, time(2025, 1, 31, 0))
            .execute(&test.ctx)
            .await
            .unwrap();

        assert_eq!(interest.rate, Decimal::from(12));
        assert_eq!(interest.interest, Decimal::new(119, 2));
    }

    #[tokio::test]
    async fn no_interest_before_due_date() {
        let test = test_context();
        let document = insert_invoice(&test, &test.contact.id, date(2025, 1, 20));

        let interest = usecase(&test, &document.id, time(2025, 1, 16, 8))
            .execute(&test.ctx)
            .await
            .unwrap();

        assert_eq!(interest.days_overdue, 0);
        assert_eq!(interest.interest, Decimal::ZERO);
    }

    #[tokio::test]
    async fn unknown_document() {
        let test = test_context();
        let err = usecase(&test, &ID::new(), time(2025, 1, 16, 8))
            .execute(&test.ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            BillingError::from(err),
            BillingError::NotFound(_)
        ));
    }
}
