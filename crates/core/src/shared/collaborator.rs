use billing_scheduler_infra::BillingContext;
use std::future::Future;
use thiserror::Error;

/// Failure of a call to storage or an external service, labelled with the
/// stage it happened in
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage}: {message}")]
pub struct CollaboratorError {
    pub stage: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Awaits a collaborator call, bounded by the configured collaborator
/// timeout. A timeout is reported like any other failure of the call.
pub async fn call<T, F>(
    ctx: &BillingContext,
    stage: &'static str,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let timeout = ctx.config.collaborator_timeout;
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(CollaboratorError::new(stage, format!("{:#}", e))),
        Err(_) => Err(CollaboratorError::new(
            stage,
            format!("timed out after {}ms", timeout.as_millis()),
        )),
    }
}
