use crate::error::BillingError;
use crate::notification::{DispatchRequest, NotificationDispatcher};
use crate::shared::{
    cancellation::RunCancellation,
    collaborator::{call, CollaboratorError},
    usecase::UseCase,
};
use billing_scheduler_domain::{
    DispatchStatus, ReminderCandidate, ReminderRule, ReminderRunResult, ReminderStatus,
    RuleRunSummary, SentReminder, TenantScope,
};
use billing_scheduler_infra::BillingContext;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

/// Evaluates every active reminder rule of the tenant at `as_of` and emails
/// the documents each rule selects. A (document, rule) pair is reminded at
/// most once successfully.
#[derive(Debug)]
pub struct RunDueRemindersUseCase {
    pub tenant: TenantScope,
    pub as_of: DateTime<Utc>,
    pub cancellation: RunCancellation,
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Unable to load the active reminder rules, {0}")]
    QueryRules(CollaboratorError),
}

impl From<UseCaseError> for BillingError {
    fn from(_: UseCaseError) -> Self {
        Self::InternalError
    }
}

#[async_trait::async_trait]
impl UseCase for RunDueRemindersUseCase {
    type Response = ReminderRunResult;

    type Errors = UseCaseError;

    const NAME: &'static str = "RunDueReminders";

    async fn execute(&mut self, ctx: &BillingContext) -> Result<Self::Response, Self::Errors> {
        let rules = call(
            ctx,
            "find active rules",
            ctx.repos.reminder_rules.find_active(&self.tenant),
        )
        .await
        .map_err(UseCaseError::QueryRules)?;

        let mut result = ReminderRunResult::default();
        for rule in rules {
            if self.cancellation.is_cancelled() {
                result.cancelled = true;
                break;
            }
            let (summary, interrupted) = self.evaluate_rule(ctx, &rule).await;
            result.add_rule(summary);
            if interrupted {
                result.cancelled = true;
                break;
            }
        }

        info!(
            "Reminder run for tenant: {} as of: {} finished. Rules: {}, found: {}, sent: {}, skipped: {}, failed: {}",
            self.tenant.tenant_id,
            self.as_of,
            result.rules_evaluated,
            result.found,
            result.sent,
            result.skipped,
            result.failed
        );
        Ok(result)
    }
}

impl RunDueRemindersUseCase {
    /// Returns the summary of the rule and whether the run was cancelled
    /// before every candidate was handled
    async fn evaluate_rule(
        &self,
        ctx: &BillingContext,
        rule: &ReminderRule,
    ) -> (RuleRunSummary, bool) {
        let mut summary = RuleRunSummary::new(rule.id.clone(), rule.name.clone());

        let due_date = match rule.target_due_date(self.as_of.date_naive()) {
            Some(due_date) => due_date,
            None => {
                let error = format!(
                    "days offset {} is out of range for {}",
                    rule.days_offset,
                    self.as_of.date_naive()
                );
                warn!("Reminder rule: {} was not evaluated. {}", rule.id, error);
                summary.errors.push(error);
                return (summary, false);
            }
        };
        let statuses = rule.trigger_type.candidate_statuses();
        let candidates = match call(
            ctx,
            "find candidates",
            ctx.repos
                .documents
                .find_reminder_candidates(&self.tenant, due_date, &statuses),
        )
        .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Reminder rule: {} was not evaluated. {}", rule.id, e);
                summary.errors.push(e.to_string());
                return (summary, false);
            }
        };
        summary.found = candidates.len();

        for candidate in &candidates {
            if self.cancellation.is_cancelled() {
                return (summary, true);
            }
            self.remind(ctx, rule, candidate, &mut summary).await;
        }

        (summary, false)
    }

    async fn remind(
        &self,
        ctx: &BillingContext,
        rule: &ReminderRule,
        candidate: &ReminderCandidate,
        summary: &mut RuleRunSummary,
    ) {
        let document = &candidate.document;

        match call(
            ctx,
            "check sent reminders",
            ctx.repos
                .sent_reminders
                .exists_sent(&self.tenant, &document.id, &rule.id),
        )
        .await
        {
            Ok(true) => {
                summary.skipped += 1;
                return;
            }
            Ok(false) => (),
            Err(e) => return record_failure(summary, &document.number, e.to_string()),
        }
        if candidate.email().is_none() {
            summary.skipped += 1;
            return;
        }

        let reminder = SentReminder::pending(
            self.tenant.tenant_id.clone(),
            document.id.clone(),
            rule.id.clone(),
            ctx.sys.now(),
        );
        if let Err(e) = call(
            ctx,
            "insert sent reminder",
            ctx.repos.sent_reminders.insert(&self.tenant, &reminder),
        )
        .await
        {
            return record_failure(summary, &document.number, e.to_string());
        }

        let request = DispatchRequest::for_reminder(rule, candidate);
        let outcome = NotificationDispatcher::dispatch(ctx, &self.tenant, &request).await;
        let (status, sent_at) = match outcome.status {
            DispatchStatus::Sent => {
                summary.sent += 1;
                (ReminderStatus::Sent, Some(ctx.sys.now()))
            }
            DispatchStatus::Failed => {
                record_failure(
                    summary,
                    &document.number,
                    outcome.error.clone().unwrap_or_default(),
                );
                (ReminderStatus::Failed, None)
            }
            DispatchStatus::Skipped | DispatchStatus::NoConfig => {
                summary.skipped += 1;
                (ReminderStatus::Canceled, None)
            }
        };

        // The email is out at this point, a failed update only loses the ledger state
        if let Err(e) = call(
            ctx,
            "update sent reminder",
            ctx.repos.sent_reminders.update_status(
                &self.tenant,
                &reminder.id,
                status,
                sent_at,
                outcome.log_id.clone(),
                outcome.error.clone(),
            ),
        )
        .await
        {
            warn!(
                "Reminder for document: {} and rule: {} was not recorded as {}. {}",
                document.id,
                rule.id,
                status.as_str(),
                e
            );
            summary
                .errors
                .push(format!("document {}: {}", document.number, e));
        }
    }
}

fn record_failure(summary: &mut RuleRunSummary, document_number: &str, error: String) {
    summary.failed += 1;
    summary
        .errors
        .push(format!("document {}: {}", document_number, error));
}
