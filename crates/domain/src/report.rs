use crate::{notification::DispatchOutcome, shared::entity::ID};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A document that was generated for a `RecurringSchedule`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub schedule_id: ID,
    pub document_id: ID,
    pub document_number: String,
    pub next_generation_date: NaiveDate,
    /// `None` when the schedule does not send on generation
    pub notification: Option<DispatchOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub schedule_id: ID,
    pub error: String,
}

/// Report of one run over the due schedules of a tenant
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    pub due: usize,
    pub generated: Vec<GenerationOutcome>,
    pub failed: Vec<GenerationFailure>,
    /// Set when the run stopped before processing every due schedule
    pub cancelled: bool,
}

impl GenerationResult {
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Generated documents whose notification did not go out
    pub fn notifications_not_sent(&self) -> usize {
        self.generated
            .iter()
            .filter(|g| matches!(&g.notification, Some(n) if !n.sent))
            .count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|f| format!("schedule {}: {}", f.schedule_id, f.error))
            .collect()
    }
}

/// Counts for a single `ReminderRule` within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRunSummary {
    pub rule_id: ID,
    pub rule_name: String,
    pub found: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl RuleRunSummary {
    pub fn new(rule_id: ID, rule_name: String) -> Self {
        Self {
            rule_id,
            rule_name,
            found: 0,
            sent: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }
}

/// Report of one reminder run over the active rules of a tenant
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReminderRunResult {
    pub rules_evaluated: usize,
    pub found: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub rules: Vec<RuleRunSummary>,
    pub cancelled: bool,
}

impl ReminderRunResult {
    pub fn add_rule(&mut self, summary: RuleRunSummary) {
        self.rules_evaluated += 1;
        self.found += summary.found;
        self.sent += summary.sent;
        self.skipped += summary.skipped;
        self.failed += summary.failed;
        self.errors.extend(
            summary
                .errors
                .iter()
                .map(|e| format!("rule {}: {}", summary.rule_name, e)),
        );
        self.rules.push(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_rule_summaries() {
        let mut result = ReminderRunResult::default();

        let mut first = RuleRunSummary::new(ID::new(), "Before".into());
        first.found = 3;
        first.sent = 2;
        first.skipped = 1;
        result.add_rule(first);

        let mut second = RuleRunSummary::new(ID::new(), "After".into());
        second.found = 2;
        second.sent = 1;
        second.failed = 1;
        second.errors.push("send email: timeout".into());
        result.add_rule(second);

        assert_eq!(result.rules_evaluated, 2);
        assert_eq!(result.found, 5);
        assert_eq!(result.sent, 3);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors, vec!["rule After: send email: timeout".to_string()]);
    }
}
