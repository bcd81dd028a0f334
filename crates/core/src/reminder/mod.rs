pub mod create_reminder_rule;
pub mod delete_reminder_rule;
pub mod get_reminder_rules;
pub mod run_due_reminders;
pub mod update_reminder_rule;
