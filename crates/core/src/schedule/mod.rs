pub mod create_schedule;
pub mod delete_schedule;
pub mod generate_document;
pub mod get_schedule;
pub mod get_schedules;
pub mod run_due_schedules;
pub mod set_schedule_active;
pub mod update_schedule;
