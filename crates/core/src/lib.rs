mod error;
pub mod interest;
mod job_schedulers;
pub mod notification;
pub mod reminder;
pub mod schedule;
pub mod shared;

pub use error::BillingError;
pub use job_schedulers::{get_start_delay, start_generation_job, start_reminder_job};
pub use shared::{
    cancellation::RunCancellation,
    collaborator::CollaboratorError,
    usecase::{execute, UseCase},
};
