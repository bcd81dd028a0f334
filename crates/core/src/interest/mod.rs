pub mod get_overdue_interest;
