pub mod ticket;
pub mod triage;
