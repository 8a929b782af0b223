pub mod approval;

pub use approval::{ApprovalWorkflow, Decision, Outcome};
