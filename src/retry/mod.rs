mod coordinator;
mod outcome;
mod plan;

pub use coordinator::RetryCoordinator;
pub use outcome::RetryOutcome;
pub use plan::RetryPlan;
