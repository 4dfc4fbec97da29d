mod controller;
mod error;
mod state;

pub use controller::{CycleOutcome, VerdictController};
pub use error::VerdictError;
pub use state::{Phase, VerdictState};
