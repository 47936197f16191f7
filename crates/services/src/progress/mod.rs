mod service;
mod tracker;

pub use service::ProgressService;
pub use tracker::{POINTS_PER_CORRECT, SessionCompletion, SessionTally, complete_session};
