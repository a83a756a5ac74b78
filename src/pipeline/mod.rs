pub mod job;
pub mod orchestrator;
pub mod worker;

pub use job::JobDir;
pub use orchestrator::{DubbingOrchestrator, S2sOptions, S2sOutput, TtsOptions, TtsOutput};
pub use worker::run_supervised;
