//! Batch processing pipeline.
//!
//! 1. **Configuration** (`config`): validated consumer settings
//! 2. **Classification** (`classify`): `ErrorEnvelope` -> retry / permanent / isolate
//! 3. **Per-record stages** (`stage`, `enrich`, `backend`): one shared sequential fold
//! 4. **Dispatch** (`dispatch`): offsite and onsite branches run concurrently
//! 5. **Orchestration** (`orchestrator`): the state machine over all of the above

pub mod backend;
pub mod classify;
pub mod config;
pub mod deadline;
pub mod dispatch;
pub mod enrich;
pub mod filter;
pub mod operation;
pub mod orchestrator;
pub mod stage;

// Re-export key types for convenient access.
pub use classify::{Classification, Disposition, ErrorClassifier, FailurePolicy};
pub use config::{ConfigError, ConsumerConfig};
pub use operation::{
    Completion, CompletionPath, PipelineFailure, PipelineState, StageReport, StageStep,
};
pub use orchestrator::{Collaborators, Orchestrator};
pub use stage::{RecordStage, StageRunner};
