//! Hold request consumer: decodes a batch of hold requests, enriches each with
//! item and patron data, routes it to the offsite or onsite backend and
//! reports one outcome per record to the result stream.

pub mod clients;
pub mod decoder;
pub mod error;
pub mod observability;
pub mod service;
pub mod token;
pub mod traits;

#[cfg(test)]
mod testing;

pub use error::{ErrorEnvelope, ErrorKind, Stage};
pub use service::{Completion, ConsumerConfig, Orchestrator, PipelineFailure};
pub use token::{AccessToken, TokenCache};
pub use traits::{
    ItemLookup, OffsiteBackend, OnsiteBackend, PatronLookup, ResultSink, StreamDecoder,
    TokenProvider, TokenStore,
};
