//! reqwest-backed implementations of the collaborator traits.

pub mod data_api;
pub mod oauth;
pub mod offsite;
pub mod streams;
pub mod transport;

pub use data_api::DataApiClient;
pub use oauth::OAuthTokenProvider;
pub use offsite::ScsbClient;
pub use streams::StreamsResultSink;
