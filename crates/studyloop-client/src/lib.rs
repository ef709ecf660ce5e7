//! studyloop-client — Service integrations.
//!
//! Implements the collaborator traits from `studyloop-core` over HTTP and
//! loads the shared configuration.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{load_config, load_config_from, StudyloopConfig};
pub use http::ServiceClient;
