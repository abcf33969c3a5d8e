// This module collects the cross-cutting infrastructure shared by every
// stage of the backend: the error type the passes and emitters surface their
// failures through, and the target configuration describing the profile
// version, capability set, extensions and extended-instruction-set imports
// that emission is allowed to assume. The passes themselves perform no
// version gating; every such question is delegated to the configuration.

//! Shared infrastructure: errors and target configuration.

pub mod config;
pub mod error;

pub use config::TargetConfig;
pub use error::{LegalizeError, LegalizeResult};
