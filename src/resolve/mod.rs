//! Pure resolution and classification over fetched version data
//!
//! Nothing in here performs I/O; every function computes from a declared
//! range, a published [`crate::types::VersionSet`], an optional installed
//! snapshot, and advisory records.
//!
//! - [`range`]: npm range grammar, baseline extraction, supported-spec checks
//! - [`update`]: update resolution (suggestion, latest, prerelease handling)
//! - [`status`]: status classification state machine
//! - [`advisory`]: advisory adjustment pass

pub mod advisory;
pub mod range;
pub mod status;
pub mod update;
