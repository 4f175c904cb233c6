//! Cached, de-duplicated access to the registry, the package manager, and
//! advisory data
//!
//! Every external query lives behind a trait seam so the engine can be
//! exercised without network or CLI access. [`provider::VersionProvider`]
//! composes the collaborators with the TTL cache and the concurrency gate.

pub mod advisory;
pub mod error;
pub mod installed;
pub mod provider;
pub mod registry;
