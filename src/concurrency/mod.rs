//! Caching and concurrency primitives underpinning the fetch layer
//!
//! - [`cache`]: TTL cache of shared in-flight futures
//! - [`gate`]: bound on simultaneous external lookups
//! - [`debounce`]: burst-coalescing recomputation trigger

pub mod cache;
pub mod debounce;
pub mod gate;
