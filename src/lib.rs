//! Dependency version resolution and advisory engine
//!
//! Given the dependencies a manifest declares, the versions a registry has
//! published, the versions currently installed, and known vulnerability
//! advisories, the engine computes one deterministic upgrade recommendation
//! per dependency and classifies its urgency. Everything sits behind a
//! caching and de-duplication layer so that the engine stays cheap to call
//! from a re-entrant editor context (every keystroke, every file open).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Fetch     │────▶│   Provider   │◀────│    Engine    │
//! │ (collabs)    │     │ (cache+gate) │     │ (orchestrate)│
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                                        │
//!        ▼                                        ▼
//! ┌──────────────┐                         ┌──────────────┐
//! │ Concurrency  │                         │   Resolve    │
//! │ (primitives) │                         │ (pure logic) │
//! └──────────────┘                         └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`concurrency`]: TTL cache of shared futures, concurrency gate, debounced trigger
//! - [`fetch`]: registry / package-manager / advisory collaborators and the cached provider
//! - [`resolve`]: pure range parsing, update resolution, status classification, advisory pass
//! - [`engine`]: per-project orchestration and debounced recomputation
//! - [`config`]: engine configuration and time constants
//! - [`types`]: plain-data model shared across the engine
//!
//! External queries can fail at any time; failures degrade to "no data for
//! this dependency this cycle" and never abort sibling dependencies.

pub mod concurrency;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod resolve;
pub mod types;
