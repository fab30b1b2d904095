//! In-memory chains, a mock network directory, a scripted relay backend and
//! fixtures for exercising the Astral transfer orchestrator.
#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(
    warnings,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

pub mod directory;
pub mod fixtures;
pub mod hosts;
pub mod relayer;
