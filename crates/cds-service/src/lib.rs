//! # cds-service
//!
//! Async request boundary for CDS scenario generation.
//!
//! This crate wraps the `cds-pipeline` crate with a service surface: typed
//! request/response payloads, an append-only [`RunStore`] of completed
//! inventories for incremental runs, and a [`ScenarioService`] that executes
//! requests on blocking workers with a per-request timeout and cooperative
//! cancellation.

#![warn(missing_docs)]

mod request;
mod service;

pub use request::{ScenarioRequest, ScenarioResponse};
pub use service::{RunStore, ScenarioService, ServiceError, DEFAULT_TIMEOUT};
