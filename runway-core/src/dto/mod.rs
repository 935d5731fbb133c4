//! Data Transfer Objects for inter-service communication
//!
//! DTOs are the request shapes accepted by the orchestrator API and the
//! payloads exchanged with executor backends.

pub mod execution;
