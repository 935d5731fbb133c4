//! Runway Core
//!
//! Core types and abstractions for the Runway execution system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Execution, ScriptSpec, ExecutorDescriptor)
//! - DTOs: Data transfer objects for inter-service communication
//! - Relay: Frames exchanged over the agent tunnel

pub mod domain;
pub mod dto;
pub mod names;
pub mod relay;
