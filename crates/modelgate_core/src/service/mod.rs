//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own relation cache refresh after relation mutations.

pub mod model_service;
