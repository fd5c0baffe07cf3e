//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, listing and tree calls into forum operations.
//! - Keep the serving layer decoupled from storage details.

pub mod forum_service;
