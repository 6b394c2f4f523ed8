//! Use-case services for public pages and the admin panel.
//!
//! # Responsibility
//! - Orchestrate repository calls into page-level operations.
//! - Keep form validation ahead of any repository call.

pub mod dashboard;
pub mod devotion_form;
pub mod devotion_service;
pub mod gallery;
pub mod share;
