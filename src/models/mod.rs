//! Data models for the cloud APIs.
//!
//! This module contains the request parameters and response bodies exchanged
//! with the provider services.

/// ECS image import model
pub mod image;
/// RAM role and policy model
pub mod ram;
