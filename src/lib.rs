//! Push built virtual machine images to cloud providers.
//!
//! An image is uploaded to the provider's object storage and then
//! registered as a bootable machine image in its compute service.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod push;
pub mod services;
