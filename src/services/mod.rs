//! Cloud service clients.
//!
//! Services wrap the provider HTTP APIs: request signing, the wire format
//! of each service, and the push steps built on top of them.

pub mod ecs_service;
pub mod oss_service;
pub mod ram_service;
pub mod rpc_client;
pub mod signer;
