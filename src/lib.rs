//! apiscout - layered backend endpoint discovery with a retrying HTTP client
//!
//! The backend this client talks to has no fixed address: it may sit on the
//! developer's machine, behind an emulator loopback alias, at the address it
//! had last run, or anywhere on the local private subnet. This crate turns
//! that uncertainty into a single verified [`endpoint::ActiveEndpoint`]
//! through staged, time-bounded discovery, and then keeps talking to it
//! through a transport-retrying [`client::ApiClient`].

pub mod cache;
pub mod cli;
pub mod client;
pub mod device;
pub mod discovery;
pub mod endpoint;
pub mod store;

pub use cache::EndpointCache;
pub use client::{ApiClient, RequestConfig};
pub use device::DeviceClass;
pub use discovery::{Discovery, DiscoveryConfig, DiscoveryOutcome, DiscoverySource};
pub use endpoint::{ActiveEndpoint, Endpoint};
