// rackstate-api: Async Rust client for the NetBox DCIM REST API

pub mod client;
pub mod dcim;
pub mod error;
pub mod extras;
pub mod tenancy;
pub mod transport;
pub mod types;

pub use client::NetboxClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
