pub mod client;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod transport;

pub use client::GitLabClient;
pub use error::{ApiRetryableError, TransportError};
pub use host::{HttpProjectHost, ProjectHost};
pub use transport::{HostResponse, Transport, TransportPolicy};
