// homedeck-api: Async wire layer for homedeck dashboards (REST + push channel)

pub mod error;
pub mod push;
pub mod rest;
pub mod transport;
pub mod types;

pub use error::Error;
pub use push::{ConnectionState, PushChannel, RetryPolicy};
pub use rest::RestClient;
pub use transport::{TlsMode, TransportConfig};
