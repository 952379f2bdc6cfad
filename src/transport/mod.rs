//! HTTP transport shared by the catalog, synthesis and health calls.

mod http;

pub use http::{HttpTransport, TransportError, REQUEST_ID_HEADER};
