//! Core Components
//!
//! Request building blocks and the transport seam.

pub mod body;
pub mod endpoint;
pub mod headers;
pub mod transport;

pub use body::*;
pub use endpoint::*;
pub use headers::*;
pub use transport::*;
