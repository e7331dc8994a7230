//! Adapters that turn in-process apps into benchmark handlers.

pub mod demo;
pub mod router;

pub use router::{service_handler, RouterAdapter};
