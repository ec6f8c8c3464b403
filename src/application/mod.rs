//! Wiring of configured components into runnable services.

pub mod service;

pub use service::{build_bridge, build_factory_provider, init_logging};
