//! Simulation backends for TrafficScope

pub mod demo;
pub mod http;

pub use demo::{DemoBackend, DemoConfig};
pub use http::HttpBackend;
