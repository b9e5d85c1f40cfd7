//! HTTP API: routing, cookie/bearer handling and the upstream auth client.

pub mod app;
pub mod context;
pub mod middleware;
pub mod upstream;
