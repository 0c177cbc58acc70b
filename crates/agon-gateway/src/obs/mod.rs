//! In-process observability: the metrics registry and the request
//! instrumentation middleware that feeds it. Rendered by `/metrics`.

pub mod metrics;
pub mod middleware;
