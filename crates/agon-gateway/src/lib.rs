//! Agon gateway library entry.
//!
//! This crate wires config, the metrics registry, request instrumentation, the
//! LLM client and the chat service into an axum application. It is consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod http;
pub mod llm;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
