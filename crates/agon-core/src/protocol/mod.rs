//! Protocol modules (HTTP chat payloads + provider prompt types).
//!
//! - `chat`: the inbound `ChatRequest` and the outbound `ChatResponse` envelope.
//! - `prompt`: the ordered message list and generation parameters handed to an
//!   LLM client.
//!
//! Deserialization is strict about meaning (unknown roles are rejected) but
//! lenient about extra fields, so older clients keep working.

pub mod chat;
pub mod prompt;
