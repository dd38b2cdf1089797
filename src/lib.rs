//! Competition data acquisition and pipeline orchestration for the
//! brain-to-text challenge.
//!
//! This crate provides the core functionality behind the `b2t` CLI binary:
//! verifying the required dataset files against a fixed manifest, acquiring
//! them from the primary hosted source (with bounded retry on rate limiting
//! and a best-effort secondary fallback), and handing off to the external
//! multi-stage pipeline executable. It can be consumed programmatically for
//! testing or custom workflows.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Explicit configuration for fetch and run workflows
//! - [`dirs`] - Home-directory resolution abstraction
//! - [`error`] - Semantic error types with recovery hints
//! - [`extract`] - Zip bundle extraction with path traversal protection
//! - [`fetch`] - Retry loop, backoff schedule, and acquisition policy
//! - [`manifest`] - The fixed manifest of required dataset files
//! - [`output`] - Progress and instruction formatting
//! - [`pipeline`] - External pipeline invocation and exit-code propagation
//! - [`source`] - Primary and secondary remote data sources
//! - [`verify`] - Directory verification against the manifest

pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod verify;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
