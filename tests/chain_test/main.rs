//! Integration tests for deploy and rollback chains
//!
//! Each module drives the controller (or the async driver) through a full
//! chain using scripted agent responses.

mod common;
mod config;
mod driver;
mod rollback_flow;
mod serverless_flow;
