//! Flowrunner - Declarative Automation Runtime
//!
//! This crate executes user-defined automations: ordered sequences of tool
//! invocations described as data, resolved against a rolling execution
//! context and gated by structured conditions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
