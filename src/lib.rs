//! # clutch
//!
//! Resumable batch engine for AI-generated file descriptions.
//!
//! A project is a cloned git repository plus a flat list of its files.
//! The engine drives every file through an external AI CLI call at a
//! bounded level of concurrency, appending each completion to a durable
//! ledger so an interrupted run picks up where it left off.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod project;
pub mod sink;
pub mod telemetry;
