//! Marketmirror - regional order-book snapshot mirroring.
//!
//! This crate continuously mirrors the live order book of a rate-limited
//! market API, reduces each region's full order list to a per-instrument
//! best-bid/best-ask summary, and publishes that summary to a
//! version-controlled content store acting as a CDN-backed cache.
//!
//! # Architecture
//!
//! The pipeline is built from small services behind hexagonal ports:
//!
//! - **`service::RequestGate`** - sliding-window outbound rate limiter
//! - **`service::RegionScan`** - paginated fetch with a bounded worker pool,
//!   streaming every order into the best-quote reduction
//! - **`service::FreshnessGate`** - decides from a snapshot's published age
//!   whether a region needs refreshing
//! - **`service::Publisher`** - idempotent, precondition-checked writes to
//!   one or more targets, with bulk squashing for batch refreshes
//! - **`service::Orchestrator`** - the hub (latency) and bulk (throughput)
//!   scheduling policies
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Pure types: orders, quotes, snapshots, freshness, reports
//! - [`error`] - Error types for the crate
//! - [`port`] - Trait seams between services and the outside world
//! - [`adapter`] - Upstream market API and content store implementations
//! - [`app`] - Application orchestration

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
pub mod service;
