//! Core library for the `ultron-dashboard` CLI.
//!
//! The dashboard talks to an ultron load-testing backend: it submits and
//! stops plans, scrapes the Prometheus exposition the backend exports,
//! derives per-attacker statistics, and keeps a bounded chart history. The
//! primary user-facing interface is the command-line application; library
//! APIs may evolve as the CLI grows.
pub mod args;
pub mod backend;
pub mod charts;
pub mod clock;
pub mod config;
pub mod controller;
pub mod entry;
pub mod error;
pub mod exposition;
pub mod logger;
pub mod plan;
pub mod series;
pub mod shutdown;
pub mod stats;
pub mod summary;
