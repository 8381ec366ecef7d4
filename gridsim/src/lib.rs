/*
SPDX-FileCopyrightText: Copyright 2026 Gridsim Project Contributors
SPDX-License-Identifier: MIT
*/

//! gridsim – deadline-aware work-scheduling simulation engine (Rust port)
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── params/     – simulation context, clock & buffer policy
//! ├── workload/   – Project / Job data model
//! ├── error/      – construction-boundary error type
//! ├── rrsim/      – round-robin work-fetch simulator (+ rate allocator)
//! ├── edf/        – EDF admission simulator & candidate check
//! ├── trace/      – injected structured event sink
//! └── config/     – YAML scenario loading for the CLI and tools
//! ```
//!
//! The engine is a pure, synchronous "what would happen if" projection over
//! in-memory state: no I/O, no clocks, no globals.  The client's work-fetch
//! policy reads the round-robin shortfalls; the dispatch server gates job
//! assignment on the EDF candidate check.

pub mod config;
pub mod edf;
pub mod error;
pub mod params;
pub mod rrsim;
pub mod trace;
pub mod workload;
