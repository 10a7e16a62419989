// Copyright 2026 Prospect Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prospect — authenticated profile extraction over a real browser.
//!
//! The pipeline logs into a target site (reusing a persisted session
//! where possible), navigates to a profile URL with bounded retry, and
//! extracts a structured record via layered strategies: embedded
//! JSON-LD first, DOM heuristics second. Every failure path snapshots
//! the rendered page for postmortem.
//!
//! This library crate exposes the core modules for integration testing;
//! the `prospect` binary wires them into a CLI.

pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod navigation;
pub mod pipeline;
pub mod renderer;
pub mod session;
pub mod site;
