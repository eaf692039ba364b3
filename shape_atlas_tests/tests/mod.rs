// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `shape_atlas`.
//!
//! - The `util` module contains page storages and rasterizers shared by the tests.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, so that the shared utilities are compiled once.
//! - If you want to add new tests, put them into the module matching their topic, and start
//!   the test name with that topic (`shelf_wrap_...` rather than `wrap_shelf_...`).

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod lifecycle;
mod shelf;
mod util;
