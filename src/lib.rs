// Copyright 2026 Cardprobe Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cardprobe library — headless-browser gift card checker.
//!
//! This library crate exposes the core modules for integration testing.

#![allow(clippy::new_without_default)]

pub mod auth;
pub mod batch;
pub mod checker;
pub mod classify;
pub mod cli;
pub mod config;
pub mod input;
pub mod output;
pub mod probe;
pub mod record;
pub mod renderer;
pub mod retry;
pub mod sequencer;
