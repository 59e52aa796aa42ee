// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

#![allow(clippy::all)]

//! Most unit coverage lives next to the code it tests, in `#[cfg(test)]`
//! modules under `src/`. This binary exists so `cargo test --test unit`
//! matches the harness shape of the other test target; it currently has
//! nothing of its own to add beyond what `cargo test --lib` already runs.

mod unit_tests {}
