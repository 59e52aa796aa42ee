//! Declarative data model shared by every component: server definitions,
//! the live server list for one acquisition, and the read-preference policy.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Read-preference policy and tag-set matching.
pub mod read_preference;
/// `ServerDef` / `ServerList`, the caller-declared topology inputs.
pub mod server;

pub use read_preference::{ReadPreference, TagSet};
pub use server::{ServerDef, ServerList};
