//! Component B: the transport seam.
//!
//! Everything above this module talks to a server only through [`Transport`]
//! and [`Session`]. The one production implementation ([`stub`]) speaks a
//! length-prefixed JSON wire format over a blocking `TcpStream`; real
//! deployments would plug in a wire-protocol-accurate implementation behind
//! the same two traits without touching the manager, registry, or selection
//! logic.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::Result;

use crate::{cfg::enums::ConnectionType, model::server::ServerDef};

pub mod stub;

/// Opens sessions to a single server definition.
///
/// Implementations own the connect timeout and any TCP-level tuning
/// (nodelay, linger); the caller only supplies the address and an overall
/// deadline.
pub trait Transport: Send + Sync {
    fn connect(&self, def: &ServerDef, timeout: Duration) -> Result<Box<dyn Session>>;
}

/// One live connection to a server, opened by a [`Transport`].
///
/// All methods are blocking: a call does not return until the server has
/// replied or the connection's own I/O timeout elapses.
pub trait Session: Send {
    /// Legacy MONGODB-CR handshake step 1: fetch a nonce.
    fn getnonce(&mut self) -> Result<String>;

    /// Legacy MONGODB-CR handshake step 2: send the nonce digest.
    /// Returns `Ok(())` iff the server accepted the digest.
    fn authenticate(&mut self, user: &str, digest: &str) -> Result<()>;

    /// Runs `ismaster` (or the connection's equivalent topology probe) and
    /// reports the server's self-description.
    fn ismaster(&mut self) -> Result<IsMasterReply>;

    /// Round-trip latency probe; does not change topology state.
    fn ping(&mut self) -> Result<Duration>;

    /// Releases the underlying transport. Consumes the session since no
    /// further calls are meaningful afterwards.
    fn destroy(self: Box<Self>);
}

/// What a server reports about itself through `ismaster`.
#[derive(Debug, Clone, PartialEq)]
pub struct IsMasterReply {
    pub connection_type: ConnectionType,
    pub repl_set_name: Option<String>,
    /// Other members of the replica set, as `"host:port"` strings, as
    /// reported by the server (primary and secondary hosts combined).
    pub hosts: Vec<String>,
    pub tags: std::collections::BTreeMap<String, String>,
    pub max_bson_object_size: u32,
}

impl Default for IsMasterReply {
    fn default() -> Self {
        Self {
            connection_type: ConnectionType::Unknown,
            repl_set_name: None,
            hosts: Vec::new(),
            tags: std::collections::BTreeMap::new(),
            max_bson_object_size: 16 * 1024 * 1024,
        }
    }
}
