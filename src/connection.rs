//! Component B: the connection primitive.
//!
//! A `Connection` owns one live [`Session`] plus the bookkeeping the rest of
//! the core needs: its identity hash, the last time it was probed, and what
//! it last reported about itself.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};

use crate::{
    cfg::enums::ConnectionType,
    identity,
    model::server::ServerDef,
    transport::{IsMasterReply, Session, Transport},
};

/// Outcome of an `ismaster` probe (§4.B).
#[derive(Debug, Clone, PartialEq)]
pub enum IsMasterResult {
    /// The probe ran and succeeded; `hosts` and `repl_set_name` are fresh.
    Ok { hosts: Vec<String>, repl_set_name: Option<String> },
    /// Skipped because the last probe was within `ismaster_interval`.
    SkippedBecauseRecent,
    /// The probe succeeded but the contacted host is not itself a member of
    /// the reported host list; caller must deregister, but `hosts` and
    /// `repl_set_name` are still usable for discovery (§4.B, §9).
    RemoveSeed { hosts: Vec<String>, repl_set_name: Option<String> },
}

/// A live connection to one server (§3).
pub struct Connection {
    pub hash: String,
    session: Box<dyn Session>,
    pub last_ismaster: Option<Instant>,
    pub last_ping: Option<Instant>,
    pub ping_ms: Option<u64>,
    pub tags: BTreeMap<String, String>,
    pub connection_type: ConnectionType,
    pub max_bson_size: u32,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("hash", &self.hash)
            .field("connection_type", &self.connection_type)
            .field("ping_ms", &self.ping_ms)
            .finish()
    }
}

impl Connection {
    /// Opens a transport session and wraps it with default bookkeeping.
    /// Does not register the connection (§4.B `create`).
    pub fn create(
        transport: &dyn Transport,
        def: &ServerDef,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let hash = identity::hash_server_def(def);
        let session = transport
            .connect(def, connect_timeout)
            .with_context(|| format!("connecting to {}", def.host_port()))?;
        Ok(Self {
            hash,
            session,
            last_ismaster: None,
            last_ping: None,
            ping_ms: None,
            tags: BTreeMap::new(),
            connection_type: ConnectionType::Unknown,
            max_bson_size: 16 * 1024 * 1024,
        })
    }

    /// Legacy MONGODB-CR handshake: fetch a nonce, then send the digest.
    pub fn authenticate(&mut self, user: &str, password: &str) -> Result<()> {
        let nonce = self.session.getnonce().context("getnonce")?;
        let hashed = identity::hashed_password(user, password);
        let digest = identity::digest_nonce(&nonce, user, &hashed);
        self.session
            .authenticate(user, &digest)
            .context("authenticate")
    }

    /// Runs `ismaster`, respecting `ismaster_interval`; folds the four-way
    /// result code from §4.B into [`IsMasterResult`] plus an `anyhow::Error`
    /// for the `Error` case.
    pub fn ismaster(
        &mut self,
        expected_repl_set: Option<&str>,
        contacted: &ServerDef,
        ismaster_interval: Duration,
    ) -> Result<IsMasterResult> {
        if let Some(last) = self.last_ismaster
            && last.elapsed() < ismaster_interval
        {
            return Ok(IsMasterResult::SkippedBecauseRecent);
        }

        let reply: IsMasterReply = self.session.ismaster().context("ismaster")?;
        self.last_ismaster = Some(Instant::now());
        self.connection_type = reply.connection_type;
        self.tags = reply.tags.clone();
        self.max_bson_size = reply.max_bson_object_size;

        if let Some(expected) = expected_repl_set
            && let Some(reported) = &reply.repl_set_name
            && expected != reported
        {
            anyhow::bail!(
                "replica set name mismatch: expected '{expected}', server reported \
                 '{reported}'"
            );
        }

        let contacted_hp = contacted.host_port();
        let is_member = reply.hosts.iter().any(|h| h == &contacted_hp);

        if is_member {
            Ok(IsMasterResult::Ok { hosts: reply.hosts, repl_set_name: reply.repl_set_name })
        } else {
            Ok(IsMasterResult::RemoveSeed {
                hosts: reply.hosts,
                repl_set_name: reply.repl_set_name,
            })
        }
    }

    /// Pings, respecting `ping_interval`; a recent ping short-circuits
    /// without a round trip (§4.B).
    pub fn ping(&mut self, ping_interval: Duration) -> Result<()> {
        if let Some(last) = self.last_ping
            && last.elapsed() < ping_interval
        {
            return Ok(());
        }
        let rtt = self.session.ping().context("ping")?;
        self.last_ping = Some(Instant::now());
        self.ping_ms = Some(u64::try_from(rtt.as_millis()).unwrap_or(u64::MAX));
        Ok(())
    }

    pub fn last_ping_age(&self) -> Option<Duration> {
        self.last_ping.map(|t| t.elapsed())
    }

    /// Closes the transport. Consumes the connection since nothing else
    /// may touch it afterwards (§4.B `destroy`).
    pub fn destroy(self) {
        self.session.destroy();
    }
}
