// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
    cfg::enums::DeploymentType, identity, model::read_preference::ReadPreference,
};

/// Declarative identity of a server the caller wants to reach.
///
/// Copied into new definitions discovered at runtime; discovered
/// definitions inherit `db`/`username`/`password` from the seed that
/// discovered them (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDef {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub db: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ServerDef {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, db: None, username: None, password: None }
    }

    /// Builds a definition for a newly discovered host, cloning the
    /// credentials of the seed that reported it (§3, §4.E).
    pub fn discovered_from(seed: &ServerDef, host: String, port: u16) -> Self {
        Self {
            host,
            port,
            db: seed.db.clone(),
            username: seed.username.clone(),
            password: seed.password.clone(),
        }
    }

    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The registry key for this definition (component A).
    pub fn hash(&self) -> String {
        identity::hash_server_def(self)
    }
}

/// Parses a `"host:port"` string as reported by `ismaster`'s host list.
pub fn parse_host_port(s: &str) -> Result<(String, u16)> {
    let (host, port) = s
        .rsplit_once(':')
        .with_context(|| format!("malformed host:port entry '{s}'"))?;
    if host.is_empty() {
        bail!("malformed host:port entry '{s}': empty host");
    }
    let port: u16 = port
        .parse()
        .with_context(|| format!("malformed host:port entry '{s}': bad port"))?;
    Ok((host.to_string(), port))
}

/// The live working set for one acquisition (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerList {
    pub servers: Vec<ServerDef>,
    pub con_type: DeploymentType,
    #[serde(default)]
    pub repl_set_name: Option<String>,
    pub read_preference: ReadPreference,
}

impl ServerList {
    pub fn new(
        servers: Vec<ServerDef>,
        con_type: DeploymentType,
        read_preference: ReadPreference,
    ) -> Self {
        Self { servers, con_type, repl_set_name: None, read_preference }
    }

    /// The auth-hash prefix (component A) this acquisition will use to
    /// segregate the registry. Derived from the first seed's credentials,
    /// since one `ServerList` represents one logical credential set;
    /// an empty list (or a first seed with no credentials) yields the
    /// anonymous prefix.
    pub fn auth_hash_prefix(&self) -> String {
        match self.servers.first() {
            Some(seed) => identity::auth_hash_prefix(
                seed.db.as_deref(),
                seed.username.as_deref(),
                seed.password.as_deref(),
            ),
            None => identity::auth_hash_prefix(None, None, None),
        }
    }
}
