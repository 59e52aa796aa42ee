//! Component D: single-connection acquire.
//!
//! The one place a connection is created, authenticated, pinged, and
//! registered. Returns the registry hash of a usable connection so callers
//! can re-look it up without holding a borrow across the registry mutation
//! (see [`crate::registry::Registry`]).

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::{
    cfg::enums::{LogLevel, LogModule},
    connection::Connection,
    flags::AcquireFlags,
    identity,
    log::{LogSink, emit},
    model::server::ServerDef,
    registry::Registry,
    transport::Transport,
};

/// Inputs a single acquire needs from the manager, gathered into one
/// struct so the function signature does not grow every time a tunable is
/// added.
pub struct AcquireContext<'a> {
    pub registry: &'a mut Registry,
    pub transport: &'a dyn Transport,
    pub sink: &'a dyn LogSink,
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
    pub ismaster_interval: Duration,
}

/// Stage-tagged failure from a single-connection acquire (§4.D), so the
/// manager boundary (§7) can convert straight into the matching
/// `ManagerError` variant without re-parsing a flattened message.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("connect failed for {server}: {source}")]
    Connect { server: String, source: anyhow::Error },
    #[error("authentication failed for {server}: {source}")]
    Authentication { server: String, source: anyhow::Error },
    #[error("ping failed for {server}: {source}")]
    Ping { server: String, source: anyhow::Error },
}

/// Implements §4.D steps 1-5. Returns:
/// - `Ok(Some(hash))` — a live, registered, pinged connection is available.
/// - `Ok(None)` — absent and `DONT_CONNECT` was set; not an error.
/// - `Err(_)` — connect, auth, or ping failed; any just-created connection
///   has already been destroyed.
pub fn single_connection_acquire(
    ctx: &mut AcquireContext<'_>,
    def: &ServerDef,
    flags: AcquireFlags,
) -> Result<Option<String>, AcquireError> {
    let hash = identity::hash_server_def(def);

    if let Some(connection) = ctx.registry.find_mut(&hash) {
        if let Err(e) = connection.ping(ctx.ping_interval) {
            emit(
                ctx.sink,
                LogModule::Acquire,
                LogLevel::Warn,
                &def.host_port(),
                format_args!("ping on reuse failed, deregistering"),
            );
            ctx.registry.deregister(&hash);
            return Err(AcquireError::Ping { server: def.host_port(), source: e });
        }
        return Ok(Some(hash));
    }

    if flags.contains(AcquireFlags::DONT_CONNECT) {
        return Ok(None);
    }

    let connection = Connection::create(ctx.transport, def, ctx.connect_timeout)
        .map_err(|e| AcquireError::Connect { server: def.host_port(), source: e })?;

    let mut connection = try_authenticate(connection, def)?;
    if let Err(e) = connection.ping(ctx.ping_interval) {
        connection.destroy();
        return Err(AcquireError::Ping { server: def.host_port(), source: e });
    }

    debug!(server = %def.host_port(), hash = %hash, "registering new connection");
    ctx.registry.register(connection);
    Ok(Some(hash))
}

fn try_authenticate(
    mut connection: Connection,
    def: &ServerDef,
) -> Result<Connection, AcquireError> {
    let (Some(user), Some(password)) = (&def.username, &def.password) else {
        return Ok(connection);
    };

    if let Err(e) = connection.authenticate(user, password) {
        connection.destroy();
        return Err(AcquireError::Authentication { server: def.host_port(), source: e });
    }
    Ok(connection)
}
