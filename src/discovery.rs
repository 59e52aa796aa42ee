//! Component E: topology discovery.
//!
//! Expands a `ServerList` to every member the cluster reports, starting
//! from a seed list that has already survived one round of single-connection
//! acquires (§4.E). The loop is index-based with the bound re-read on each
//! step, because discovery appends to the very list it iterates (§9 Design
//! Notes): a snapshot iterator would miss newly-discovered hosts.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::{
    acquire::{AcquireContext, single_connection_acquire},
    cfg::enums::{LogLevel, LogModule},
    connection::IsMasterResult,
    flags::AcquireFlags,
    identity,
    log::emit,
    model::server::{ServerDef, ServerList, parse_host_port},
};

/// Runs discovery in place over `server_list.servers`. Never returns an
/// error: every failure is a seed the loop skips or a host it declines to
/// add, logged through `ctx.sink` (§4.E, §7).
pub fn discover_topology(server_list: &mut ServerList, ctx: &mut AcquireContext<'_>) {
    let expected_repl_set = server_list.repl_set_name.clone();

    let mut i = 0;
    while i < server_list.servers.len() {
        let seed = server_list.servers[i].clone();
        let hash = identity::hash_server_def(&seed);

        let Some(connection) = ctx.registry.find_mut(&hash) else {
            emit(
                ctx.sink,
                LogModule::Discovery,
                LogLevel::Warn,
                &seed.host_port(),
                format_args!("no live connection for seed, skipping"),
            );
            i += 1;
            continue;
        };

        let ismaster_result =
            connection.ismaster(expected_repl_set.as_deref(), &seed, ctx.ismaster_interval);

        let (hosts, _reported_repl_set) = match ismaster_result {
            Err(e) => {
                emit(
                    ctx.sink,
                    LogModule::Discovery,
                    LogLevel::Warn,
                    &seed.host_port(),
                    format_args!("ismaster failed: {e}"),
                );
                ctx.registry.deregister(&hash);
                i += 1;
                continue;
            },
            Ok(IsMasterResult::SkippedBecauseRecent) => {
                i += 1;
                continue;
            },
            Ok(IsMasterResult::RemoveSeed { hosts, repl_set_name }) => {
                ctx.registry.deregister(&hash);
                (hosts, repl_set_name)
            },
            Ok(IsMasterResult::Ok { hosts, repl_set_name }) => (hosts, repl_set_name),
        };

        expand_hosts(server_list, ctx, &seed, &hosts);
        i += 1;
    }
}

fn expand_hosts(
    server_list: &mut ServerList,
    ctx: &mut AcquireContext<'_>,
    seed: &ServerDef,
    hosts: &[String],
) {
    for host_port in hosts {
        let (host, port) = match parse_host_port(host_port) {
            Ok(hp) => hp,
            Err(e) => {
                emit(
                    ctx.sink,
                    LogModule::Discovery,
                    LogLevel::Warn,
                    host_port,
                    format_args!("malformed host reported by ismaster: {e}"),
                );
                continue;
            },
        };

        let def = ServerDef::discovered_from(seed, host, port);
        let hash = identity::hash_server_def(&def);

        if ctx.registry.find(&hash).is_some() {
            continue;
        }

        match single_connection_acquire(ctx, &def, AcquireFlags::WRITE) {
            Ok(_) => server_list.servers.push(def),
            Err(e) => {
                emit(
                    ctx.sink,
                    LogModule::Discovery,
                    LogLevel::Warn,
                    &def.host_port(),
                    format_args!("discovered host unreachable: {e}"),
                );
            },
        }
    }
}
