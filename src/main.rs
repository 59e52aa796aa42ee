// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use docdb_conn_core::{
    cfg::{cli::resolve_config_path, config::ManagerConfig, enums::DeploymentType, logger::init_logger},
    flags::AcquireFlags,
    manager::Manager,
    model::{ReadPreference, ServerDef, ServerList},
    transport::stub::StubTransport,
};
use tracing::info;

/// Parses `host:port` entries passed on the command line; falls back to a
/// single local seed when none are given.
fn seeds_from_args() -> Vec<ServerDef> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return vec![ServerDef::new("127.0.0.1", 27017)];
    }
    args.iter()
        .filter_map(|s| {
            let (host, port) = s.rsplit_once(':')?;
            Some(ServerDef::new(host.to_string(), port.parse().ok()?))
        })
        .collect()
}

fn main() -> Result<()> {
    let _logger_guard = init_logger("config/logger.yaml")?;

    let config = resolve_config_path("config/manager.yaml")
        .and_then(ManagerConfig::load_from_file)
        .context("failed to resolve or load manager config")?;

    let servers = seeds_from_args();
    let con_type =
        if servers.len() == 1 { DeploymentType::Standalone } else { DeploymentType::Multiple };

    let mut server_list = ServerList::new(servers, con_type, ReadPreference::nearest());

    let mut manager = Manager::init(Box::new(StubTransport), config);

    match manager.get_read_write_connection(&mut server_list, AcquireFlags::empty()) {
        Ok(Some(conn)) => info!(hash = %conn.hash, role = %conn.connection_type, "acquired connection"),
        Ok(None) => info!("no connection acquired (DONT_CONNECT with empty registry)"),
        Err(e) => info!("acquisition failed: {e}"),
    }

    manager.deinit();
    Ok(())
}
