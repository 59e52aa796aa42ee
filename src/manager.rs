//! Component G: the manager and acquisition strategy.
//!
//! `Manager` is the long-lived owner of the registry, the interval
//! tunables, and the log sink (§3). `get_read_write_connection` is the
//! primary entry point; it dispatches on `ServerList.con_type` (§4.G).

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt::Write as _;

use crate::{
    acquire::{AcquireContext, single_connection_acquire},
    cfg::{
        config::ManagerConfig,
        enums::{DeploymentType, LogLevel, LogModule, ReadPreferenceType},
    },
    connection::Connection,
    discovery::discover_topology,
    error::ManagerError,
    flags::AcquireFlags,
    identity,
    log::{LogSink, NoopSink, emit},
    model::server::ServerList,
    registry::Registry,
    selection::select_candidate,
    transport::Transport,
};

/// The long-lived owner of the registry (§3). One `Manager` per thread;
/// it is not reentrant (§5).
pub struct Manager {
    registry: Registry,
    config: ManagerConfig,
    transport: Box<dyn Transport>,
    sink: Box<dyn LogSink>,
}

impl Manager {
    /// `init` (§6): builds a manager with the given transport and config,
    /// and a no-op log sink until `set_log_sink` is called.
    pub fn init(transport: Box<dyn Transport>, config: ManagerConfig) -> Self {
        Self { registry: Registry::new(), config, transport, sink: Box::new(NoopSink) }
    }

    pub fn set_log_sink(&mut self, sink: Box<dyn LogSink>) {
        self.sink = sink;
    }

    pub fn connection_find_by_hash(&self, hash: &str) -> Option<&Connection> {
        self.registry.find(hash)
    }

    pub fn connection_register(&mut self, connection: Connection) {
        self.registry.register(connection);
    }

    pub fn connection_deregister(&mut self, hash: &str) -> bool {
        self.registry.deregister(hash)
    }

    /// `deinit` (§6): destroys every registered connection in forward
    /// order.
    pub fn deinit(&mut self) {
        self.registry.deinit();
    }

    fn acquire_ctx(&mut self) -> AcquireContext<'_> {
        AcquireContext {
            registry: &mut self.registry,
            transport: self.transport.as_ref(),
            sink: self.sink.as_ref(),
            connect_timeout: self.config.connect_timeout(),
            ping_interval: self.config.ping_interval(),
            ismaster_interval: self.config.ismaster_interval(),
        }
    }

    /// Attempts single-acquire against every seed, accumulating per-seed
    /// failures — converted to the structured `ManagerError` variant for
    /// the stage that failed (§7) — into one composite string. Returns the
    /// count of seeds that were reachable.
    fn acquire_all_seeds(
        &mut self,
        server_list: &ServerList,
        flags: AcquireFlags,
    ) -> (usize, String) {
        let mut reachable = 0usize;
        let mut composite = String::new();
        for def in &server_list.servers {
            let mut ctx = self.acquire_ctx();
            match single_connection_acquire(&mut ctx, def, flags) {
                Ok(Some(_)) => reachable += 1,
                Ok(None) => {},
                Err(e) => {
                    let err: ManagerError = e.into();
                    emit(
                        self.sink.as_ref(),
                        LogModule::Manager,
                        LogLevel::Warn,
                        &def.host_port(),
                        format_args!("seed unreachable: {err}"),
                    );
                    if !composite.is_empty() {
                        let _ = write!(composite, "; ");
                    }
                    let _ = write!(composite, "{err}");
                },
            }
        }
        (reachable, composite)
    }

    /// Probes `ismaster` once per already-acquired seed so `connection_type`
    /// gets populated even when the deployment type forbids topology
    /// discovery (§4.G: "do not discover topology" for Standalone/Multiple).
    /// Unlike `discover_topology`, this never expands `server_list.servers`
    /// or removes aliased seeds — it only classifies the connections that
    /// are already registered.
    fn probe_roles(&mut self, server_list: &ServerList) {
        for def in &server_list.servers {
            let hash = identity::hash_server_def(def);
            let ismaster_interval = self.config.ismaster_interval();
            let Some(connection) = self.registry.find_mut(&hash) else {
                continue;
            };
            if let Err(e) = connection.ismaster(None, def, ismaster_interval) {
                emit(
                    self.sink.as_ref(),
                    LogModule::Manager,
                    LogLevel::Warn,
                    &def.host_port(),
                    format_args!("ismaster probe failed: {e}"),
                );
            }
        }
    }

    /// Primary entry point (§6, §4.G). `server_list` is mutated in place by
    /// discovery when `con_type == ReplicaSet`.
    pub fn get_read_write_connection(
        &mut self,
        server_list: &mut ServerList,
        flags: AcquireFlags,
    ) -> Result<Option<&Connection>, ManagerError> {
        if server_list.servers.is_empty() {
            return Err(ManagerError::NoCandidateServers);
        }

        let auth_hash_prefix = server_list.auth_hash_prefix();

        match server_list.con_type {
            DeploymentType::Standalone | DeploymentType::Multiple => {
                let (reachable, composite) = self.acquire_all_seeds(server_list, flags);
                if reachable == 0 && flags.contains(AcquireFlags::DONT_CONNECT) {
                    return Ok(None);
                }
                self.probe_roles(server_list);

                let pref = server_list.read_preference.forced_nearest();
                let hash = select_candidate(
                    &self.registry,
                    &auth_hash_prefix,
                    &pref,
                    self.config.latency_threshold_ms,
                );

                match hash {
                    Some(h) => Ok(self.registry.find(&h)),
                    None if !composite.is_empty() => {
                        Err(ManagerError::NoCandidateServersComposite(composite))
                    },
                    None => Err(ManagerError::NoCandidateServers),
                }
            },
            DeploymentType::ReplicaSet => {
                let (reachable, _composite) = self.acquire_all_seeds(server_list, flags);
                if reachable == 0 {
                    if flags.contains(AcquireFlags::DONT_CONNECT) {
                        return Ok(None);
                    }
                    return Err(ManagerError::NoCandidateServers);
                }

                {
                    let mut ctx = self.acquire_ctx();
                    discover_topology(server_list, &mut ctx);
                }

                let pref = if flags.contains(AcquireFlags::WRITE) {
                    server_list.read_preference.forced_primary()
                } else {
                    server_list.read_preference.clone()
                };
                debug_assert!(
                    !flags.contains(AcquireFlags::WRITE)
                        || pref.pref_type == ReadPreferenceType::Primary
                );

                let hash = select_candidate(
                    &self.registry,
                    &auth_hash_prefix,
                    &pref,
                    self.config.latency_threshold_ms,
                );

                match hash {
                    Some(h) => Ok(self.registry.find(&h)),
                    None => Err(ManagerError::NoCandidateServers),
                }
            },
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.registry.deinit();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        cfg::enums::ConnectionType,
        model::{read_preference::ReadPreference, server::ServerDef},
        transport::stub::{IsMasterScript, StubServer, StubTransport},
    };

    fn config() -> ManagerConfig {
        let mut cfg = ManagerConfig::default();
        cfg.ping_interval_secs = 60;
        cfg.ismaster_interval_secs = 60;
        cfg
    }

    #[test]
    fn standalone_reachable_server_is_returned() {
        let script = IsMasterScript::fixed(crate::transport::IsMasterReply {
            connection_type: ConnectionType::Standalone,
            ..Default::default()
        });
        let server = StubServer::spawn(script).expect("spawn stub server");
        let (host, port) = server.host_port();

        let mut manager = Manager::init(Box::new(StubTransport), config());
        let mut server_list = ServerList::new(
            vec![ServerDef::new(host, port)],
            DeploymentType::Standalone,
            ReadPreference::nearest(),
        );

        let conn = manager
            .get_read_write_connection(&mut server_list, AcquireFlags::empty())
            .expect("acquisition should succeed");
        assert!(conn.is_some());
    }

    #[test]
    fn empty_seed_list_is_no_candidate_servers() {
        let mut manager = Manager::init(Box::new(StubTransport), config());
        let mut server_list = ServerList::new(
            Vec::new(),
            DeploymentType::Standalone,
            ReadPreference::nearest(),
        );
        let err = manager
            .get_read_write_connection(&mut server_list, AcquireFlags::empty())
            .expect_err("empty seed list must fail");
        assert!(matches!(err, ManagerError::NoCandidateServers));
    }

    #[test]
    fn dont_connect_with_empty_registry_returns_none_without_error() {
        let mut manager = Manager::init(Box::new(StubTransport), config());
        let mut server_list = ServerList::new(
            vec![ServerDef::new("127.0.0.1", 1)],
            DeploymentType::Standalone,
            ReadPreference::nearest(),
        );
        let result = manager
            .get_read_write_connection(
                &mut server_list,
                AcquireFlags::DONT_CONNECT,
            )
            .expect("dont_connect must not error");
        assert!(result.is_none());
    }

    #[test]
    fn all_seeds_down_multiple_surfaces_composite_error() {
        let mut manager = Manager::init(Box::new(StubTransport), config());
        let mut server_list = ServerList::new(
            vec![ServerDef::new("127.0.0.1", 1), ServerDef::new("127.0.0.1", 2)],
            DeploymentType::Multiple,
            ReadPreference::nearest(),
        );
        let err = manager
            .get_read_write_connection(&mut server_list, AcquireFlags::empty())
            .expect_err("all seeds down must fail");
        assert!(matches!(err, ManagerError::NoCandidateServersComposite(_)));
    }

    #[test]
    fn replica_set_write_intent_forces_primary_type() {
        let server = StubServer::spawn_with(|addr| {
            IsMasterScript::fixed(crate::transport::IsMasterReply {
                connection_type: ConnectionType::Primary,
                repl_set_name: Some("rs0".to_string()),
                hosts: vec![addr.to_string()],
                tags: BTreeMap::new(),
                max_bson_object_size: 16 * 1024 * 1024,
            })
        })
        .expect("spawn stub server");
        let (host, port) = server.host_port();

        let mut manager = Manager::init(Box::new(StubTransport), config());
        let mut server_list = ServerList::new(
            vec![ServerDef::new(host, port)],
            DeploymentType::ReplicaSet,
            ReadPreference::new(ReadPreferenceType::SecondaryPreferred),
        );
        server_list.repl_set_name = Some("rs0".to_string());

        let conn = manager
            .get_read_write_connection(&mut server_list, AcquireFlags::WRITE)
            .expect("acquisition should succeed");
        assert!(conn.is_some());
        assert_eq!(conn.expect("present").connection_type, ConnectionType::Primary);
    }

    /// §8 scenario 5: all seeds down on a replica set surfaces the plain
    /// "no candidate servers" error, never the composed per-seed messages
    /// that Standalone/Multiple would show (§4.G: discovery is expected to
    /// recover, so per-seed connect failures are not composed here).
    #[test]
    fn all_seeds_down_replica_set_is_plain_no_candidate_error() {
        let mut manager = Manager::init(Box::new(StubTransport), config());
        let mut server_list = ServerList::new(
            vec![
                ServerDef::new("127.0.0.1", 1),
                ServerDef::new("127.0.0.1", 2),
                ServerDef::new("127.0.0.1", 3),
            ],
            DeploymentType::ReplicaSet,
            ReadPreference::nearest(),
        );
        server_list.repl_set_name = Some("rs0".to_string());

        let err = manager
            .get_read_write_connection(&mut server_list, AcquireFlags::empty())
            .expect_err("all seeds down must fail");
        assert!(matches!(err, ManagerError::NoCandidateServers));
    }
}
