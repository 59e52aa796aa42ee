// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use docdb_conn_core::{
    cfg::enums::{ConnectionType, DeploymentType},
    flags::AcquireFlags,
    manager::Manager,
    model::{read_preference::ReadPreference, server::ServerDef, server::ServerList},
    transport::{
        IsMasterReply,
        stub::{IsMasterScript, StubServer, StubTransport},
    },
};

use crate::integration_tests::common::test_config;

#[test]
fn reachable_standalone_is_selected_and_reused() {
    let script = IsMasterScript::fixed(IsMasterReply {
        connection_type: ConnectionType::Standalone,
        ..Default::default()
    });
    let server = StubServer::spawn(script).expect("spawn stub server");
    let (host, port) = server.host_port();

    let mut manager = Manager::init(Box::new(StubTransport), test_config());
    let mut server_list = ServerList::new(
        vec![ServerDef::new(host, port)],
        DeploymentType::Standalone,
        ReadPreference::nearest(),
    );

    let first = manager
        .get_read_write_connection(&mut server_list, AcquireFlags::empty())
        .expect("first acquisition should succeed")
        .expect("a connection")
        .hash
        .clone();

    // Second call should reuse the same registered connection rather than
    // opening a new socket (§4.D step 2).
    let second = manager
        .get_read_write_connection(&mut server_list, AcquireFlags::empty())
        .expect("second acquisition should succeed")
        .expect("a connection")
        .hash
        .clone();

    assert_eq!(first, second);
    manager.deinit();
}

#[test]
fn dont_connect_against_never_acquired_seed_returns_none() {
    let mut manager = Manager::init(Box::new(StubTransport), test_config());
    let mut server_list = ServerList::new(
        vec![ServerDef::new("127.0.0.1", 1)],
        DeploymentType::Standalone,
        ReadPreference::nearest(),
    );

    let result = manager
        .get_read_write_connection(&mut server_list, AcquireFlags::DONT_CONNECT)
        .expect("dont_connect must not surface an error");
    assert!(result.is_none());
    manager.deinit();
}
