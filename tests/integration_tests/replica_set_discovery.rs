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

/// A seed whose own `ismaster` reply omits itself from the reported host
/// list (simulating, e.g., a load-balancer alias the replica set doesn't
/// recognize as a member) must be discovered through, then dropped, while
/// the members it reports get connected and registered in its place
/// (§4.B `RemoveSeed`, §4.E).
#[test]
fn alias_seed_is_dropped_and_real_members_are_registered() {
    let secondary_a = StubServer::spawn_with(|addr| {
        IsMasterScript::fixed(IsMasterReply {
            connection_type: ConnectionType::Secondary,
            repl_set_name: Some("rs0".to_string()),
            hosts: vec![addr.to_string()],
            ..Default::default()
        })
    })
    .expect("spawn secondary a");

    let secondary_b = StubServer::spawn_with(|addr| {
        IsMasterScript::fixed(IsMasterReply {
            connection_type: ConnectionType::Secondary,
            repl_set_name: Some("rs0".to_string()),
            hosts: vec![addr.to_string()],
            ..Default::default()
        })
    })
    .expect("spawn secondary b");

    let (a_host, a_port) = secondary_a.host_port();
    let (b_host, b_port) = secondary_b.host_port();
    let a_addr = format!("{a_host}:{a_port}");
    let b_addr = format!("{b_host}:{b_port}");

    let alias = StubServer::spawn_with(move |_addr| {
        IsMasterScript::fixed(IsMasterReply {
            connection_type: ConnectionType::Primary,
            repl_set_name: Some("rs0".to_string()),
            hosts: vec![a_addr, b_addr],
            ..Default::default()
        })
    })
    .expect("spawn alias seed");
    let (alias_host, alias_port) = alias.host_port();

    let mut manager = Manager::init(Box::new(StubTransport), test_config());
    let mut server_list = ServerList::new(
        vec![ServerDef::new(alias_host, alias_port)],
        DeploymentType::ReplicaSet,
        ReadPreference::nearest(),
    );
    server_list.repl_set_name = Some("rs0".to_string());

    let conn = manager
        .get_read_write_connection(&mut server_list, AcquireFlags::empty())
        .expect("acquisition should succeed")
        .expect("a discovered secondary survives selection");

    // The alias itself was reported as Primary, but it is never a member of
    // its own host list, so it must never be the connection returned here.
    assert_eq!(conn.connection_type, ConnectionType::Secondary);

    let alias_hash = ServerDef::new(alias.host_port().0, alias.host_port().1).hash();
    assert!(
        manager.connection_find_by_hash(&alias_hash).is_none(),
        "alias seed should have been deregistered"
    );

    manager.deinit();
}
