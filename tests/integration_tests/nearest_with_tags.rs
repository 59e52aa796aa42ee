// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::BTreeMap;

use docdb_conn_core::{
    cfg::enums::{ConnectionType, DeploymentType, ReadPreferenceType},
    flags::AcquireFlags,
    manager::Manager,
    model::{read_preference::ReadPreference, server::ServerDef, server::ServerList},
    transport::{
        IsMasterReply,
        stub::{IsMasterScript, StubServer, StubTransport},
    },
};

use crate::integration_tests::common::test_config;

fn spawn_member(tag_value: &str) -> StubServer {
    let tag_value = tag_value.to_string();
    StubServer::spawn_with(move |addr| {
        let mut tags = BTreeMap::new();
        tags.insert("dc".to_string(), tag_value);
        IsMasterScript::fixed(IsMasterReply {
            connection_type: ConnectionType::Secondary,
            repl_set_name: Some("rs0".to_string()),
            hosts: vec![addr.to_string()],
            tags,
            max_bson_object_size: 16 * 1024 * 1024,
        })
    })
    .expect("spawn stub server")
}

#[test]
fn first_matching_tag_set_wins_over_untagged_fallback() {
    let east_a = spawn_member("east");
    let east_b = spawn_member("east");
    let west = spawn_member("west");

    let seeds: Vec<ServerDef> = [&east_a, &east_b, &west]
        .into_iter()
        .map(|s| {
            let (host, port) = s.host_port();
            ServerDef::new(host, port)
        })
        .collect();

    let mut manager = Manager::init(Box::new(StubTransport), test_config());
    let mut server_list = ServerList::new(seeds, DeploymentType::ReplicaSet, ReadPreference {
        pref_type: ReadPreferenceType::SecondaryPreferred,
        tag_sets: vec![
            [("dc".to_string(), "east".to_string())].into(),
            BTreeMap::new(),
        ],
    });
    server_list.repl_set_name = Some("rs0".to_string());

    let conn = manager
        .get_read_write_connection(&mut server_list, AcquireFlags::empty())
        .expect("acquisition should succeed")
        .expect("a candidate survives filtering");

    assert_eq!(conn.tags.get("dc").map(String::as_str), Some("east"));
    manager.deinit();
}
