// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use docdb_conn_core::{
    cfg::enums::DeploymentType,
    error::ManagerError,
    flags::AcquireFlags,
    manager::Manager,
    model::{read_preference::ReadPreference, server::ServerDef, server::ServerList},
    transport::stub::StubTransport,
};

use crate::integration_tests::common::test_config;

#[test]
fn every_seed_unreachable_surfaces_composite_error() {
    let mut manager = Manager::init(Box::new(StubTransport), test_config());
    let mut server_list = ServerList::new(
        vec![ServerDef::new("127.0.0.1", 1), ServerDef::new("127.0.0.1", 2)],
        DeploymentType::Multiple,
        ReadPreference::nearest(),
    );

    let err = manager
        .get_read_write_connection(&mut server_list, AcquireFlags::empty())
        .expect_err("no seed is listening, acquisition must fail");
    match err {
        ManagerError::NoCandidateServersComposite(msg) => {
            assert!(msg.contains("127.0.0.1:1"));
            assert!(msg.contains("127.0.0.1:2"));
        },
        other => panic!("expected a composite error, got {other:?}"),
    }
    manager.deinit();
}
