// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use docdb_conn_core::cfg::config::ManagerConfig;

/// Long intervals so a second probe within one test body is always served
/// from cache rather than racing a real round trip.
pub fn test_config() -> ManagerConfig {
    let mut cfg = ManagerConfig::default();
    cfg.ping_interval_secs = 60;
    cfg.ismaster_interval_secs = 60;
    cfg
}
