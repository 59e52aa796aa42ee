// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// The manager's tunables (§6): ping/ismaster probe intervals, the latency
/// window width, and connection timeouts.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ManagerConfig {
    /// Seconds between real pings for the same connection; a ping within
    /// this window is served without a round trip.
    #[serde(rename = "PingIntervalSecs")]
    pub ping_interval_secs: u64,

    /// Seconds between real `ismaster` probes for the same connection.
    #[serde(rename = "IsMasterIntervalSecs")]
    pub ismaster_interval_secs: u64,

    /// Width, in milliseconds, of the latency window kept in candidate
    /// selection phase 3. Defaults to 15 if omitted.
    #[serde(rename = "LatencyThresholdMs", default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: u64,

    /// Socket connect + handshake timeout, in milliseconds.
    #[serde(rename = "ConnectTimeoutMs", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_latency_threshold_ms() -> u64 {
    15
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

impl ManagerConfig {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: ManagerConfig =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates invariants; there is nothing here to normalize beyond the
    /// serde defaults, but the method is kept symmetric with
    /// `load_from_file` for callers that mutate a config in place.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(self.ping_interval_secs >= 1, "PingIntervalSecs must be >= 1");
        ensure!(
            self.ismaster_interval_secs >= 1,
            "IsMasterIntervalSecs must be >= 1"
        );
        ensure!(self.connect_timeout_ms >= 1, "ConnectTimeoutMs must be >= 1");
        Ok(())
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn ismaster_interval(&self) -> Duration {
        Duration::from_secs(self.ismaster_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 10,
            ismaster_interval_secs: 10,
            latency_threshold_ms: default_latency_threshold_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}
