// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

/// Deployment topology the caller declares for a `ServerList`.
///
/// Drives the acquisition strategy in [`crate::manager`]: `Standalone` and
/// `Multiple` skip topology discovery entirely, while `ReplicaSet` runs
/// discovery after the initial seed connections are up.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum DeploymentType {
    Standalone,
    ReplicaSet,
    Multiple,
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeploymentType::Standalone => "Standalone",
            DeploymentType::ReplicaSet => "ReplicaSet",
            DeploymentType::Multiple => "Multiple",
        })
    }
}

/// Role a server reports through `ismaster`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum ConnectionType {
    #[default]
    Unknown,
    Primary,
    Secondary,
    Arbiter,
    Mongos,
    Standalone,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionType::Unknown => "Unknown",
            ConnectionType::Primary => "Primary",
            ConnectionType::Secondary => "Secondary",
            ConnectionType::Arbiter => "Arbiter",
            ConnectionType::Mongos => "Mongos",
            ConnectionType::Standalone => "Standalone",
        })
    }
}

/// The read/write policy requested for one acquisition.
///
/// `Primary` and `Secondary` restrict the candidate set to a single role;
/// the `*Preferred` variants fall back to the other role only when no
/// candidate of the preferred role survives phase 3 of selection; `Nearest`
/// accepts both roles and keeps only the lowest-latency band.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ReadPreferenceType {
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

impl fmt::Display for ReadPreferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReadPreferenceType::Primary => "Primary",
            ReadPreferenceType::PrimaryPreferred => "PrimaryPreferred",
            ReadPreferenceType::Secondary => "Secondary",
            ReadPreferenceType::SecondaryPreferred => "SecondaryPreferred",
            ReadPreferenceType::Nearest => "Nearest",
        })
    }
}

/// Module identifiers used by the log channel (component H).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogModule {
    Identity,
    Connection,
    Registry,
    Acquire,
    Discovery,
    Selection,
    Manager,
}

impl fmt::Display for LogModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogModule::Identity => "identity",
            LogModule::Connection => "connection",
            LogModule::Registry => "registry",
            LogModule::Acquire => "acquire",
            LogModule::Discovery => "discovery",
            LogModule::Selection => "selection",
            LogModule::Manager => "manager",
        })
    }
}

/// Severity levels passed to the log channel.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}
