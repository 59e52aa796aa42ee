//! Component K: the error taxonomy surfaced across the public API (§7).
//!
//! Internal components recover locally and propagate with `anyhow` for
//! rich context; only the top-level acquisition boundary in
//! [`crate::manager`] converts a stage-tagged [`crate::acquire::AcquireError`]
//! into one of these variants.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("connect failed for {server}: {source}")]
    Connect { server: String, source: anyhow::Error },

    #[error("authentication failed for {server}: {source}")]
    Authentication { server: String, source: anyhow::Error },

    #[error("ping failed for {server}: {source}")]
    Ping { server: String, source: anyhow::Error },

    #[error("No candidate servers found")]
    NoCandidateServers,

    #[error("No candidate servers found: {0}")]
    NoCandidateServersComposite(String),
}

impl From<crate::acquire::AcquireError> for ManagerError {
    fn from(e: crate::acquire::AcquireError) -> Self {
        match e {
            crate::acquire::AcquireError::Connect { server, source } => {
                ManagerError::Connect { server, source }
            },
            crate::acquire::AcquireError::Authentication { server, source } => {
                ManagerError::Authentication { server, source }
            },
            crate::acquire::AcquireError::Ping { server, source } => {
                ManagerError::Ping { server, source }
            },
        }
    }
}
