//! Component A: identity hashing.
//!
//! Every connection is keyed by a hash combining the credentials it was
//! opened with and its `host:port`, so the same endpoint reached under two
//! different credential sets never collides in the registry (§4.A).

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use md5::{Digest, Md5};

use crate::model::server::ServerDef;

fn md5_hex(input: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Legacy MONGODB-CR style password hash: `md5("{user}:mongo:{pwd}")`.
pub fn hashed_password(user: &str, pwd: &str) -> String {
    md5_hex(format!("{user}:mongo:{pwd}").as_bytes())
}

/// The 32 hex character prefix identifying a credential set. Anonymous
/// connections (no username) hash the empty string, which is exactly as
/// long as any other prefix, so prefix matching in selection never treats
/// an anonymous connection as a prefix of a credentialed one or vice versa.
pub fn auth_hash_prefix(
    db: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
) -> String {
    match (db, username, password) {
        (Some(db), Some(user), Some(pwd)) => {
            let hashed = hashed_password(user, pwd);
            md5_hex(format!("{db}:{user}:{hashed}").as_bytes())
        }
        _ => md5_hex(b""),
    }
}

/// The registry key for a server definition: `{auth_hash_prefix}:{host}:{port}`.
pub fn hash_server_def(def: &ServerDef) -> String {
    let prefix = auth_hash_prefix(
        def.db.as_deref(),
        def.username.as_deref(),
        def.password.as_deref(),
    );
    format!("{prefix}:{}", def.host_port())
}

/// Challenge-response digest for the legacy MONGODB-CR handshake:
/// `md5("{nonce}{user}{hashed_password}")`.
pub fn digest_nonce(nonce: &str, user: &str, hashed_password: &str) -> String {
    md5_hex(format!("{nonce}{user}{hashed_password}").as_bytes())
}
