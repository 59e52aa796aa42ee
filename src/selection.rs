//! Component F: candidate selection.
//!
//! Four phases applied in order over the registry: filter by auth-hash
//! prefix/role/tags, sort by latency, truncate to the latency window, then
//! pick one survivor at random (§4.F).

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use rand::Rng;

use crate::{
    cfg::enums::{ConnectionType, ReadPreferenceType},
    connection::Connection,
    model::read_preference::{ReadPreference, tags_match},
    registry::Registry,
};

fn role_compatible(pref: ReadPreferenceType, role: ConnectionType) -> bool {
    match pref {
        ReadPreferenceType::Primary => role == ConnectionType::Primary,
        ReadPreferenceType::Secondary => role == ConnectionType::Secondary,
        ReadPreferenceType::PrimaryPreferred
        | ReadPreferenceType::SecondaryPreferred
        | ReadPreferenceType::Nearest => matches!(
            role,
            ConnectionType::Primary
                | ConnectionType::Secondary
                | ConnectionType::Standalone
                | ConnectionType::Mongos
        ),
    }
}

/// Phase 1: filter. Since tag sets must be tried in priority order and the
/// *first* set yielding any survivor wins (not the first set any one
/// connection happens to match), this returns candidates paired with the
/// index of the earliest tag set they satisfy; the caller keeps only the
/// group at the overall-lowest index.
fn filter<'a>(
    registry: &'a Registry,
    auth_hash_prefix: &str,
    pref: &ReadPreference,
) -> Vec<&'a Connection> {
    let role_ok: Vec<&Connection> = registry
        .iter()
        .filter(|c| c.hash.starts_with(auth_hash_prefix))
        .filter(|c| role_compatible(pref.pref_type, c.connection_type))
        .collect();

    if pref.tag_sets.is_empty() {
        return role_ok;
    }

    for tag_set in &pref.tag_sets {
        let matched: Vec<&Connection> = role_ok
            .iter()
            .copied()
            .filter(|c| tags_match(&c.tags, tag_set))
            .collect();
        if !matched.is_empty() {
            return matched;
        }
    }
    Vec::new()
}

/// Phase 2 + 3: stable sort by `ping_ms` ascending, then keep the latency
/// window, then apply the `*Preferred` role narrowing.
fn sort_and_truncate<'a>(
    mut survivors: Vec<&'a Connection>,
    pref_type: ReadPreferenceType,
    latency_threshold_ms: u64,
) -> Vec<&'a Connection> {
    survivors.sort_by_key(|c| c.ping_ms.unwrap_or(u64::MAX));

    let Some(min_ping) = survivors.first().and_then(|c| c.ping_ms) else {
        return Vec::new();
    };
    let ceiling = min_ping.saturating_add(latency_threshold_ms);
    let windowed: Vec<&Connection> = survivors
        .into_iter()
        .filter(|c| c.ping_ms.is_some_and(|p| p <= ceiling))
        .collect();

    match pref_type {
        ReadPreferenceType::PrimaryPreferred => {
            let primaries: Vec<&Connection> = windowed
                .iter()
                .copied()
                .filter(|c| c.connection_type == ConnectionType::Primary)
                .collect();
            if primaries.is_empty() { windowed } else { primaries }
        },
        ReadPreferenceType::SecondaryPreferred => {
            let secondaries: Vec<&Connection> = windowed
                .iter()
                .copied()
                .filter(|c| c.connection_type == ConnectionType::Secondary)
                .collect();
            if secondaries.is_empty() { windowed } else { secondaries }
        },
        _ => windowed,
    }
}

/// Phase 4: pick one survivor uniformly at random. `None` if the set is
/// empty.
fn pick<'a>(survivors: &[&'a Connection]) -> Option<&'a Connection> {
    if survivors.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..survivors.len());
    Some(survivors[idx])
}

/// Runs all four phases and returns the hash of the chosen connection, so
/// the caller can re-look it up rather than hold a borrow across any
/// further registry mutation.
pub fn select_candidate(
    registry: &Registry,
    auth_hash_prefix: &str,
    pref: &ReadPreference,
    latency_threshold_ms: u64,
) -> Option<String> {
    let filtered = filter(registry, auth_hash_prefix, pref);
    let truncated = sort_and_truncate(filtered, pref.pref_type, latency_threshold_ms);
    pick(&truncated).map(|c| c.hash.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_compatible_matches_spec_table() {
        assert!(role_compatible(ReadPreferenceType::Primary, ConnectionType::Primary));
        assert!(!role_compatible(
            ReadPreferenceType::Primary,
            ConnectionType::Secondary
        ));
        assert!(role_compatible(
            ReadPreferenceType::Nearest,
            ConnectionType::Secondary
        ));
        assert!(role_compatible(
            ReadPreferenceType::PrimaryPreferred,
            ConnectionType::Secondary
        ));
    }

    use std::time::Duration;

    use crate::{
        model::server::ServerDef,
        transport::stub::{IsMasterScript, StubServer, StubTransport},
    };

    fn make_connection(
        server: &StubServer,
        connection_type: ConnectionType,
        ping_ms: u64,
        tags: &[(&str, &str)],
    ) -> Connection {
        let (host, port) = server.host_port();
        let def = ServerDef::new(host, port);
        let mut conn = Connection::create(&StubTransport, &def, Duration::from_secs(1))
            .expect("create connection");
        conn.connection_type = connection_type;
        conn.ping_ms = Some(ping_ms);
        conn.tags = tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        conn
    }

    #[test]
    fn latency_window_matches_spec_example() {
        let server = StubServer::spawn(IsMasterScript::default()).expect("spawn");
        let mut registry = Registry::new();
        for (i, ping) in [5u64, 10, 20, 25].into_iter().enumerate() {
            let mut conn = make_connection(&server, ConnectionType::Secondary, ping, &[]);
            conn.hash = format!("{}-{i}", conn.hash);
            registry.register(conn);
        }

        let pref = ReadPreference::new(ReadPreferenceType::Nearest);
        let filtered = filter(&registry, "", &pref);
        let truncated = sort_and_truncate(filtered, pref.pref_type, 15);

        let mut pings: Vec<u64> = truncated.iter().filter_map(|c| c.ping_ms).collect();
        pings.sort_unstable();
        assert_eq!(pings, vec![5, 10, 20]);
    }

    #[test]
    fn write_intent_forces_primary_among_survivors() {
        let server = StubServer::spawn(IsMasterScript::default()).expect("spawn");
        let mut registry = Registry::new();
        let mut primary = make_connection(&server, ConnectionType::Primary, 20, &[]);
        primary.hash = format!("{}-primary", primary.hash);
        let mut sec1 = make_connection(&server, ConnectionType::Secondary, 8, &[]);
        sec1.hash = format!("{}-sec1", sec1.hash);
        let mut sec2 = make_connection(&server, ConnectionType::Secondary, 10, &[]);
        sec2.hash = format!("{}-sec2", sec2.hash);
        let primary_hash = primary.hash.clone();
        registry.register(primary);
        registry.register(sec1);
        registry.register(sec2);

        // write intent forces type=Primary before selection, per §4.G
        let pref = ReadPreference::new(ReadPreferenceType::Primary);
        let chosen = select_candidate(&registry, "", &pref, 15).expect("a candidate");
        assert_eq!(chosen, primary_hash);
    }

    #[test]
    fn tag_set_priority_stops_at_first_match() {
        let server = StubServer::spawn(IsMasterScript::default()).expect("spawn");
        let mut registry = Registry::new();
        let mut east1 = make_connection(&server, ConnectionType::Secondary, 30, &[("dc", "east")]);
        east1.hash = format!("{}-east1", east1.hash);
        let mut east2 = make_connection(&server, ConnectionType::Secondary, 40, &[("dc", "east")]);
        east2.hash = format!("{}-east2", east2.hash);
        let mut other1 = make_connection(&server, ConnectionType::Secondary, 5, &[("dc", "west")]);
        other1.hash = format!("{}-other1", other1.hash);
        registry.register(east1);
        registry.register(east2);
        registry.register(other1);

        let pref = ReadPreference {
            pref_type: ReadPreferenceType::Nearest,
            tag_sets: vec![
                [("dc".to_string(), "east".to_string())].into(),
                std::collections::BTreeMap::new(),
            ],
        };
        let filtered = filter(&registry, "", &pref);
        let mut pings: Vec<u64> = filtered.iter().filter_map(|c| c.ping_ms).collect();
        pings.sort_unstable();
        assert_eq!(pings, vec![30, 40]);
    }

    #[test]
    fn empty_registry_selects_nothing() {
        let registry = Registry::new();
        let pref = ReadPreference::primary();
        assert!(select_candidate(&registry, "", &pref, 15).is_none());
    }
}
