// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cfg::enums::ReadPreferenceType;

/// A single tag set: every key/value pair the connection must advertise.
/// `BTreeMap` keeps iteration deterministic, which matters for the unit
/// tests that compare selection output across runs.
pub type TagSet = BTreeMap<String, String>;

/// Policy object stating which roles and tag sets are acceptable for a
/// request, mirroring the read-preference concept of a document-database
/// driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadPreference {
    #[serde(rename = "type")]
    pub pref_type: ReadPreferenceType,
    #[serde(default)]
    pub tag_sets: Vec<TagSet>,
}

impl ReadPreference {
    /// Convenience constructor for a preference with no tag-set filtering.
    pub fn new(pref_type: ReadPreferenceType) -> Self {
        Self { pref_type, tag_sets: Vec::new() }
    }

    pub fn primary() -> Self {
        Self::new(ReadPreferenceType::Primary)
    }

    pub fn nearest() -> Self {
        Self::new(ReadPreferenceType::Nearest)
    }

    /// Returns a copy of this preference with `pref_type` forced to
    /// `Primary`, keeping the caller's tag sets intact. Used by the write
    /// path of the replica-set acquisition strategy (§4.G).
    pub fn forced_primary(&self) -> Self {
        Self { pref_type: ReadPreferenceType::Primary, tag_sets: self.tag_sets.clone() }
    }

    /// Returns a copy of this preference with `pref_type` forced to
    /// `Nearest`, keeping the caller's tag sets intact. Used by the
    /// standalone/multiple acquisition strategy (§4.G).
    pub fn forced_nearest(&self) -> Self {
        Self { pref_type: ReadPreferenceType::Nearest, tag_sets: self.tag_sets.clone() }
    }
}

/// A connection satisfies a candidate tag set iff it provides every tag the
/// set names. Extra tags on the connection are ignored.
pub fn tags_match(connection_tags: &TagSet, candidate: &TagSet) -> bool {
    candidate
        .iter()
        .all(|(k, v)| connection_tags.get(k).is_some_and(|cv| cv == v))
}
