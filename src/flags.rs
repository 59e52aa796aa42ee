//! Acquisition flags (§6): the bit set passed to
//! [`crate::manager::Manager::get_read_write_connection`].

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

bitflags::bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct AcquireFlags: u8 {
        /// Selection forces `ReadPreferenceType::Primary` in a replica set.
        const WRITE = 0x01;
        /// Lookup-only: never open new sockets.
        const DONT_CONNECT = 0x02;
    }
}
