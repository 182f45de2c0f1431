// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS CLI output parsing
//!
//! The CLI prints tables meant for humans, so extraction is deliberately
//! tolerant: a line either matches the expected column pattern or is
//! skipped. Only the printed index, list, address and trailing comment are
//! extracted; nothing else is guessed.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{AddressListCollection, AddressListEntry, NativeId};

/// One address-list row: printed index, optional flag letters (`X` disabled,
/// `D` dynamic), list, address, optional trailing comment.
fn row_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s+(?:[XDI]+\s+)?(\S+)\s+(\S+)(?:\s+(.*\S))?\s*$")
            .expect("address-list row pattern is valid")
    })
}

/// Parses `/ip firewall address-list print` output. Rows that don't match
/// the column pattern (headers, flag legends, wrapped lines) are skipped.
pub(super) fn parse_address_list(output: &str) -> AddressListCollection {
    let mut lists = AddressListCollection::new();
    for line in output.lines() {
        let Some(caps) = row_pattern().captures(line) else {
            continue;
        };
        let (index, list, address) = (&caps[1], &caps[2], &caps[3]);
        let comment = caps.get(4).map_or("", |m| m.as_str());

        lists
            .entry(list.to_string())
            .or_default()
            .push(AddressListEntry {
                address: address.to_string(),
                comment: comment.to_string(),
                id: NativeId::Ssh(index.to_string()),
            });
    }
    lists
}

/// Extracts a `key: value` line from `print` output, e.g. `version:` from
/// `/system resource print` or `name:` from `/system identity print`.
pub(super) fn scalar_value(output: &str, key: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?m)^\s*{}:\s*(.+?)\s*$", regex::escape(key))).ok()?;
    pattern
        .captures(output)
        .map(|caps| caps[1].to_string())
}
