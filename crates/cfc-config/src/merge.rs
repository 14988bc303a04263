// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON merging functionality

use serde_json::Value as J;

/// Merge two JSON values with deep object merging and array replacement
///
/// Objects are merged recursively, scalars/arrays replace the left value.
pub fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}

/// Insert a value at a dotted path, creating intermediate objects
pub fn insert_dotted(root: &mut J, dotted: &str, v: J) {
    let mut cur = root;
    let mut parts = dotted.split('.').peekable();
    while let Some(part) = parts.next() {
        if !cur.is_object() {
            *cur = J::Object(Default::default());
        }
        let J::Object(map) = cur else { return };
        if parts.peek().is_none() {
            map.insert(part.to_string(), v);
            return;
        }
        cur = map.entry(part.to_string()).or_insert_with(|| J::Object(Default::default()));
    }
}
