// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Window scanning against generated log windows

use cfc_core::{source_tag, LogPattern, Timestamp};
use cfc_platform_client::BackendKind;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Line {
    second: u32,
    backend: BackendKind,
    index: u32,
    announces: bool,
}

fn backend() -> impl Strategy<Value = BackendKind> {
    prop_oneof![Just(BackendKind::Legacy), Just(BackendKind::NextGeneration)]
}

fn line() -> impl Strategy<Value = Line> {
    (0u32..30, backend(), 0u32..4, any::<bool>()).prop_map(|(second, backend, index, announces)| Line {
        second,
        backend,
        index,
        announces,
    })
}

fn stamp(second: u32) -> String {
    format!("2016-06-14T13:00:{second:02}.00-0700")
}

fn render(n: usize, line: &Line) -> String {
    let body = if line.announces {
        format!("OUT ssh session: ssh u{n}@nyc1.tmate.io")
    } else {
        "OUT listening on 8080".to_string()
    };
    format!("{} [{}/{}] {body}", stamp(line.second), source_tag(line.backend), line.index)
}

proptest! {
    #[test]
    fn returns_the_last_fresh_announcement_of_the_requested_instance(
        lines in prop::collection::vec(line(), 0..24),
        mark in 0u32..30,
        wanted_backend in backend(),
        wanted_index in 0u32..4,
    ) {
        let pattern = LogPattern::new("tmate.io").unwrap();
        let window: Vec<String> = lines.iter().enumerate().map(|(n, l)| render(n, l)).collect();
        let after: Timestamp = stamp(mark).parse().unwrap();

        let expected = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| {
                l.announces && l.second > mark && l.backend == wanted_backend && l.index == wanted_index
            })
            .map(|(n, _)| format!("u{n}@nyc1.tmate.io"))
            .last();

        let found = pattern.scan_window(&window, wanted_backend, wanted_index, &after);

        if let Some(endpoint) = &found {
            prop_assert!(endpoint.observed_at > after);
            prop_assert_eq!(endpoint.instance_index, wanted_index);
        }
        prop_assert_eq!(found.map(|e| e.address), expected);
    }
}
