// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-spec grammar round trips.

use berth_core::ports::PortSpec;

#[test]
fn every_accepted_form_round_trips() {
    for form in ["7000", "8088:7000", "127.0.0.1:9000:7000", "1:1", "65535:65535"] {
        let parsed: PortSpec = form.parse().expect(form);
        let formatted = parsed.to_string();
        assert_eq!(formatted, form);
        let reparsed: PortSpec = formatted.parse().expect("reparse");
        assert_eq!(reparsed, parsed);
    }
}

#[test]
fn rejects_whitespace_and_out_of_range() {
    for form in ["", " 7000", "7000 ", "0", "65536", "a:b", "1:2:3:4"] {
        assert!(form.parse::<PortSpec>().is_err(), "should reject '{form}'");
    }
}
