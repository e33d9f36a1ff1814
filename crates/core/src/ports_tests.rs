// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    bare = { "7000", None, 0, 7000 },
    host_container = { "8088:7000", None, 8088, 7000 },
    localhost_bind = { "127.0.0.1:9000:7000", Some("127.0.0.1"), 9000, 7000 },
)]
fn parses_accepted_forms(s: &str, ip: Option<&str>, host: u16, container: u16) {
    let spec: PortSpec = s.parse().unwrap();
    assert_eq!(spec.host_ip, ip.map(|i| i.parse().unwrap()));
    assert_eq!(spec.host_port, host);
    assert_eq!(spec.container_port, container);
}

#[parameterized(
    empty = { "" },
    whitespace = { "80 80:7000" },
    zero = { "0" },
    too_big = { "70000" },
    bad_ip = { "notanip:80:7000" },
    four_parts = { "1:2:3:4" },
    trailing_colon = { "8080:" },
)]
fn rejects_invalid_forms(s: &str) {
    assert!(s.parse::<PortSpec>().is_err());
}

#[parameterized(
    bare = { "7000" },
    fixed = { "8088:7000" },
    bound = { "127.0.0.1:9000:7000" },
)]
fn format_round_trips(s: &str) {
    let spec: PortSpec = s.parse().unwrap();
    let formatted = spec.to_string();
    assert_eq!(formatted, s);
    let reparsed: PortSpec = formatted.parse().unwrap();
    assert_eq!(reparsed, spec);
}

#[test]
fn random_host_formats_as_bare_container_port() {
    assert_eq!(PortSpec::random_host(7000).to_string(), "7000");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_valid_spec_round_trips(
            // The grammar is colon-separated, so bind addresses are v4.
            ip in proptest::option::of(proptest::arbitrary::any::<std::net::Ipv4Addr>()),
            host in 1u16..=65535,
            container in 1u16..=65535,
        ) {
            let spec = PortSpec {
                host_ip: ip.map(std::net::IpAddr::V4),
                host_port: host,
                container_port: container,
            };
            let formatted = spec.to_string();
            let reparsed: PortSpec = formatted.parse().unwrap();
            prop_assert_eq!(reparsed, spec);
        }

        #[test]
        fn random_host_form_round_trips(container in 1u16..=65535) {
            let spec = PortSpec::random_host(container);
            let reparsed: PortSpec = spec.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, spec);
        }

        #[test]
        fn parser_never_panics(s in "\\PC*") {
            let _ = s.parse::<PortSpec>();
        }
    }
}
