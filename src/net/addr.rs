//! Host/port helpers and address list normalization.
//!
//! # Responsibilities
//! - Split and join `host:port` strings (bracketed IPv6 aware)
//! - Append a default port to entries that lack one
//! - Remove textual duplicates while keeping first-occurrence order
//!
//! Nothing here resolves hostnames or checks reachability. Entries the
//! splitter cannot make sense of are treated as "no port" and get the
//! default port joined on.

use std::collections::HashSet;

/// Split `addr` into host and port.
///
/// Accepts `host:port`, `[v6-host]:port` and `:port`. Returns `None` when no
/// port is present or the string is malformed (e.g. a bare IPv6 literal).
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    let colon = addr.rfind(':')?;
    let port = &addr[colon + 1..];

    if let Some(rest) = addr.strip_prefix('[') {
        // "]" must be immediately followed by the port separator.
        if let Some(end) = rest.rfind(']') {
            if end + 2 == colon {
                return Some((&rest[..end], port));
            }
        }
    }

    let host = &addr[..colon];
    if host.contains(':') {
        return None;
    }
    Some((host, port))
}

/// Join host and port, bracketing hosts that contain a colon.
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Return `addr` with `default_port` appended if it has no port.
pub fn normalize_address(addr: &str, default_port: &str) -> String {
    match split_host_port(addr) {
        Some(_) => addr.to_string(),
        None => join_host_port(addr, default_port),
    }
}

/// Normalize every entry with `default_port` and drop duplicates.
pub fn normalize_addresses<I, S>(addrs: I, default_port: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    addrs
        .into_iter()
        .map(|addr| normalize_address(addr.as_ref(), default_port))
        .filter(|addr| seen.insert(addr.clone()))
        .collect()
}
