//! Prevent the relay from forwarding to itself.

use url::Url;

/// Whether `target` names the same hostname and path the request arrived on.
///
/// This is a literal comparison. Ports, trailing slashes, and queries are not
/// considered, so `https://relay.example:8443/hook/` does not match a request
/// to `relay.example/hook`, whilst `http://relay.example:1/hook` does.
/// Hostnames compare case-insensitively, as URL parsing lowercases them.
pub fn is_self_target(inbound_host: Option<&str>, inbound_path: &str, target: &Url) -> bool {
    match (inbound_host, target.host_str()) {
        (Some(ours), Some(theirs)) => {
            ours.eq_ignore_ascii_case(theirs) && inbound_path == target.path()
        }
        _ => false,
    }
}
