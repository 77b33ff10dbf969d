//! Canonical issuer selection
//!
//! Discovery metadata and every issued id_token must agree on `iss`, so both
//! derive it from the request host through [`canonical_issuer`].

/// Issuer URLs per environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    pub production_issuer: String,
    pub staging_issuer: String,
    /// Hosts equal to this, or ending in `.<suffix>`, are staging
    pub staging_host_suffix: String,
}

/// Split `host[:port]` into the bare hostname, keeping IPv6 brackets.
fn hostname(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

fn is_local(name: &str) -> bool {
    matches!(name, "localhost" | "127.0.0.1" | "[::1]") || name.ends_with(".localhost")
}

/// Issuer for a request arriving on `host` (the `Host` header value).
///
/// Local development hosts pass through as `http://<host>[:port]`; staging
/// hosts map to the staging issuer; everything else, unknown hosts included,
/// maps to the single production issuer.
pub fn canonical_issuer(host: &str, config: &IssuerConfig) -> String {
    let host = host.trim().to_ascii_lowercase();
    let name = hostname(&host);

    if is_local(name) {
        return format!("http://{}", host);
    }

    let suffix = config.staging_host_suffix.to_ascii_lowercase();
    let staging = !suffix.is_empty()
        && (name == suffix || name.strip_suffix(suffix.as_str()).is_some_and(|rest| rest.ends_with('.')));
    if staging {
        config.staging_issuer.clone()
    } else {
        config.production_issuer.clone()
    }
}
