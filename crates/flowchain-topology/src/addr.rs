//! Address family classification and prefix validation.
//!
//! Mirrors the RFC 4291 textual forms (including embedded-v4 and
//! zone-id suffixes) the original flowchain controller recognised, but
//! enforces octet bounds strictly rather than the lax `\d{1,3}` the
//! Python source used (see DESIGN.md).

use flowchain_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static V4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$")
        .expect("static v4 regex is valid")
});

static V6_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(",
        r"(([0-9a-f]{1,4}:){7}([0-9a-f]{1,4}|:))|",
        r"(([0-9a-f]{1,4}:){6}(:[0-9a-f]{1,4}|((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3})|:))|",
        r"(([0-9a-f]{1,4}:){5}(((:[0-9a-f]{1,4}){1,2})|:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3})|:))|",
        r"(([0-9a-f]{1,4}:){4}(((:[0-9a-f]{1,4}){1,3})|((:[0-9a-f]{1,4})?:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|",
        r"(([0-9a-f]{1,4}:){3}(((:[0-9a-f]{1,4}){1,4})|((:[0-9a-f]{1,4}){0,2}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|",
        r"(([0-9a-f]{1,4}:){2}(((:[0-9a-f]{1,4}){1,5})|((:[0-9a-f]{1,4}){0,3}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|",
        r"(([0-9a-f]{1,4}:){1}(((:[0-9a-f]{1,4}){1,6})|((:[0-9a-f]{1,4}){0,4}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))|",
        r"(:(((:[0-9a-f]{1,4}){1,7})|((:[0-9a-f]{1,4}){0,5}:((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}))|:))",
        r")(%.+)?$"
    ))
    .expect("static v6 regex is valid")
});

/// Address family, or `None` if the literal is neither a valid IPv4 nor IPv6 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// Dotted-quad IPv4 literal.
    V4,
    /// RFC 4291 IPv6 literal, possibly with an embedded IPv4 tail or zone-id suffix.
    V6,
}

/// Classify an address literal as v4, v6, or neither.
pub fn ip_version(addr: &str) -> Option<IpVersion> {
    let addr = addr.trim();
    if V4_RE.is_match(addr) {
        return Some(IpVersion::V4);
    }
    if V6_RE.is_match(&addr.to_ascii_lowercase()) {
        return Some(IpVersion::V6);
    }
    None
}

/// Validate a `<address>/<length>` CIDR literal.
///
/// Returns `Ok(())` when the address classifies as v4/v6 and the prefix
/// length is within `0..=32` (v4) or `0..=128` (v6). Any other shape is
/// `Err(Error::InvalidPrefix)`.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    let mut parts = prefix.splitn(2, '/');
    let (addr, len) = match (parts.next(), parts.next()) {
        (Some(addr), Some(len)) => (addr, len),
        _ => return Err(Error::InvalidPrefix(prefix.to_string())),
    };

    let preflen: i64 = len
        .parse()
        .map_err(|_| Error::InvalidPrefix(prefix.to_string()))?;

    match ip_version(addr) {
        Some(IpVersion::V4) if (0..=32).contains(&preflen) => Ok(()),
        Some(IpVersion::V6) if (0..=128).contains(&preflen) => Ok(()),
        _ => Err(Error::InvalidPrefix(prefix.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_v4() {
        assert_eq!(ip_version("10.1.5.0"), Some(IpVersion::V4));
        assert_eq!(ip_version("255.255.255.255"), Some(IpVersion::V4));
    }

    #[test]
    fn rejects_out_of_range_v4_octets() {
        assert_eq!(ip_version("256.1.1.1"), None);
        assert_eq!(ip_version("999.1.1.1"), None);
    }

    #[test]
    fn classifies_v6() {
        assert_eq!(ip_version("2001:db8::1"), Some(IpVersion::V6));
        assert_eq!(ip_version("::"), Some(IpVersion::V6));
        assert_eq!(ip_version("fe80::1%eth0"), Some(IpVersion::V6));
        assert_eq!(ip_version("::ffff:192.168.1.1"), Some(IpVersion::V6));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(ip_version("not-an-address"), None);
    }

    #[test]
    fn validates_prefix_bounds() {
        assert!(validate_prefix("10.1.5.0/24").is_ok());
        assert!(validate_prefix("10.1.5.0/33").is_err());
        assert!(validate_prefix("2001:db8::/32").is_ok());
        assert!(validate_prefix("2001:db8::/129").is_err());
        assert!(validate_prefix("10.1.5.0").is_err());
        assert!(validate_prefix("10.1.5.0/abc").is_err());
    }
}
