//! Small validators: URLs, email addresses, IP addresses, IBANs and
//! numeric classification of strings.

use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;
use url::Url;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static IBAN_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{1,30}$").unwrap());
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d*\.\d+$").unwrap());

/// True when the input parses as an absolute URL with a host.
#[must_use]
pub fn url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(parsed) => parsed.has_host(),
        Err(_) => false,
    }
}

/// True for a plausibly-shaped email address (one `@`, a dotted domain,
/// no whitespace). Deliverability is not checked.
#[must_use]
pub fn email(input: &str) -> bool {
    EMAIL.is_match(input)
}

/// True when the input parses as an IP address. With `no_private`, loopback,
/// link-local, private-range and unspecified addresses are rejected.
#[must_use]
pub fn ip(input: &str, no_private: bool) -> bool {
    match input.parse::<IpAddr>() {
        Ok(address) => !(no_private && is_private(&address)),
        Err(_) => false,
    }
}

fn is_private(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(v4: &Ipv4Addr) -> bool {
    v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_unspecified()
        || v4.is_broadcast()
}

fn is_private_v6(v6: &Ipv6Addr) -> bool {
    // Unique-local fc00::/7 and link-local fe80::/10.
    let segments = v6.segments();
    v6.is_loopback()
        || v6.is_unspecified()
        || (segments[0] & 0xfe00) == 0xfc00
        || (segments[0] & 0xffc0) == 0xfe80
}

/// Validates an IBAN: normalizes spacing and case, checks the country /
/// check-digit / account shape, then verifies the ISO 7064 mod-97
/// checksum by moving the first four characters to the end, expanding
/// letters to numbers (A=10 .. Z=35) and streaming the remainder.
#[must_use]
pub fn iban(input: &str) -> bool {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if !IBAN_SHAPE.is_match(&normalized) {
        return false;
    }

    let rearranged = format!("{}{}", &normalized[4..], &normalized[..4]);
    let mut remainder: u32 = 0;
    for c in rearranged.chars() {
        let digits = match c.to_digit(36) {
            Some(d) => d,
            None => return false,
        };
        if digits < 10 {
            remainder = (remainder * 10 + digits) % 97;
        } else {
            // Letters expand to two digits.
            remainder = (remainder * 100 + digits) % 97;
        }
    }
    remainder == 1
}

/// True when the string parses as a finite number.
#[must_use]
pub fn is_number(input: &str) -> bool {
    input.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// True for a string of digits with an optional sign.
#[must_use]
pub fn is_integer(input: &str) -> bool {
    INTEGER.is_match(input)
}

/// True for a decimal fraction spelling like `1.5` or `-.25`.
#[must_use]
pub fn is_float(input: &str) -> bool {
    FLOAT.is_match(input)
}
