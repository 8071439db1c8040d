//! DNS record validation.
//!
//! Records are stored as declared; nothing here talks to a DNS provider.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::DnsRecordType;

pub const DEFAULT_TTL: i64 = 3600;
pub const MIN_TTL: i64 = 60;
pub const MAX_TTL: i64 = 86_400;
pub const MAX_TXT_LEN: usize = 255;
const MAX_HOSTNAME_LEN: usize = 253;
const CAA_PREFIXES: &[&str] = &[
    "0 issue ",
    "0 issuewild ",
    "0 iodef ",
    "128 issue ",
    "128 issuewild ",
    "128 iodef ",
];

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*\.)?([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}\.?$")
        .expect("hostname regex")
});

static RECORD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(@|\*|(\*\.)?[A-Za-z0-9_]([A-Za-z0-9_-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9_]([A-Za-z0-9_-]{0,61}[A-Za-z0-9])?)*)$",
    )
    .expect("record name regex")
});

/// A record as submitted, before it is stored.
#[derive(Debug, Clone)]
pub struct RecordInput<'a> {
    pub record_type: DnsRecordType,
    pub name: &'a str,
    pub value: &'a str,
    pub ttl: i64,
    pub priority: Option<i64>,
}

/// Returns true for a fully qualified host name such as `www.example.com`.
#[must_use]
pub fn is_valid_hostname(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_HOSTNAME_LEN && HOSTNAME.is_match(value)
}

/// Validates a record against the rules of its declared type.
pub fn validate_record(input: &RecordInput<'_>) -> Result<(), String> {
    if !RECORD_NAME.is_match(input.name) {
        return Err(format!("Invalid record name '{}'", input.name));
    }
    if !(MIN_TTL..=MAX_TTL).contains(&input.ttl) {
        return Err(format!("TTL must be between {MIN_TTL} and {MAX_TTL} seconds"));
    }

    let value = input.value.trim();
    if value.is_empty() {
        return Err("Record value cannot be empty".to_string());
    }

    match input.record_type {
        DnsRecordType::A => {
            value
                .parse::<Ipv4Addr>()
                .map_err(|_| format!("'{value}' is not a valid IPv4 address"))?;
        }
        DnsRecordType::Aaaa => {
            value
                .parse::<Ipv6Addr>()
                .map_err(|_| format!("'{value}' is not a valid IPv6 address"))?;
        }
        DnsRecordType::Cname | DnsRecordType::Ns | DnsRecordType::Ptr => {
            require_hostname(value)?;
        }
        DnsRecordType::Mx => {
            require_priority(input.priority, "MX")?;
            require_hostname(value)?;
        }
        DnsRecordType::Srv => {
            require_priority(input.priority, "SRV")?;
            validate_srv_target(value)?;
        }
        DnsRecordType::Txt => {
            if value.len() > MAX_TXT_LEN {
                return Err(format!("TXT value cannot exceed {MAX_TXT_LEN} characters"));
            }
        }
        DnsRecordType::Caa => {
            if !CAA_PREFIXES.iter().any(|p| value.starts_with(p)) {
                return Err(
                    "CAA value must start with a flag and tag, e.g. '0 issue \"letsencrypt.org\"'"
                        .to_string(),
                );
            }
        }
    }

    Ok(())
}

fn require_hostname(value: &str) -> Result<(), String> {
    if is_valid_hostname(value) {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid domain name"))
    }
}

fn require_priority(priority: Option<i64>, kind: &str) -> Result<(), String> {
    match priority {
        None => Err(format!("{kind} records require a priority")),
        Some(p) if !(0..=i64::from(u16::MAX)).contains(&p) => {
            Err(format!("{kind} priority must be between 0 and 65535"))
        }
        Some(_) => Ok(()),
    }
}

/// SRV values carry `<weight> <port> <target>`.
fn validate_srv_target(value: &str) -> Result<(), String> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [weight, port, target] = parts.as_slice() else {
        return Err("SRV value must be '<weight> <port> <target>'".to_string());
    };
    if weight.parse::<u16>().is_err() {
        return Err(format!("SRV weight '{weight}' must be between 0 and 65535"));
    }
    if port.parse::<u16>().is_err() {
        return Err(format!("SRV port '{port}' must be between 0 and 65535"));
    }
    require_hostname(target)
}
