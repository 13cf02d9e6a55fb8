//! Health-check report parsing
//!
//! Turns the document emitted by the external watch process into a flat list
//! of `(tag, address)` observations.
//!
//! ## Format
//!
//! ```json
//! {
//!   "global-ip": {
//!     "CheckID": "global-ip",
//!     "Status": "passing",
//!     "Instances": [
//!       { "Node": "web-1", "Tags": ["svc-a"], "Addresses": ["1.2.3.4"] },
//!       { "Node": "web-2", "Tags": ["svc-a"], "Address": "5.6.7.8" }
//!     ]
//!   }
//! }
//! ```
//!
//! Checks are visited in ascending name order; instances, tags and addresses
//! in document order.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::net::IpAddr;
use tracing::{debug, warn};

/// One `(tag, address)` pair extracted from a report
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    /// Tag carried by the reporting instance
    pub tag: String,
    /// Canonical textual form of the address
    pub address: String,
}

impl Observation {
    pub fn new(tag: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            address: address.into(),
        }
    }
}

/// Parsed health-check report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    target_check: Option<String>,
    observations: Vec<Observation>,
}

impl CheckReport {
    /// Build a report from already extracted observations
    pub fn new(target_check: Option<String>, observations: Vec<Observation>) -> Self {
        Self {
            target_check,
            observations,
        }
    }

    /// Check identifier the observations were restricted to, if any
    pub fn target_check(&self) -> Option<&str> {
        self.target_check.as_deref()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Addresses of every observation carrying `tag`, in report order
    pub fn addresses_for_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.observations
            .iter()
            .filter(move |obs| obs.tag == tag)
            .map(|obs| obs.address.as_str())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CheckStatus {
    #[serde(rename = "CheckID", default)]
    check_id: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "Instances", default)]
    instances: Option<Vec<ServiceInstance>>,
}

#[derive(Debug, Deserialize)]
struct ServiceInstance {
    #[serde(rename = "Node", default)]
    node: Option<String>,
    #[serde(rename = "Tags", default)]
    tags: Option<Vec<String>>,
    #[serde(rename = "Addresses", default)]
    addresses: Option<OneOrMany>,
    #[serde(rename = "Address", default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl ServiceInstance {
    fn raw_addresses(&self) -> Vec<&str> {
        let mut out: Vec<&str> = match &self.addresses {
            Some(OneOrMany::One(addr)) => vec![addr.as_str()],
            Some(OneOrMany::Many(addrs)) => addrs.iter().map(String::as_str).collect(),
            None => Vec::new(),
        };
        if let Some(addr) = &self.address {
            out.push(addr.as_str());
        }
        out
    }
}

/// Parse a raw report
///
/// # Parameters
///
/// - `input`: The raw report bytes
/// - `target_check`: Restrict observations to this check identifier
///
/// # Returns
///
/// - `Ok(CheckReport)`: The parsed report
/// - `Err(Error::EmptyInput)`: The stream held no data
/// - `Err(Error::Parse)`: The document is malformed
pub fn parse_report(input: &[u8], target_check: Option<&str>) -> Result<CheckReport> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyInput);
    }

    let checks: BTreeMap<String, CheckStatus> = serde_json::from_slice(input)
        .map_err(|e| Error::parse(format!("malformed health-check report: {}", e)))?;

    let mut observations = Vec::new();
    let mut matched_target = false;

    for (name, check) in &checks {
        let check_id = check.check_id.as_deref().unwrap_or(name);

        if let Some(target) = target_check {
            if check_id != target {
                debug!("Ignoring check {} (target is {})", check_id, target);
                continue;
            }
            matched_target = true;
        }

        debug!(
            "Reading check {} (status: {})",
            check_id,
            check.status.as_deref().unwrap_or("unknown")
        );

        for (index, instance) in check.instances.iter().flatten().enumerate() {
            let raw = instance.raw_addresses();
            if raw.is_empty() {
                return Err(Error::parse(format!(
                    "check {}: instance {} ({}) has no address",
                    check_id,
                    index,
                    instance.node.as_deref().unwrap_or("unnamed node")
                )));
            }

            let mut addresses = Vec::with_capacity(raw.len());
            for addr in raw {
                addresses.push(normalize_address(check_id, addr)?);
            }

            for tag in instance.tags.iter().flatten() {
                for address in &addresses {
                    observations.push(Observation::new(tag.clone(), address.clone()));
                }
            }
        }
    }

    if let Some(target) = target_check
        && !matched_target
    {
        warn!("Check {} is not present in the report", target);
    }

    Ok(CheckReport::new(target_check.map(str::to_string), observations))
}

/// Read a whole report from a stream and parse it
pub fn read_report<R: Read>(mut reader: R, target_check: Option<&str>) -> Result<CheckReport> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_report(&buf, target_check)
}

fn normalize_address(check_id: &str, raw: &str) -> Result<String> {
    raw.trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| {
            Error::parse(format!(
                "check {}: '{}' is not a valid IP address",
                check_id, raw
            ))
        })
}
