//! Managed domains
//!
//! A domain spec is either `fqdn` or `fqdn:tag`. The tag selects which report
//! observations feed the domain's record. A bare `fqdn` selects observations
//! tagged with the FQDN itself.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Separator between FQDN and tag in a domain spec
pub const TAG_SEPARATOR: char = ':';

/// A configured DNS name plus the tag selecting its addresses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    /// Fully-qualified domain name, lower-case, without trailing dot
    pub fqdn: String,
    /// Observation tag feeding this domain
    pub tag: String,
}

impl Domain {
    /// Parse a single `fqdn` or `fqdn:tag` spec
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(Error::validation("domain spec cannot be empty"));
        }

        let (name, tag) = match spec.split_once(TAG_SEPARATOR) {
            Some((name, tag)) => {
                let tag = tag.trim();
                if tag.is_empty() {
                    return Err(Error::validation(format!("empty tag in '{}'", spec)));
                }
                if tag.contains(TAG_SEPARATOR) {
                    return Err(Error::validation(format!(
                        "tag in '{}' must not contain '{}'",
                        spec, TAG_SEPARATOR
                    )));
                }
                (name.trim(), Some(tag))
            }
            None => (spec, None),
        };

        let fqdn = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();
        validate_domain_name(&fqdn)?;

        let tag = tag.map(str::to_string).unwrap_or_else(|| fqdn.clone());
        Ok(Self { fqdn, tag })
    }

    /// Record name with the trailing root dot
    pub fn absolute_name(&self) -> String {
        format!("{}.", self.fqdn)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag == self.fqdn {
            write!(f, "{}", self.fqdn)
        } else {
            write!(f, "{}{}{}", self.fqdn, TAG_SEPARATOR, self.tag)
        }
    }
}

/// Build the ordered domain list from configuration strings
///
/// Input order is preserved; it is the order domains are reconciled in.
pub fn build_domains<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Domain>> {
    if specs.is_empty() {
        return Err(Error::validation("at least one domain is required"));
    }

    let mut seen = HashSet::new();
    let mut domains = Vec::with_capacity(specs.len());

    for spec in specs {
        let domain = Domain::parse(spec.as_ref())?;
        if !seen.insert(domain.fqdn.clone()) {
            return Err(Error::validation(format!(
                "domain {} is configured more than once",
                domain.fqdn
            )));
        }
        domains.push(domain);
    }

    Ok(domains)
}

/// Validate that a string is a well-formed domain name (RFC 1035 shape)
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::validation("domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::validation(format!(
            "domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::validation(format!(
                "domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::validation(format!(
                "domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::validation(format!(
                "domain label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::validation(format!(
                "domain label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}
