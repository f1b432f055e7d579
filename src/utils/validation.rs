//! Configuration validation utilities.
//!
//! This module provides validation functions for configuration
//! parameters: link profile strings, segment sizes and the address base.

use crate::ip::HOSTS_PER_SUBNET;
use crate::topology::LinkProfile;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

fn data_rate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]+(\.[0-9]+)?[kMG]?(bps|b/s)$").expect("valid data rate pattern")
    })
}

fn delay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]+(\.[0-9]+)?(ns|us|ms|s)$").expect("valid delay pattern")
    })
}

/// Validate a data rate string
///
/// Accepted forms are a number, an optional `k`, `M` or `G` multiplier and a
/// `bps` or `b/s` unit.
///
/// # Examples
/// ```
/// use topoplan::utils::validation::validate_data_rate;
///
/// assert!(validate_data_rate("100Mbps").is_ok());
/// assert!(validate_data_rate("500kb/s").is_ok());
/// assert!(validate_data_rate("fast").is_err());
/// ```
pub fn validate_data_rate(rate: &str) -> Result<(), String> {
    if data_rate_pattern().is_match(rate) {
        Ok(())
    } else {
        Err(format!(
            "Invalid data rate '{}' (expected e.g. '100Mbps' or '500kb/s')",
            rate
        ))
    }
}

/// Validate a propagation delay string
///
/// # Examples
/// ```
/// use topoplan::utils::validation::validate_delay;
///
/// assert!(validate_delay("6560ns").is_ok());
/// assert!(validate_delay("2ms").is_ok());
/// assert!(validate_delay("2 minutes").is_err());
/// ```
pub fn validate_delay(delay: &str) -> Result<(), String> {
    if delay_pattern().is_match(delay) {
        Ok(())
    } else {
        Err(format!(
            "Invalid delay '{}' (expected e.g. '6560ns' or '2ms')",
            delay
        ))
    }
}

/// Validate both halves of a link profile; absent values are engine defaults.
pub fn validate_link_profile(profile: &LinkProfile) -> Result<(), String> {
    if let Some(rate) = &profile.data_rate {
        validate_data_rate(rate)?;
    }
    if let Some(delay) = &profile.delay {
        validate_delay(delay)?;
    }
    Ok(())
}

/// Validate a generated node count against the configured maximum
///
/// # Arguments
/// * `what` - Label used in the error message, e.g. "hosts"
/// * `count` - Requested count
/// * `max` - Configured `max_segment_size`
pub fn validate_segment_size(what: &str, count: usize, max: usize) -> Result<(), String> {
    if count > max {
        return Err(format!(
            "{} {} exceeds the maximum segment size of {}",
            count, what, max
        ));
    }
    Ok(())
}

/// Validate the configured maximum segment size itself
pub fn validate_max_segment_size(max: usize) -> Result<(), String> {
    if max == 0 || max > HOSTS_PER_SUBNET {
        return Err(format!(
            "max_segment_size {} out of valid range (must be 1-{})",
            max, HOSTS_PER_SUBNET
        ));
    }
    Ok(())
}

/// Validate the base of the /24 address space
///
/// The base must be a private network address with a zero host octet and a
/// third octet in 1-254.
pub fn validate_address_base(base: Ipv4Addr) -> Result<(), String> {
    let octets = base.octets();
    if !base.is_private() {
        return Err(format!("Address base {} is not in private address space", base));
    }
    if octets[3] != 0 {
        return Err(format!("Address base {} must end in .0", base));
    }
    if octets[2] == 0 || octets[2] == 255 {
        return Err(format!(
            "Address base {} must have a third octet between 1 and 254",
            base
        ));
    }
    Ok(())
}
