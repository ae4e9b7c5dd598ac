//! Configuration validation.
//!
//! Structural problems that would make every recompute meaningless (location,
//! timezone, recompute time) are errors. Problems that only affect a single
//! schedule entry or rule are warnings: the entry is kept and the resolver
//! deals with it at the granularity of one action.

use anyhow::Result;
use chrono_tz::Tz;

use super::Config;
use crate::constants::*;
use crate::schedule::expression::parse_clock_time;

/// Validate a parsed configuration, logging non-fatal findings.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_location(config)?;

    if let Some(recompute_at) = &config.recompute_at
        && parse_clock_time(recompute_at).is_none()
    {
        anyhow::bail!("recompute_at must be a clock time like \"01:00\" (got \"{recompute_at}\")");
    }

    for warning in collect_warnings(config) {
        log_warning!("{warning}");
    }

    Ok(())
}

fn validate_location(config: &Config) -> Result<()> {
    if !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&config.latitude) {
        anyhow::bail!(
            "latitude must be between {MINIMUM_LATITUDE} and {MAXIMUM_LATITUDE} degrees (got {})",
            config.latitude
        );
    }

    if !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&config.longitude) {
        anyhow::bail!(
            "longitude must be between {MINIMUM_LONGITUDE} and {MAXIMUM_LONGITUDE} degrees (got {})",
            config.longitude
        );
    }

    match (&config.timezone, config.utc_offset) {
        (Some(name), _) if name.parse::<Tz>().is_err() => {
            anyhow::bail!("Unknown timezone \"{name}\" (expected an IANA name like \"Europe/Paris\")");
        }
        (None, Some(hours)) if !(MINIMUM_UTC_OFFSET..=MAXIMUM_UTC_OFFSET).contains(&hours) => {
            anyhow::bail!(
                "utc_offset must be between {MINIMUM_UTC_OFFSET} and {MAXIMUM_UTC_OFFSET} hours (got {hours})"
            );
        }
        (None, None) => {
            anyhow::bail!("Either timezone or utc_offset must be set");
        }
        _ => Ok(()),
    }
}

/// Non-fatal problems in the configuration, one message each.
pub fn collect_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.timezone.is_some() && config.utc_offset.is_some() {
        warnings.push("Both timezone and utc_offset are set; utc_offset is ignored".to_string());
    }

    for (name, address) in &config.devices {
        if address.trim().is_empty() {
            warnings.push(format!("Device '{name}' has an empty address"));
        }
    }

    for (index, entry) in config.schedules.iter().enumerate() {
        let position = index + 1;

        for day in entry.days.iter().filter(|d| !WEEKDAY_NAMES.contains(&d.as_str())) {
            warnings.push(format!(
                "Schedule #{position}: unknown weekday '{day}' (expected Monday..Sunday)"
            ));
        }

        match entry.event.as_deref() {
            Some(label) if !config.events.contains_key(label) => {
                warnings.push(format!(
                    "Schedule #{position}: event '{label}' is not declared in [events]"
                ));
            }
            None if entry.days.is_empty() => {
                warnings.push(format!(
                    "Schedule #{position} has neither days nor event and is never selected"
                ));
            }
            _ => {}
        }

        for rule in entry.open.iter().chain(&entry.close) {
            for name in rule.shutters.iter().filter(|n| !config.devices.contains_key(*n)) {
                warnings.push(format!(
                    "Schedule #{position}: shutter '{name}' is not declared in [devices]"
                ));
            }
        }
    }

    let active = config.events.values().filter(|on| **on).count();
    if active > 1 {
        warnings.push(format!(
            "{active} events are active; only the first in alphabetical order applies"
        ));
    }

    warnings
}
