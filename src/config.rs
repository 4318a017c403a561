use crate::dns::Name;
use crate::dnssec::{Policy, TrustAnchor, TrustAnchorList, ZoneExpectation, ZonePolicy};
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Budget of outer resolve-loop iterations per resolve call
    pub max_rounds: usize,

    /// Maximum number of queries the query chain may grow to
    pub max_queries: usize,

    /// Maximum number of steps when walking a trust chain
    pub max_chain_depth: usize,

    /// Seconds of clock skew tolerated on RRSIG validity windows
    pub clock_skew: u32,

    /// Whether previously seen RRsets answer queries before the transport
    pub cache_enabled: bool,

    /// Maximum number of cached RRsets
    pub cache_max_entries: usize,

    /// Lower TTL clamp for cached RRsets
    pub cache_min_ttl: u32,

    /// Upper TTL clamp for cached RRsets
    pub cache_max_ttl: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 256,
            max_queries: 512,
            max_chain_depth: 32,
            clock_skew: 0,
            cache_enabled: true,
            cache_max_entries: 10_000,
            cache_min_ttl: 0,
            cache_max_ttl: 86_400,
        }
    }
}

impl ValidatorConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("DNSVAL_MAX_ROUNDS") {
            config.max_rounds = parse_count("max_rounds", &value)?;
        }

        if let Ok(value) = std::env::var("DNSVAL_MAX_QUERIES") {
            config.max_queries = parse_count("max_queries", &value)?;
        }

        if let Ok(value) = std::env::var("DNSVAL_MAX_CHAIN_DEPTH") {
            config.max_chain_depth = parse_count("max_chain_depth", &value)?;
        }

        if let Ok(value) = std::env::var("DNSVAL_CLOCK_SKEW") {
            config.clock_skew = value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                field: "clock_skew",
                value: value.clone(),
            })?;
        }

        if let Ok(value) = std::env::var("DNSVAL_CACHE_ENABLED") {
            config.cache_enabled = parse_bool(&value, true);
        }

        if let Ok(value) = std::env::var("DNSVAL_CACHE_MAX_ENTRIES") {
            config.cache_max_entries = parse_count("cache_max_entries", &value)?;
        }

        if let Ok(value) = std::env::var("DNSVAL_CACHE_MIN_TTL") {
            config.cache_min_ttl = value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                field: "cache_min_ttl",
                value: value.clone(),
            })?;
        }

        if let Ok(value) = std::env::var("DNSVAL_CACHE_MAX_TTL") {
            config.cache_max_ttl = value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                field: "cache_max_ttl",
                value: value.clone(),
            })?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 || self.max_rounds > 100_000 {
            return Err(ConfigError::InvalidValue {
                field: "max_rounds",
                value: self.max_rounds.to_string(),
            });
        }

        if self.max_queries < 4 || self.max_queries > 100_000 {
            return Err(ConfigError::InvalidValue {
                field: "max_queries",
                value: self.max_queries.to_string(),
            });
        }

        // One step per zone cut plus the DS/DNSKEY pair, 128 labels at most
        if self.max_chain_depth == 0 || self.max_chain_depth > 512 {
            return Err(ConfigError::InvalidValue {
                field: "max_chain_depth",
                value: self.max_chain_depth.to_string(),
            });
        }

        if self.cache_max_entries == 0 || self.cache_max_entries > 10_000_000 {
            return Err(ConfigError::InvalidValue {
                field: "cache_max_entries",
                value: self.cache_max_entries.to_string(),
            });
        }

        if self.cache_min_ttl > self.cache_max_ttl {
            return Err(ConfigError::InvalidValue {
                field: "cache_min_ttl",
                value: format!("{} > cache_max_ttl {}", self.cache_min_ttl, self.cache_max_ttl),
            });
        }

        Ok(())
    }
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_count(field: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrustAnchorEntry {
    zone: String,
    #[serde(default = "default_anchor_flags")]
    flags: u16,
    #[serde(default = "default_anchor_protocol")]
    protocol: u8,
    algorithm: u8,
    public_key: String,
}

fn default_anchor_flags() -> u16 {
    257
}

fn default_anchor_protocol() -> u8 {
    3
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ZoneSecurityEntry {
    zone: String,
    expectation: ZoneExpectation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    trust_anchor: Vec<TrustAnchorEntry>,
    #[serde(default)]
    zone_security: Vec<ZoneSecurityEntry>,
}

/// Parse a validation policy from TOML text.
///
/// ```toml
/// [[trust_anchor]]
/// zone = "example.com"
/// algorithm = 13
/// public_key = "..."
///
/// [[zone_security]]
/// zone = "lab.example.com"
/// expectation = "trusted"
/// ```
pub fn parse_policy(text: &str) -> Result<Policy, ConfigError> {
    let file: PolicyFile = toml::from_str(text)?;

    let anchors = file
        .trust_anchor
        .iter()
        .map(|entry| {
            TrustAnchor::from_base64(
                &entry.zone,
                entry.flags,
                entry.protocol,
                entry.algorithm,
                &entry.public_key,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let zones = file
        .zone_security
        .iter()
        .map(|entry| Ok((Name::from_ascii(&entry.zone)?, entry.expectation)))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    debug!(
        "Loaded policy with {} trust anchors and {} zone expectations",
        anchors.len(),
        zones.len()
    );

    Ok(Policy::new(TrustAnchorList::new(anchors), ZonePolicy::new(zones)))
}

/// Load a validation policy file from disk
pub fn load_policy(path: impl AsRef<Path>) -> Result<Policy, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    debug!("Reading policy from {}", path.display());
    parse_policy(&text)
}
