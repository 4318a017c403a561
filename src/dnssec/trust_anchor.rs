use crate::dns::{Dnskey, Name};
use crate::error::ConfigError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Root KSK-2017, key tag 20326
const ROOT_KSK_2017: &str = "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3\
    +/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kv\
    ArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF\
    0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+e\
    oZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfd\
    RUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwN\
    R1AkUTV74bU=";

/// A DNSKEY configured as axiomatically trusted for a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub zone: Name,
    pub key: Dnskey,
}

impl TrustAnchor {
    pub fn new(zone: Name, key: Dnskey) -> Self {
        Self { zone, key }
    }

    /// Build an anchor from presentation-style fields with a base64 key
    pub fn from_base64(
        zone: &str,
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: &str,
    ) -> Result<Self, ConfigError> {
        let compact: String = public_key.split_whitespace().collect();
        let public_key = STANDARD
            .decode(compact)
            .map_err(|e| ConfigError::InvalidTrustAnchor {
                zone: zone.to_string(),
                reason: e.to_string(),
            })?;
        if public_key.is_empty() {
            return Err(ConfigError::InvalidTrustAnchor {
                zone: zone.to_string(),
                reason: "empty public key".to_string(),
            });
        }

        Ok(Self {
            zone: Name::from_ascii(zone)?,
            key: Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
            },
        })
    }

    /// The IANA root key signing key
    pub fn root() -> Result<Self, ConfigError> {
        Self::from_base64(".", 257, 3, 8, ROOT_KSK_2017)
    }

    pub fn key_tag(&self) -> u16 {
        self.key.key_tag()
    }
}

/// Outcome of matching a DNSKEY set against the configured anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustMatch {
    /// One of the keys is an anchor for exactly this zone
    Exact,
    /// An anchor exists for an ancestor; keep walking up
    NotYet,
    /// No anchor can ever be reached from this zone
    NoMore,
}

/// Anchors ordered by decreasing zone-name length, most specific first
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorList {
    anchors: Vec<TrustAnchor>,
}

impl TrustAnchorList {
    pub fn new(mut anchors: Vec<TrustAnchor>) -> Self {
        anchors.sort_by(|a, b| b.zone.wire_len().cmp(&a.zone.wire_len()));
        Self { anchors }
    }

    pub fn push(&mut self, anchor: TrustAnchor) {
        let at = self
            .anchors
            .iter()
            .position(|a| a.zone.wire_len() < anchor.zone.wire_len())
            .unwrap_or(self.anchors.len());
        self.anchors.insert(at, anchor);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrustAnchor> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Decide whether any of `keys`, published at `zone`, is trusted.
    pub fn is_trusted(&self, zone: &Name, keys: &[Dnskey]) -> TrustMatch {
        let zone_len = zone.wire_len();

        // Longer anchor names can never match
        let mut rest = self
            .anchors
            .iter()
            .skip_while(|a| a.zone.wire_len() > zone_len)
            .peekable();

        while let Some(anchor) = rest.next_if(|a| a.zone.wire_len() == zone_len) {
            if anchor.zone == *zone && keys.iter().any(|key| *key == anchor.key) {
                debug!("Key for {} (tag {}) is a trust anchor", zone, anchor.key_tag());
                return TrustMatch::Exact;
            }
        }

        let shorter: Vec<&TrustAnchor> = rest.collect();
        let mut candidate = zone.parent();
        while let Some(ancestor) = candidate {
            if shorter.iter().any(|a| a.zone == ancestor) {
                trace!("Trust anchor at {} lies above {}", ancestor, zone);
                return TrustMatch::NotYet;
            }
            candidate = ancestor.parent();
        }

        debug!("No trust anchor can be reached above {}", zone);
        TrustMatch::NoMore
    }
}

/// Per-zone DNSSEC expectation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneExpectation {
    #[default]
    Validate,
    /// Accept data from the zone without validation
    Trusted,
    /// Never accept data from the zone
    Untrusted,
}

/// Zone security expectations, most specific zone first
#[derive(Debug, Clone, Default)]
pub struct ZonePolicy {
    zones: Vec<(Name, ZoneExpectation)>,
}

impl ZonePolicy {
    pub fn new(mut zones: Vec<(Name, ZoneExpectation)>) -> Self {
        zones.sort_by(|a, b| b.0.wire_len().cmp(&a.0.wire_len()));
        Self { zones }
    }

    /// Expectation of the longest configured zone `name` lies in
    pub fn expectation(&self, name: &Name) -> ZoneExpectation {
        self.zones
            .iter()
            .skip_while(|(zone, _)| zone.wire_len() > name.wire_len())
            .find(|(zone, _)| name.ends_with(zone))
            .map(|(_, expectation)| *expectation)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Everything the validator consults about local trust configuration
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub anchors: TrustAnchorList,
    pub zones: ZonePolicy,
}

impl Policy {
    pub fn new(anchors: TrustAnchorList, zones: ZonePolicy) -> Self {
        Self { anchors, zones }
    }

    /// Policy trusting only the IANA root key
    pub fn with_root_anchor() -> Result<Self, ConfigError> {
        Ok(Self {
            anchors: TrustAnchorList::new(vec![TrustAnchor::root()?]),
            zones: ZonePolicy::default(),
        })
    }
}

/// Shared, swappable policy. Readers take a snapshot per resolve call;
/// reloads replace the whole value.
#[derive(Debug, Default)]
pub struct PolicyHandle {
    current: RwLock<Arc<Policy>>,
}

impl PolicyHandle {
    pub fn new(policy: Policy) -> Self {
        Self {
            current: RwLock::new(Arc::new(policy)),
        }
    }

    pub fn snapshot(&self) -> Arc<Policy> {
        self.current.read().clone()
    }

    pub fn replace(&self, policy: Policy) {
        *self.current.write() = Arc::new(policy);
        debug!("Validation policy reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    fn key(byte: u8) -> Dnskey {
        Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: 8,
            public_key: vec![byte; 8],
        }
    }

    #[test]
    fn test_root_anchor_key_tag() {
        let root = TrustAnchor::root().unwrap();
        assert!(root.zone.is_root());
        assert_eq!(root.key_tag(), 20326);
    }

    #[test]
    fn test_list_sorted_most_specific_first() {
        let mut list = TrustAnchorList::new(vec![
            TrustAnchor::new(Name::root(), key(1)),
            TrustAnchor::new(name("example.com"), key(2)),
        ]);
        list.push(TrustAnchor::new(name("com"), key(3)));
        let zones: Vec<String> = list.iter().map(|a| a.zone.to_string()).collect();
        assert_eq!(zones, vec!["example.com.", "com.", "."]);
    }

    #[test]
    fn test_is_trusted_outcomes() {
        let list = TrustAnchorList::new(vec![TrustAnchor::new(name("example.com"), key(1))]);

        assert_eq!(list.is_trusted(&name("example.com"), &[key(9), key(1)]), TrustMatch::Exact);
        assert_eq!(list.is_trusted(&name("example.com"), &[key(2)]), TrustMatch::NoMore);
        assert_eq!(list.is_trusted(&name("sub.example.com"), &[key(1)]), TrustMatch::NotYet);
        assert_eq!(list.is_trusted(&name("example.net"), &[key(1)]), TrustMatch::NoMore);
        assert_eq!(list.is_trusted(&name("com"), &[key(1)]), TrustMatch::NoMore);
    }

    #[test]
    fn test_empty_list_is_no_more() {
        let list = TrustAnchorList::default();
        assert_eq!(list.is_trusted(&Name::root(), &[key(1)]), TrustMatch::NoMore);
    }

    #[test]
    fn test_zone_policy_longest_match() {
        let policy = ZonePolicy::new(vec![
            (name("example.com"), ZoneExpectation::Untrusted),
            (name("lab.example.com"), ZoneExpectation::Trusted),
        ]);
        assert_eq!(policy.expectation(&name("a.lab.example.com")), ZoneExpectation::Trusted);
        assert_eq!(policy.expectation(&name("www.example.com")), ZoneExpectation::Untrusted);
        assert_eq!(policy.expectation(&name("example.org")), ZoneExpectation::Validate);
    }

    #[test]
    fn test_policy_handle_swap() {
        let handle = PolicyHandle::new(Policy::default());
        let before = handle.snapshot();
        handle.replace(Policy::with_root_anchor().unwrap());
        assert!(before.anchors.is_empty());
        assert_eq!(handle.snapshot().anchors.len(), 1);
    }

    #[test]
    fn test_bad_base64_anchor() {
        assert!(TrustAnchor::from_base64("example.com", 257, 3, 8, "!!!").is_err());
    }
}
