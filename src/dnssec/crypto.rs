use super::algorithm::DnsSecAlgorithm;
use super::digest::{DigestType, dnskey_digest};
use crate::dns::{Dnskey, Ds, Name, RRset, Rrsig};
use ring::signature::{RsaPublicKeyComponents, UnparsedPublicKey};
use tracing::trace;

/// Cryptographic capability the validator calls into.
///
/// Implementations only answer "does this check out"; every policy
/// decision (validity windows, key tags, zone flags) is made before the
/// validator gets here.
pub trait SignatureVerifier: Send + Sync {
    /// Check `sig` over `rrset` with `key`
    fn verify_signature(&self, key: &Dnskey, rrset: &RRset, sig: &Rrsig) -> bool;

    /// Check that `ds` commits to `key` published at `owner`
    fn ds_matches(&self, owner: &Name, key: &Dnskey, ds: &Ds) -> bool;

    /// Whether signatures made with `algorithm` can be checked at all
    fn supports(&self, algorithm: u8) -> bool;
}

/// Build the data an RRSIG signs: the RRSIG rdata without the signature,
/// then every record of the set in canonical form (RFC 4034 §3.1.8.1).
///
/// If the signature's label count is lower than the owner's, the owner
/// is rewritten to the wildcard that was expanded.
pub fn signed_data(rrset: &RRset, sig: &Rrsig) -> Vec<u8> {
    let mut data = sig.signed_prefix();

    let owner = if (sig.labels as usize) < rrset.name.label_count() {
        rrset
            .name
            .trim_to(sig.labels as usize)
            .prepend_wildcard()
            .unwrap_or_else(|_| rrset.name.clone())
    } else {
        rrset.name.clone()
    };

    let mut records: Vec<&[u8]> = rrset.data.iter().map(|rr| rr.rdata.as_ref()).collect();
    records.sort_unstable();
    records.dedup();

    for rdata in records {
        data.extend_from_slice(owner.as_wire());
        data.extend_from_slice(&rrset.rtype.to_u16().to_be_bytes());
        data.extend_from_slice(&u16::from(rrset.class).to_be_bytes());
        data.extend_from_slice(&sig.original_ttl.to_be_bytes());
        data.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        data.extend_from_slice(rdata);
    }

    data
}

/// Split an RFC 3110 RSA public key into (exponent, modulus)
fn split_rsa_key(key: &[u8]) -> Option<(&[u8], &[u8])> {
    let (&first, rest) = key.split_first()?;
    let (exp_len, rest) = if first == 0 {
        if rest.len() < 2 {
            return None;
        }
        (u16::from_be_bytes([rest[0], rest[1]]) as usize, &rest[2..])
    } else {
        (first as usize, rest)
    };
    if exp_len == 0 || rest.len() <= exp_len {
        return None;
    }
    Some(rest.split_at(exp_len))
}

/// [`SignatureVerifier`] backed by `ring`
#[derive(Debug, Default, Clone, Copy)]
pub struct RingVerifier;

impl RingVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for RingVerifier {
    fn verify_signature(&self, key: &Dnskey, rrset: &RRset, sig: &Rrsig) -> bool {
        let Some(algorithm) = DnsSecAlgorithm::from_u8(sig.algorithm) else {
            return false;
        };
        let message = signed_data(rrset, sig);

        let verified = if let Some(params) = algorithm.rsa_parameters() {
            match split_rsa_key(&key.public_key) {
                Some((e, n)) => RsaPublicKeyComponents { n, e }
                    .verify(params, &message, &sig.signature)
                    .is_ok(),
                None => false,
            }
        } else if let Some(verify_alg) = algorithm.ring_algorithm() {
            let public_key = match algorithm {
                // ring expects an uncompressed SEC1 point
                DnsSecAlgorithm::EcdsaP256Sha256 | DnsSecAlgorithm::EcdsaP384Sha384 => {
                    let mut point = Vec::with_capacity(key.public_key.len() + 1);
                    point.push(0x04);
                    point.extend_from_slice(&key.public_key);
                    point
                }
                _ => key.public_key.clone(),
            };
            UnparsedPublicKey::new(verify_alg, &public_key)
                .verify(&message, &sig.signature)
                .is_ok()
        } else {
            false
        };

        trace!(
            "{} signature by {} tag {} over {} {}: {}",
            algorithm,
            sig.signer,
            sig.key_tag,
            rrset.name,
            rrset.rtype,
            if verified { "ok" } else { "failed" }
        );
        verified
    }

    fn ds_matches(&self, owner: &Name, key: &Dnskey, ds: &Ds) -> bool {
        if ds.algorithm != key.algorithm || ds.key_tag != key.key_tag() {
            return false;
        }
        let Some(digest_type) = DigestType::from_u8(ds.digest_type) else {
            return false;
        };
        dnskey_digest(owner, key, digest_type).is_some_and(|digest| digest == ds.digest)
    }

    fn supports(&self, algorithm: u8) -> bool {
        DnsSecAlgorithm::from_u8(algorithm).is_some_and(|alg| alg.is_supported())
    }
}
