//! Shared fixtures for the integration tests.
//!
//! Builds a small signed hierarchy (`com` anchored, `example.com` delegated
//! through a DS) served by a [`StaticTransport`]. Signatures are checked by
//! [`FakeVerifier`], so fixtures never need real key material.

#![allow(dead_code)] // Not every test file uses every helper

use dnsval::dns::{
    Dnskey, Ds, Name, Nsec, RRset, RecordClass, RecordType, Rrsig, Section,
};
use dnsval::dnssec::{Policy, SignatureVerifier, TrustAnchor, TrustAnchorList, ZonePolicy};
use dnsval::transport::{Response, StaticTransport};
use dnsval::validator::Validator;
use dnsval::config::ValidatorConfig;
use std::sync::Arc;

/// Validation time used by every fixture
pub const NOW: u32 = 1_700_000_000;

pub const GOOD_SIGNATURE: &[u8] = b"valid";
pub const BAD_SIGNATURE: &[u8] = b"bogus";

/// Accepts every signature except [`BAD_SIGNATURE`]. A DS matches a key
/// when its digest equals the key's public key bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeVerifier;

impl SignatureVerifier for FakeVerifier {
    fn verify_signature(&self, _key: &Dnskey, _rrset: &RRset, sig: &Rrsig) -> bool {
        sig.signature != BAD_SIGNATURE
    }

    fn ds_matches(&self, _owner: &Name, key: &Dnskey, ds: &Ds) -> bool {
        ds.digest == key.public_key
    }

    fn supports(&self, _algorithm: u8) -> bool {
        true
    }
}

pub fn name(s: &str) -> Name {
    Name::from_ascii(s).unwrap()
}

/// Zone signing key whose bytes are derived from `seed`
pub fn zone_key(seed: u8) -> Dnskey {
    Dnskey {
        flags: 257,
        protocol: 3,
        algorithm: 13,
        public_key: vec![seed; 32],
    }
}

pub fn com_key() -> Dnskey {
    zone_key(0xc0)
}

pub fn example_key() -> Dnskey {
    zone_key(0xe0)
}

pub fn rrsig(covered: &RRset, signer: &Name, key: &Dnskey, signature: &[u8]) -> Rrsig {
    Rrsig {
        type_covered: covered.rtype,
        algorithm: key.algorithm,
        labels: covered.name.label_count() as u8,
        original_ttl: covered.ttl,
        expiration: NOW + 86_400,
        inception: NOW - 86_400,
        key_tag: key.key_tag(),
        signer: signer.clone(),
        signature: signature.to_vec(),
    }
}

/// Attach a good signature by `signer`/`key`
pub fn sign(rrset: RRset, signer: &str, key: &Dnskey) -> RRset {
    let sig = rrsig(&rrset, &name(signer), key, GOOD_SIGNATURE);
    rrset.with_sig(sig.to_bytes())
}

/// Attach a signature the verifier rejects
pub fn sign_bogus(rrset: RRset, signer: &str, key: &Dnskey) -> RRset {
    let sig = rrsig(&rrset, &name(signer), key, BAD_SIGNATURE);
    rrset.with_sig(sig.to_bytes())
}

/// Attach a signature built by `edit` from a good one
pub fn sign_with(rrset: RRset, signer: &str, key: &Dnskey, edit: impl FnOnce(&mut Rrsig)) -> RRset {
    let mut sig = rrsig(&rrset, &name(signer), key, GOOD_SIGNATURE);
    edit(&mut sig);
    rrset.with_sig(sig.to_bytes())
}

pub fn a_rrset(owner: &str, octets: [u8; 4]) -> RRset {
    RRset::new(name(owner), RecordType::A, RecordClass::IN, 300).with_data(octets.to_vec())
}

pub fn aaaa_rrset(owner: &str, octets: [u8; 16]) -> RRset {
    RRset::new(name(owner), RecordType::AAAA, RecordClass::IN, 300).with_data(octets.to_vec())
}

pub fn dnskey_rrset(zone: &str, key: &Dnskey) -> RRset {
    RRset::new(name(zone), RecordType::DNSKEY, RecordClass::IN, 3600).with_data(key.to_bytes())
}

/// DS at `zone` committing to `key`, in the digest form [`FakeVerifier`] checks
pub fn ds_rrset(zone: &str, key: &Dnskey) -> RRset {
    let ds = Ds {
        key_tag: key.key_tag(),
        algorithm: key.algorithm,
        digest_type: 2,
        digest: key.public_key.clone(),
    };
    RRset::new(name(zone), RecordType::DS, RecordClass::IN, 3600).with_data(ds.to_bytes())
}

pub fn soa_rrset(zone: &str) -> RRset {
    let mut rdata = name(&format!("ns1.{zone}")).as_wire().to_vec();
    rdata.extend_from_slice(name(&format!("hostmaster.{zone}")).as_wire());
    for value in [2024_01_01u32, 7200, 3600, 1_209_600, 300] {
        rdata.extend_from_slice(&value.to_be_bytes());
    }
    RRset::new(name(zone), RecordType::SOA, RecordClass::IN, 300)
        .with_section(Section::Authority)
        .with_data(rdata)
}

pub fn nsec_rrset(owner: &str, next: &str, types: &[RecordType]) -> RRset {
    RRset::new(name(owner), RecordType::NSEC, RecordClass::IN, 300)
        .with_section(Section::Authority)
        .with_data(Nsec::new(name(next), types).to_bytes())
}

/// Signatures only, the way an answer to an RRSIG query arrives
pub fn bare_rrsig(owner: &str, sig: &Rrsig) -> RRset {
    RRset::new(name(owner), RecordType::RRSIG, RecordClass::IN, 300).with_sig(sig.to_bytes())
}

pub fn serve(transport: &StaticTransport, qname: &str, rtype: RecordType, rrsets: Vec<RRset>) {
    transport.insert(
        name(qname),
        rtype,
        RecordClass::IN,
        Response::new(name(qname), rrsets),
    );
}

/// Trust anchor at `com` only
pub fn com_policy() -> Policy {
    Policy::new(
        TrustAnchorList::new(vec![TrustAnchor::new(name("com"), com_key())]),
        ZonePolicy::default(),
    )
}

/// DNSKEY for `com`, DS and DNSKEY for `example.com`, all correctly signed
pub fn serve_signed_hierarchy(transport: &StaticTransport) {
    serve(
        transport,
        "com",
        RecordType::DNSKEY,
        vec![sign(dnskey_rrset("com", &com_key()), "com", &com_key())],
    );
    serve(
        transport,
        "example.com",
        RecordType::DS,
        vec![sign(ds_rrset("example.com", &example_key()), "com", &com_key())],
    );
    serve(
        transport,
        "example.com",
        RecordType::DNSKEY,
        vec![sign(
            dnskey_rrset("example.com", &example_key()),
            "example.com",
            &example_key(),
        )],
    );
}

/// Signed hierarchy plus a signed `www.example.com` A record
pub fn signed_world() -> StaticTransport {
    let transport = StaticTransport::new();
    serve_signed_hierarchy(&transport);
    serve(
        &transport,
        "www.example.com",
        RecordType::A,
        vec![sign(
            a_rrset("www.example.com", [192, 0, 2, 80]),
            "example.com",
            &example_key(),
        )],
    );
    transport
}

pub type TestValidator = Validator<Arc<StaticTransport>, FakeVerifier>;

pub fn validator(transport: StaticTransport, policy: Policy) -> TestValidator {
    validator_with_config(transport, policy, ValidatorConfig::default())
}

pub fn validator_with_config(
    transport: StaticTransport,
    policy: Policy,
    config: ValidatorConfig,
) -> TestValidator {
    let mut validator =
        Validator::with_verifier(Arc::new(transport), FakeVerifier, policy).with_config(config);
    validator.set_current_time(NOW);
    validator
}
