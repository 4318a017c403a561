mod common;

use common::*;
use dnsval::compose::{Rcode, compose_answer};
use dnsval::dns::{RRset, RecordClass, RecordType};
use dnsval::transport::StaticTransport;
use dnsval::validator::{Denial, Resolution, ResolveFlags, ValidationStatus};

fn signed(rrset: RRset) -> RRset {
    sign(rrset, "example.com", &example_key())
}

async fn resolve(transport: StaticTransport, qname: &str, rtype: RecordType) -> Resolution {
    let validator = validator(transport, com_policy());
    validator
        .resolve_and_check(&name(qname), rtype, RecordClass::IN, ResolveFlags::default())
        .await
        .unwrap()
}

fn negative_world(qname: &str, rtype: RecordType, proof: Vec<RRset>) -> StaticTransport {
    let transport = StaticTransport::new();
    serve_signed_hierarchy(&transport);
    serve(&transport, qname, rtype, proof);
    transport
}

fn all_have(resolution: &Resolution, status: ValidationStatus) -> bool {
    resolution.results.iter().all(|r| r.status == status)
}

#[tokio::test]
async fn test_name_error_is_proven() {
    let transport = negative_world(
        "nope.example.com",
        RecordType::A,
        vec![
            signed(soa_rrset("example.com")),
            signed(nsec_rrset(
                "example.com",
                "alpha.example.com",
                &[RecordType::SOA, RecordType::NSEC, RecordType::DNSKEY],
            )),
            signed(nsec_rrset("mail.example.com", "zeta.example.com", &[RecordType::A])),
        ],
    );
    let resolution = resolve(transport, "nope.example.com", RecordType::A).await;

    assert_eq!(resolution.results.len(), 3);
    assert!(all_have(&resolution, ValidationStatus::Nonexistent(Denial::Name)));
    assert!(resolution.is_authentic());

    let answer = compose_answer(&resolution);
    assert_eq!(answer.rcode, Rcode::NxDomain);
    assert!(answer.authenticated);
    assert!(answer.answer.is_empty());
    assert_eq!(answer.authority.len(), 3);
}

#[tokio::test]
async fn test_no_data_is_proven() {
    let transport = negative_world(
        "www.example.com",
        RecordType::AAAA,
        vec![
            signed(soa_rrset("example.com")),
            signed(nsec_rrset(
                "www.example.com",
                "zeta.example.com",
                &[RecordType::A, RecordType::RRSIG, RecordType::NSEC],
            )),
        ],
    );
    let resolution = resolve(transport, "www.example.com", RecordType::AAAA).await;
    assert!(all_have(&resolution, ValidationStatus::Nonexistent(Denial::Type)));

    let answer = compose_answer(&resolution);
    assert_eq!(answer.rcode, Rcode::NoError);
    assert!(answer.answer.is_empty());
}

#[tokio::test]
async fn test_nsec_that_lists_the_type_is_rejected() {
    let transport = negative_world(
        "www.example.com",
        RecordType::A,
        vec![
            signed(soa_rrset("example.com")),
            signed(nsec_rrset(
                "www.example.com",
                "zeta.example.com",
                &[RecordType::A, RecordType::NSEC],
            )),
        ],
    );
    let resolution = resolve(transport, "www.example.com", RecordType::A).await;
    assert!(all_have(&resolution, ValidationStatus::BogusProof));
}

#[tokio::test]
async fn test_missing_wildcard_proof_is_incomplete() {
    let transport = negative_world(
        "nope.example.com",
        RecordType::A,
        vec![
            signed(soa_rrset("example.com")),
            signed(nsec_rrset("mail.example.com", "zeta.example.com", &[RecordType::A])),
        ],
    );
    let resolution = resolve(transport, "nope.example.com", RecordType::A).await;
    assert!(all_have(&resolution, ValidationStatus::IncompleteProof));
    assert_eq!(compose_answer(&resolution).rcode, Rcode::ServFail);
}

#[tokio::test]
async fn test_nsec_that_misses_the_name_is_incomplete() {
    let transport = negative_world(
        "nope.example.com",
        RecordType::A,
        vec![
            signed(soa_rrset("example.com")),
            signed(nsec_rrset("example.com", "alpha.example.com", &[RecordType::SOA])),
            signed(nsec_rrset("alpha.example.com", "beta.example.com", &[RecordType::A])),
        ],
    );
    let resolution = resolve(transport, "nope.example.com", RecordType::A).await;
    assert!(all_have(&resolution, ValidationStatus::IncompleteProof));
}

#[tokio::test]
async fn test_bad_signature_on_proof_is_bogus_proof() {
    let transport = negative_world(
        "nope.example.com",
        RecordType::A,
        vec![
            signed(soa_rrset("example.com")),
            signed(nsec_rrset("example.com", "alpha.example.com", &[RecordType::SOA])),
            sign_bogus(
                nsec_rrset("mail.example.com", "zeta.example.com", &[RecordType::A]),
                "example.com",
                &example_key(),
            ),
        ],
    );
    let resolution = resolve(transport, "nope.example.com", RecordType::A).await;
    assert!(all_have(&resolution, ValidationStatus::BogusProof));
    assert!(!resolution.is_trusted());
}

#[tokio::test]
async fn test_proof_without_soa_is_incomplete() {
    let transport = negative_world(
        "nope.example.com",
        RecordType::A,
        vec![
            signed(nsec_rrset("example.com", "alpha.example.com", &[RecordType::SOA])),
            signed(nsec_rrset("mail.example.com", "zeta.example.com", &[RecordType::A])),
        ],
    );
    let resolution = resolve(transport, "nope.example.com", RecordType::A).await;
    assert!(all_have(&resolution, ValidationStatus::IncompleteProof));
}

#[tokio::test]
async fn test_negative_ds_in_chain_is_indeterminate_proof() {
    // example.com proves it has no DS, yet its data claims to be signed
    let transport = StaticTransport::new();
    serve(
        &transport,
        "com",
        RecordType::DNSKEY,
        vec![sign(dnskey_rrset("com", &com_key()), "com", &com_key())],
    );
    serve(
        &transport,
        "example.com",
        RecordType::DS,
        vec![
            sign(soa_rrset("com"), "com", &com_key()),
            sign(
                nsec_rrset("example.com", "zzz.com", &[RecordType::NS, RecordType::NSEC]),
                "com",
                &com_key(),
            ),
        ],
    );
    serve(
        &transport,
        "example.com",
        RecordType::DNSKEY,
        vec![signed(dnskey_rrset("example.com", &example_key()))],
    );
    serve(
        &transport,
        "www.example.com",
        RecordType::A,
        vec![signed(a_rrset("www.example.com", [192, 0, 2, 80]))],
    );

    let resolution = resolve(transport, "www.example.com", RecordType::A).await;
    assert_eq!(
        resolution.results[0].status,
        ValidationStatus::IndeterminateProof
    );
}
