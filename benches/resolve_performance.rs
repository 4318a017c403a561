use criterion::{Criterion, criterion_group, criterion_main};
use dnsval::dns::{Dnskey, Ds, Name, RRset, RecordClass, RecordType, Rrsig};
use dnsval::dnssec::crypto::signed_data;
use dnsval::dnssec::digest::{DigestType, dnskey_digest};
use dnsval::dnssec::{Policy, TrustAnchor, TrustAnchorList, ZonePolicy};
use dnsval::transport::{Response, StaticTransport};
use dnsval::validator::{ResolveFlags, Validator};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use std::hint::black_box;
use std::sync::Arc;
use tokio::runtime::Runtime;

const NOW: u32 = 1_700_000_000;

struct ZoneSigner {
    zone: Name,
    pair: Ed25519KeyPair,
    key: Dnskey,
}

impl ZoneSigner {
    fn generate(zone: &str, rng: &SystemRandom) -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(rng).unwrap();
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let key = Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: 15,
            public_key: pair.public_key().as_ref().to_vec(),
        };
        Self {
            zone: Name::from_ascii(zone).unwrap(),
            pair,
            key,
        }
    }

    fn sign(&self, rrset: RRset) -> RRset {
        let mut sig = Rrsig {
            type_covered: rrset.rtype,
            algorithm: 15,
            labels: rrset.name.label_count() as u8,
            original_ttl: rrset.ttl,
            expiration: NOW + 86_400,
            inception: NOW - 86_400,
            key_tag: self.key.key_tag(),
            signer: self.zone.clone(),
            signature: Vec::new(),
        };
        sig.signature = self.pair.sign(&signed_data(&rrset, &sig)).as_ref().to_vec();
        rrset.with_sig(sig.to_bytes())
    }

    fn dnskey_rrset(&self) -> RRset {
        self.sign(
            RRset::new(self.zone.clone(), RecordType::DNSKEY, RecordClass::IN, 3600)
                .with_data(self.key.to_bytes()),
        )
    }

    fn ds_rrset(&self, parent: &ZoneSigner) -> RRset {
        let ds = Ds {
            key_tag: self.key.key_tag(),
            algorithm: 15,
            digest_type: 2,
            digest: dnskey_digest(&self.zone, &self.key, DigestType::Sha256).unwrap(),
        };
        parent.sign(
            RRset::new(self.zone.clone(), RecordType::DS, RecordClass::IN, 3600)
                .with_data(ds.to_bytes()),
        )
    }
}

fn serve(transport: &StaticTransport, rrset: RRset) {
    let (name, rtype) = (rrset.name.clone(), rrset.rtype);
    transport.insert(
        name.clone(),
        rtype,
        RecordClass::IN,
        Response::new(name, vec![rrset]),
    );
}

fn signed_validator() -> Validator<Arc<StaticTransport>> {
    let rng = SystemRandom::new();
    let com = ZoneSigner::generate("com", &rng);
    let example = ZoneSigner::generate("example.com", &rng);

    let transport = StaticTransport::new();
    serve(&transport, com.dnskey_rrset());
    serve(&transport, example.ds_rrset(&com));
    serve(&transport, example.dnskey_rrset());
    serve(
        &transport,
        example.sign(
            RRset::new(
                Name::from_ascii("www.example.com").unwrap(),
                RecordType::A,
                RecordClass::IN,
                300,
            )
            .with_data(vec![192, 0, 2, 80]),
        ),
    );

    let policy = Policy::new(
        TrustAnchorList::new(vec![TrustAnchor::new(com.zone.clone(), com.key.clone())]),
        ZonePolicy::default(),
    );
    let mut validator = Validator::new(Arc::new(transport), policy);
    validator.set_current_time(NOW);
    validator
}

fn benchmark_resolve(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let validator = signed_validator();
    let qname = Name::from_ascii("www.example.com").unwrap();
    let mut group = c.benchmark_group("resolve_and_check");

    group.bench_function("cold_cache", |b| {
        b.iter(|| {
            validator.cache().clear();
            let resolution = rt
                .block_on(validator.resolve_and_check(
                    black_box(&qname),
                    RecordType::A,
                    RecordClass::IN,
                    ResolveFlags::default(),
                ))
                .unwrap();
            black_box(resolution.is_trusted())
        })
    });

    group.bench_function("warm_cache", |b| {
        b.iter(|| {
            let resolution = rt
                .block_on(validator.resolve_and_check(
                    black_box(&qname),
                    RecordType::A,
                    RecordClass::IN,
                    ResolveFlags::default(),
                ))
                .unwrap();
            black_box(resolution.is_trusted())
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_resolve);
criterion_main!(benches);
