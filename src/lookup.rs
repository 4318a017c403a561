use crate::dns::{AnswerKind, Name, RRset, RecordClass, RecordType};
use crate::dnssec::SignatureVerifier;
use crate::error::Result;
use crate::transport::Transport;
use crate::validator::status::escalate;
use crate::validator::{Resolution, ResolveFlags, ValidationStatus, Validator};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// Outcome of one address family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyLookup {
    /// Worst verdict over the family's answers
    pub status: ValidationStatus,
    pub addrs: Vec<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostLookup {
    pub name: Name,
    pub v4: FamilyLookup,
    pub v6: FamilyLookup,
    /// Every family that produced addresses was validated
    pub trusted: bool,
}

impl HostLookup {
    /// IPv4 first, then IPv6
    pub fn addrs(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.v4.addrs.iter().chain(self.v6.addrs.iter()).copied()
    }
}

fn addresses(rrset: &RRset) -> impl Iterator<Item = IpAddr> + '_ {
    rrset
        .data
        .iter()
        .filter_map(move |rr| match (rrset.rtype, rr.rdata.as_ref()) {
            (RecordType::A, bytes) => <[u8; 4]>::try_from(bytes)
                .ok()
                .map(|octets| IpAddr::V4(Ipv4Addr::from(octets))),
            (RecordType::AAAA, bytes) => <[u8; 16]>::try_from(bytes)
                .ok()
                .map(|octets| IpAddr::V6(Ipv6Addr::from(octets))),
            _ => None,
        })
}

fn family(resolution: &Resolution, allow_untrusted: bool) -> FamilyLookup {
    let mut status = ValidationStatus::DontKnow;
    let mut addrs = Vec::new();

    for result in &resolution.results {
        escalate(&mut status, result.status.clone());
        let usable = result.status.is_authentic() || allow_untrusted;
        let Some(rrset) = result.rrset.as_ref().filter(|_| usable) else {
            continue;
        };
        if rrset.ans_kind == AnswerKind::Straight {
            addrs.extend(addresses(rrset));
        }
    }

    FamilyLookup { status, addrs }
}

/// Resolve the A and AAAA records of `name` side by side.
///
/// Only addresses from validated answers are returned unless
/// `allow_untrusted` is set.
pub async fn lookup_host<T, V>(
    validator: &Validator<T, V>,
    name: &Name,
    allow_untrusted: bool,
) -> Result<HostLookup>
where
    T: Transport,
    V: SignatureVerifier,
{
    let flags = ResolveFlags::default();
    let (v4, v6) = tokio::join!(
        validator.resolve_and_check(name, RecordType::A, RecordClass::IN, flags),
        validator.resolve_and_check(name, RecordType::AAAA, RecordClass::IN, flags),
    );
    let (v4, v6) = (v4?, v6?);

    let v4 = family(&v4, allow_untrusted);
    let v6 = family(&v6, allow_untrusted);
    let with_data: Vec<&FamilyLookup> = [&v4, &v6]
        .into_iter()
        .filter(|f| !f.addrs.is_empty())
        .collect();
    let trusted = !with_data.is_empty() && with_data.iter().all(|f| f.status.is_trusted());

    debug!(
        "{}: {} IPv4, {} IPv6, trusted={}",
        name,
        v4.addrs.len(),
        v6.addrs.len(),
        trusted
    );
    Ok(HostLookup {
        name: name.clone(),
        v4,
        v6,
        trusted,
    })
}
