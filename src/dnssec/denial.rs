//! NSEC span arithmetic used by the non-existence prover.

use crate::dns::{Name, Nsec, RRset, RecordType};
use tracing::trace;

/// Whether an NSEC owned by `owner` with next-name `next` proves that
/// `name` does not exist: `owner < name < next` in canonical order, or
/// `owner < name` when the chain wraps back to the zone apex.
pub fn nsec_covers(owner: &Name, next: &Name, name: &Name, apex: &Name) -> bool {
    if owner >= name {
        return false;
    }
    let covered = name < next || next == apex;
    trace!("NSEC {} -> {} covers {}: {}", owner, next, name, covered);
    covered
}

/// Whether `name` lies strictly inside `(owner, next)`, with no wrap-around
pub fn strictly_between(owner: &Name, next: &Name, name: &Name) -> bool {
    owner < name && name < next
}

/// First NSEC record of an RRset, if it parses
pub fn first_nsec(rrset: &RRset) -> Option<Nsec> {
    if rrset.rtype != RecordType::NSEC {
        return None;
    }
    rrset.data.first().and_then(|rr| Nsec::parse(&rr.rdata).ok())
}

/// The wildcard that would have synthesized an answer below `encloser`
pub fn source_of_synthesis(encloser: &Name) -> Option<Name> {
    encloser.prepend_wildcard().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::RecordClass;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    #[test]
    fn test_nsec_covers() {
        let apex = name("example.com");
        let owner = name("alpha.example.com");
        let next = name("delta.example.com");

        assert!(nsec_covers(&owner, &next, &name("beta.example.com"), &apex));
        assert!(!nsec_covers(&owner, &next, &name("zulu.example.com"), &apex));
        assert!(!nsec_covers(&owner, &next, &owner, &apex));
        assert!(!nsec_covers(&owner, &next, &name("example.com"), &apex));
    }

    #[test]
    fn test_nsec_covers_wrap_to_apex() {
        let apex = name("example.com");
        let owner = name("www.example.com");
        assert!(nsec_covers(&owner, &apex, &name("zzz.example.com"), &apex));
        assert!(!nsec_covers(&owner, &name("a.example.com"), &name("zzz.example.com"), &apex));
    }

    #[test]
    fn test_wildcard_sorts_before_siblings() {
        let apex = name("example.com");
        let wildcard = source_of_synthesis(&apex).unwrap();
        assert!(strictly_between(&apex, &name("a.example.com"), &wildcard));
        assert!(!strictly_between(&name("a.example.com"), &name("b.example.com"), &wildcard));
    }

    #[test]
    fn test_first_nsec() {
        let nsec = Nsec::new(name("b.example.com"), &[RecordType::A, RecordType::NSEC]);
        let set = RRset::new(name("a.example.com"), RecordType::NSEC, RecordClass::IN, 60)
            .with_data(nsec.to_bytes());
        assert_eq!(first_nsec(&set), Some(nsec));

        let not_nsec = RRset::new(name("a.example.com"), RecordType::A, RecordClass::IN, 60);
        assert_eq!(first_nsec(&not_nsec), None);
    }
}
