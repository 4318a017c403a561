use super::status::{Denial, ValidationResult, ValidationStatus};
use crate::dns::{AnswerKind, Name, RRset};
use crate::dnssec::denial::{first_nsec, nsec_covers, source_of_synthesis, strictly_between};
use tracing::debug;

/// Whether a verified, non-wildcard RRSIG covers `rrset`
fn signed_without_expansion(rrset: &RRset) -> bool {
    let labels = rrset.name.label_count();
    rrset
        .parsed_sigs()
        .any(|(idx, sig)| rrset.sigs[idx].status.is_verified() && sig.labels as usize == labels)
}

/// Decide whether the NSEC and SOA records of a negative answer prove
/// that `qname` (the end of the CNAME chain) has no data.
///
/// Every result of the batch receives the same verdict.
pub fn prove_nonexistence(qname: &Name, results: &mut [ValidationResult]) {
    let status = nonexistence_status(qname, results);
    debug!("Non-existence of {}: {}", qname, status);
    for result in results.iter_mut() {
        result.status = status.clone();
    }
}

fn nonexistence_status(qname: &Name, results: &[ValidationResult]) -> ValidationStatus {
    let rrsets: Vec<&RRset> = results.iter().filter_map(|r| r.rrset.as_ref()).collect();

    let mut soas = rrsets.iter().filter(|r| r.ans_kind == AnswerKind::NackSoa);
    let (Some(soa), None) = (soas.next(), soas.next()) else {
        return ValidationStatus::IncompleteProof;
    };
    let apex = &soa.name;

    let nsecs: Vec<(&RRset, Name)> = rrsets
        .iter()
        .filter(|r| r.ans_kind == AnswerKind::NackNxt)
        .filter_map(|r| first_nsec(r).map(|nsec| (*r, nsec.next)))
        .collect();

    let mut span = false;
    let mut wildcard_absent = false;
    let mut denial = Denial::Name;
    let mut closest_encounter: Option<Name> = None;

    for (rrset, next) in &nsecs {
        if &rrset.name == qname {
            span = true;
            denial = Denial::Type;
            if signed_without_expansion(rrset) {
                wildcard_absent = true;
            }
            continue;
        }
        if nsec_covers(&rrset.name, next, qname, apex) {
            span = true;
        }

        let encounter = qname.common_suffix(&rrset.name);
        if closest_encounter
            .as_ref()
            .is_none_or(|current| encounter.label_count() > current.label_count())
        {
            closest_encounter = Some(encounter);
        }
    }

    if !span {
        return ValidationStatus::IncompleteProof;
    }
    if wildcard_absent {
        return ValidationStatus::Nonexistent(denial);
    }

    // The closest encloser can never sit above the zone apex
    let Some(encloser) = closest_encounter.filter(|ce| ce.ends_with(apex)) else {
        return ValidationStatus::IncompleteProof;
    };
    let Some(wildcard) = source_of_synthesis(&encloser) else {
        return ValidationStatus::IncompleteProof;
    };

    let covered = nsecs.iter().any(|(rrset, next)| {
        strictly_between(&rrset.name, next, &wildcard)
            || (next == apex && rrset.name < wildcard && wildcard.ends_with(apex))
    });
    if covered {
        ValidationStatus::Nonexistent(denial)
    } else {
        ValidationStatus::IncompleteProof
    }
}
