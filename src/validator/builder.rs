//! Turning answered queries into assertions.
//!
//! Every RRset of a response is classified by the role it plays for the
//! query, filtered for relevance, and then told what it still needs
//! (an RRSIG, the signer's DNSKEY, or the DS above a DNSKEY).

use super::Session;
use super::assertion::{AssertionError, AssertionId, AssertionState, Pending, Proven};
use super::query::{QueryError, QueryId, QueryState};
use crate::dns::{AnswerKind, Name, RRset, RecordClass, RecordType, RrsetStatus, SigStatus};
use crate::dnssec::denial::first_nsec;
use crate::dnssec::{TrustMatch, ZoneExpectation};
use crate::error::Result;
use crate::transport::Response;
use tracing::{debug, trace};

fn type_matches(qtype: RecordType, rtype: RecordType) -> bool {
    qtype == rtype || qtype == RecordType::ANY
}

/// Decide the role `rrset` plays in answering a query for `qtype` whose
/// CNAME chain ends at `top`.
pub fn set_ans_kind(top: &Name, qtype: RecordType, rrset: &mut RRset) -> AnswerKind {
    let at_top = &rrset.name == top && type_matches(qtype, rrset.rtype);

    rrset.ans_kind = if rrset.data.is_empty() && !rrset.sigs.is_empty() {
        AnswerKind::BareRrsig
    } else if at_top {
        AnswerKind::Straight
    } else {
        match rrset.rtype {
            RecordType::NSEC => AnswerKind::NackNxt,
            RecordType::SOA => AnswerKind::NackSoa,
            RecordType::CNAME => AnswerKind::Cname,
            _ => AnswerKind::Unset,
        }
    };
    rrset.ans_kind
}

/// Sanity filter: true when `rrset` cannot be part of the answer to
/// (`qnames`, `qtype`, `qclass`). `qnames` is the CNAME chain, the final
/// target last.
///
/// DNAME substitution and wildcard-expanded answers are not checked here.
pub fn fails_to_answer_query(
    qnames: &[Name],
    qtype: RecordType,
    qclass: RecordClass,
    rrset: &RRset,
) -> bool {
    if rrset.data.is_empty() {
        return false;
    }
    let Some((top, mid)) = qnames.split_last() else {
        return true;
    };

    let class_mismatch = rrset.class != qclass && qclass != RecordClass::ANY;
    let type_match = type_matches(qtype, rrset.rtype);
    let kind = rrset.ans_kind;
    let straight = kind == AnswerKind::Straight;
    let in_chain = mid.contains(&rrset.name);

    class_mismatch
        || (!type_match && straight)
        || (type_match && !straight)
        || (&rrset.name != top && type_match && straight)
        || (!in_chain && !type_match && kind == AnswerKind::Cname)
        || (in_chain && !type_match && kind.is_nack())
}

/// An NSEC offered as proof that `qname`/`qtype` does not exist, checked
/// against what it actually says.
pub fn nsec_is_wrong_answer(qname: &Name, qtype: RecordType, rrset: &RRset) -> bool {
    if rrset.ans_kind != AnswerKind::NackNxt {
        return false;
    }
    let Some(nsec) = first_nsec(rrset) else {
        return true;
    };

    if &rrset.name == qname {
        // The owner exists, so the type has to be missing from the bitmap
        nsec.has_type(qtype)
    } else {
        // The chain wraps through the apex, which sorts before everything
        // in the zone, so an owner past the name never covers it
        &rrset.name > qname
    }
}

/// Whether answers of kinds `seen` and `new` may come back for one query
pub fn answer_kinds_compatible(seen: AnswerKind, new: AnswerKind) -> bool {
    use AnswerKind::*;
    match seen {
        Straight => matches!(new, Straight | Cname),
        Cname => matches!(new, Straight | Cname | NackSoa | NackNxt),
        BareRrsig => new == BareRrsig,
        NackNxt | NackSoa => matches!(new, NackNxt | NackSoa | Cname),
        Unset => true,
    }
}

impl Session<'_> {
    /// Build assertions for every RRset of `response`, which answers
    /// `query`. A query is only ever answered once.
    pub(crate) fn assimilate_answers(&mut self, query: QueryId, response: &Response) -> Result<()> {
        if self.queries[query].answer.is_some() {
            return Ok(());
        }
        if response.rrsets.is_empty() {
            self.queries[query].state = QueryState::Error(QueryError::NoAnswer);
            return Ok(());
        }

        let qtype = self.queries[query].rtype;
        let qclass = self.queries[query].class;
        let qnames: Vec<Name> = if response.qnames.is_empty() {
            vec![self.queries[query].name.clone()]
        } else {
            response.qnames.clone()
        };
        let top = qnames[qnames.len() - 1].clone();
        if top != self.queries[query].name {
            self.queries[query].target = Some(top.clone());
        }

        let mut previous: Option<AssertionId> = None;
        let mut kinds: Vec<AnswerKind> = Vec::new();

        for incoming in &response.rrsets {
            let mut rrset = incoming.clone();
            rrset.canonicalize();
            rrset.status = RrsetStatus::Unchecked;
            for sig in &mut rrset.sigs {
                sig.status = SigStatus::Unset;
            }

            let id = self.assertions.add(rrset, query);
            match previous {
                None => self.queries[query].answer = Some(id),
                Some(prev) => self.assertions[prev].more_data = Some(id),
            }
            previous = Some(id);

            let node = &mut self.assertions[id];
            let kind = set_ans_kind(&top, qtype, &mut node.rrset);
            let rejected = if kind == AnswerKind::Unset {
                Some(AssertionError::WrongAnswer)
            } else if fails_to_answer_query(&qnames, qtype, qclass, &node.rrset) {
                Some(AssertionError::WrongAnswer)
            } else if nsec_is_wrong_answer(&top, qtype, &node.rrset) {
                Some(AssertionError::IrrelevantProof)
            } else {
                None
            };

            if let Some(reason) = rejected {
                debug!(
                    "Rejecting {} {} as answer to {} {}: {:?}",
                    node.rrset.name, node.rrset.rtype, top, qtype, reason
                );
                node.rrset.status = RrsetStatus::Wrong;
                node.state = AssertionState::Error(reason);
                continue;
            }

            if kinds
                .iter()
                .any(|seen| !answer_kinds_compatible(*seen, kind))
            {
                debug!("Conflicting answers for {} {}", top, qtype);
                self.queries[query].state = QueryState::ConflictingAnswers;
            }
            kinds.push(kind);

            self.build_pending_query(id)?;
        }

        Ok(())
    }

    /// Work out what `id` needs next and queue the query that fetches it
    pub(crate) fn build_pending_query(&mut self, id: AssertionId) -> Result<()> {
        let rrset = &self.assertions[id].rrset;

        if rrset.ans_kind == AnswerKind::BareRrsig {
            self.assertions[id].state = AssertionState::Error(AssertionError::BareRrsig);
            return Ok(());
        }
        if rrset.data.is_empty() {
            self.assertions[id].state = AssertionState::Error(AssertionError::DataMissing);
            return Ok(());
        }

        match self.policy.zones.expectation(&rrset.name) {
            ZoneExpectation::Trusted => {
                trace!("{} lies in a trusted zone", rrset.name);
                self.assertions[id].state = AssertionState::Success(Proven::TrustedZone);
                return Ok(());
            }
            ZoneExpectation::Untrusted => {
                debug!("{} lies in an untrusted zone", rrset.name);
                self.assertions[id].state = AssertionState::Error(AssertionError::UntrustedZone);
                return Ok(());
            }
            ZoneExpectation::Validate => {}
        }

        let owner = rrset.name.clone();
        let rtype = rrset.rtype;
        let class = rrset.class;

        if rrset.sigs.is_empty() {
            let pending = self.queries.add_query(owner, RecordType::RRSIG, class)?;
            let node = &mut self.assertions[id];
            node.state = AssertionState::Incomplete(Pending::WaitForRrsig);
            node.pending_query = Some(pending);
            return Ok(());
        }

        let signers: Vec<Name> = rrset
            .parsed_sigs()
            .filter(|(_, sig)| sig.type_covered == rtype)
            .map(|(_, sig)| sig.signer)
            .collect();
        let Some(signer) = signers.iter().find(|signer| owner.ends_with(signer)).cloned() else {
            self.assertions[id].state = if signers.is_empty() {
                debug!("No usable RRSIG over {} {}", owner, rtype);
                AssertionState::Error(AssertionError::RrsigMissing)
            } else {
                debug!("No RRSIG over {} {} from an enclosing zone", owner, rtype);
                AssertionState::Failure(SigStatus::KeyNotAuthorized)
            };
            return Ok(());
        };

        let next = if rtype == RecordType::DNSKEY {
            let keys = rrset.dnskeys();
            match self.policy.anchors.is_trusted(&signer, &keys) {
                TrustMatch::Exact => {
                    self.assertions[id].state = AssertionState::Success(Proven::TrustedKey);
                    return Ok(());
                }
                TrustMatch::NoMore => {
                    self.assertions[id].state =
                        AssertionState::Error(AssertionError::NoTrustAnchor);
                    return Ok(());
                }
                TrustMatch::NotYet => RecordType::DS,
            }
        } else {
            RecordType::DNSKEY
        };

        trace!("{} {} needs {} at {}", owner, rtype, next, signer);
        let pending = self.queries.add_query(signer, next, class)?;
        let node = &mut self.assertions[id];
        node.state = AssertionState::Incomplete(Pending::WaitForTrust);
        node.pending_query = Some(pending);
        Ok(())
    }
}
