use super::Session;
use super::assertion::{AssertionError, AssertionId, AssertionState, Pending, Proven};
use super::query::{QueryError, QueryState};
use super::status::{ValidationResult, ValidationStatus, escalate};
use crate::dns::rdata::DNSKEY_PROTOCOL;
use crate::dns::{Dnskey, Ds, Name, RRset, RecordType, Rrsig, RrsetStatus, SigStatus};
use crate::error::Result;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

impl Session<'_> {
    /// Advance `id` using whatever its pending query has produced
    pub(crate) fn try_verify(&mut self, id: AssertionId) -> Result<()> {
        if let Some(pending) = self.assertions[id].pending_query {
            let query = &self.queries[pending];
            let waiting = self.assertions[id].state.pending();

            if let Some(err) = query.state.error() {
                let reason = match (waiting, query.rtype) {
                    (Some(Pending::WaitForRrsig), _) => AssertionError::RrsigMissing,
                    (Some(Pending::WaitForTrust), RecordType::DS) => AssertionError::DsMissing,
                    (Some(Pending::WaitForTrust), RecordType::DNSKEY) => {
                        AssertionError::DnskeyMissing
                    }
                    _ => AssertionError::Dns(err),
                };
                debug!(
                    "{} {} cannot progress: {:?}",
                    self.assertions[id].rrset.name, self.assertions[id].rrset.rtype, reason
                );
                let node = &mut self.assertions[id];
                node.state = AssertionState::Error(reason);
                node.pending_query = None;
                return Ok(());
            }

            if query.state != QueryState::Answered {
                return Ok(());
            }
            let answer = query.answer;

            match waiting {
                Some(Pending::WaitForRrsig) => {
                    let rtype = self.assertions[id].rrset.rtype;
                    let found = answer.and_then(|first| {
                        self.assertions.siblings(first).find(|candidate| {
                            let bare = &self.assertions[*candidate];
                            bare.state == AssertionState::Error(AssertionError::BareRrsig)
                                && bare
                                    .rrset
                                    .parsed_sigs()
                                    .next()
                                    .is_some_and(|(_, sig)| sig.type_covered == rtype)
                        })
                    });

                    let Some(bare) = found else {
                        debug!("No RRSIG over {} arrived", self.assertions[id].rrset.name);
                        let node = &mut self.assertions[id];
                        node.state = AssertionState::Error(AssertionError::RrsigMissing);
                        node.pending_query = None;
                        return Ok(());
                    };

                    let sigs: Vec<_> = self.assertions[bare]
                        .rrset
                        .parsed_sigs()
                        .filter(|(_, sig)| sig.type_covered == rtype)
                        .map(|(idx, _)| self.assertions[bare].rrset.sigs[idx].clone())
                        .collect();
                    let node = &mut self.assertions[id];
                    node.rrset.sigs = sigs;
                    node.pending_query = None;
                    node.state = AssertionState::Incomplete(Pending::WaitForTrust);
                    self.build_pending_query(id)?;
                }
                Some(Pending::WaitForTrust) => {
                    let negative = answer.map(|trust| self.assertions[trust].rrset.is_nack());
                    let node = &mut self.assertions[id];
                    node.pending_query = None;
                    node.trust = answer;
                    node.state = match negative {
                        None => AssertionState::Error(AssertionError::Dns(QueryError::NoAnswer)),
                        Some(true) => AssertionState::NegativeProof,
                        Some(false) => AssertionState::Incomplete(Pending::CanVerify),
                    };
                }
                _ => {}
            }
        }

        if self.assertions[id].state == AssertionState::Incomplete(Pending::CanVerify) {
            self.verify_rrset(id);
        }
        Ok(())
    }

    /// Check every RRSIG of a `CanVerify` assertion against the keys its
    /// trust edge provides
    pub(crate) fn verify_rrset(&mut self, id: AssertionId) {
        let Some(trust) = self.assertions[id].trust else {
            self.assertions[id].state = AssertionState::Error(AssertionError::DnskeyMissing);
            return;
        };

        let rrset = &self.assertions[id].rrset;
        let is_dnskey = rrset.rtype == RecordType::DNSKEY;
        let key_source = if is_dnskey {
            rrset
        } else {
            &self.assertions[trust].rrset
        };
        let keys = key_source.dnskeys();
        let key_owner = &key_source.name;
        let ds_records = if is_dnskey {
            self.assertions[trust].rrset.ds_records()
        } else {
            Vec::new()
        };

        let outcomes: Vec<(usize, SigStatus)> = rrset
            .parsed_sigs()
            .filter(|(_, sig)| sig.type_covered == rrset.rtype)
            .map(|(idx, sig)| {
                let status = self.check_signature(rrset, &sig, key_owner, &keys, &ds_records);
                (idx, status)
            })
            .collect();

        let node = &mut self.assertions[id];
        for (idx, status) in &outcomes {
            node.rrset.sigs[*idx].status = *status;
        }

        let verdict = if outcomes.iter().any(|(_, status)| status.is_verified()) {
            node.rrset.status = RrsetStatus::Verified;
            AssertionState::Success(Proven::Verified)
        } else {
            node.rrset.status = RrsetStatus::Wrong;
            let reason = match outcomes.split_first() {
                Some(((_, first), rest)) if rest.iter().all(|(_, s)| s == first) => *first,
                _ => SigStatus::NotVerified,
            };
            AssertionState::Failure(reason)
        };

        debug!("{} {}: {}", node.rrset.name, node.rrset.rtype, verdict);
        node.state = verdict;
    }

    fn check_signature(
        &self,
        rrset: &RRset,
        sig: &Rrsig,
        key_owner: &Name,
        keys: &[Dnskey],
        ds: &[Ds],
    ) -> SigStatus {
        if !rrset.name.ends_with(&sig.signer) {
            return SigStatus::KeyNotAuthorized;
        }
        if sig.signer != *key_owner {
            return SigStatus::DnskeyNoMatch;
        }
        let owner_labels = rrset.name.label_count();
        let sig_labels = sig.labels as usize;
        if sig_labels > owner_labels {
            return SigStatus::WrongLabelCount;
        }
        let wildcard = sig_labels < owner_labels;
        if wildcard && matches!(rrset.rtype, RecordType::DS | RecordType::DNSKEY) {
            return SigStatus::InvalidKey;
        }

        let mut status = SigStatus::DnskeyNoMatch;
        for key in keys.iter().filter(|key| key.key_tag() == sig.key_tag) {
            status = self.check_with_key(rrset, sig, key, wildcard);
            if !status.is_verified() {
                continue;
            }
            if rrset.rtype == RecordType::DNSKEY
                && !ds
                    .iter()
                    .any(|ds| self.verifier.ds_matches(&rrset.name, key, ds))
            {
                status = SigStatus::BadDelegation;
                continue;
            }
            break;
        }

        trace!(
            "RRSIG tag {} by {} over {} {}: {:?}",
            sig.key_tag, sig.signer, rrset.name, rrset.rtype, status
        );
        status
    }

    fn check_with_key(&self, rrset: &RRset, sig: &Rrsig, key: &Dnskey, wildcard: bool) -> SigStatus {
        if !key.is_zone_key() || key.protocol != DNSKEY_PROTOCOL {
            SigStatus::InvalidKey
        } else if key.algorithm != sig.algorithm {
            SigStatus::AlgorithmMismatch
        } else if sig.inception > self.now.saturating_add(self.clock_skew) {
            SigStatus::RrsigNotYetActive
        } else if self.now > sig.expiration.saturating_add(self.clock_skew) {
            SigStatus::RrsigExpired
        } else if !self.verifier.supports(sig.algorithm) {
            SigStatus::AlgorithmNotSupported
        } else if self.verifier.verify_signature(key, rrset, sig) {
            if wildcard {
                SigStatus::WildcardVerified
            } else {
                SigStatus::Verified
            }
        } else {
            SigStatus::NotVerified
        }
    }

    /// Walk the chain of trust above every answer of the top query.
    /// Returns true once no walk is waiting for more data.
    pub(crate) fn verify_and_validate(
        &mut self,
        top_answer: AssertionId,
        results: &mut Vec<ValidationResult>,
    ) -> Result<bool> {
        let mut done = true;
        let answers: Vec<AssertionId> = self.assertions.siblings(top_answer).collect();

        for answer in answers {
            let slot = match results.iter().position(|r| r.assertion == Some(answer)) {
                Some(slot) => slot,
                None => {
                    results.push(ValidationResult::new(
                        answer,
                        self.assertions[answer].rrset.clone(),
                    ));
                    results.len() - 1
                }
            };
            if results[slot].status != ValidationStatus::DontKnow {
                continue;
            }

            let mut status = ValidationStatus::DontKnow;
            let mut trusted = false;
            let mut complete = true;
            let mut detail = None;
            let mut visited = FxHashSet::default();
            let mut next = Some(answer);

            while let Some(current) = next {
                if !visited.insert(current) || visited.len() > self.max_chain_depth {
                    debug!("Trust chain above {:?} does not terminate", answer);
                    escalate(&mut status, ValidationStatus::IndeterminateDs);
                    break;
                }

                if self.assertions[current].state.is_incomplete() {
                    self.try_verify(current)?;
                }

                let node = &self.assertions[current];
                if node.rrset.rtype == RecordType::DNSKEY
                    && node
                        .trust
                        .is_some_and(|trust| self.assertions[trust].trust == Some(current))
                {
                    debug!("DS and DNSKEY at {} vouch for each other", node.rrset.name);
                    escalate(&mut status, ValidationStatus::IndeterminateDs);
                    detail = Some(node.state.clone());
                    break;
                }

                detail = Some(node.state.clone());
                match &node.state {
                    AssertionState::Incomplete(_) => {
                        complete = false;
                    }
                    AssertionState::Success(Proven::TrustedKey | Proven::TrustedZone) => {
                        trusted = true;
                        break;
                    }
                    AssertionState::NegativeProof => {
                        escalate(&mut status, ValidationStatus::IndeterminateProof);
                        break;
                    }
                    AssertionState::Error(err) => {
                        escalate(&mut status, status_for_error(err));
                        break;
                    }
                    AssertionState::Failure(_) => {
                        escalate(&mut status, ValidationStatus::Bogus);
                        break;
                    }
                    AssertionState::Success(Proven::Verified) => {
                        escalate(&mut status, ValidationStatus::VerifiedChain);
                    }
                }
                next = node.trust;
            }

            let result = &mut results[slot];
            if complete {
                result.status = status;
                result.trusted = trusted;
                result.detail = detail;
            } else {
                done = false;
                result.status = ValidationStatus::DontKnow;
                result.trusted = false;
            }
            result.rrset = Some(self.assertions[answer].rrset.clone());
        }

        Ok(done)
    }
}

fn status_for_error(err: &AssertionError) -> ValidationStatus {
    match err {
        AssertionError::NoTrustAnchor => ValidationStatus::IndeterminateTrust,
        AssertionError::UntrustedZone => ValidationStatus::IndeterminateZone,
        AssertionError::BareRrsig => ValidationStatus::BareRrsig,
        _ => ValidationStatus::IndeterminateError,
    }
}

