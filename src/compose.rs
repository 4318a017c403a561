//! Turning a [`Resolution`] into what a DNS front end sends back.
//!
//! Nothing here touches wire bytes. A front end takes a [`ComposedAnswer`]
//! and encodes it with its own packet writer.

use crate::dns::{RRset, Section};
use crate::validator::{Denial, Resolution, ValidationStatus};
use serde::Serialize;
use std::fmt;

/// Response codes a composed answer can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rcode {
    NoError,
    ServFail,
    NxDomain,
}

impl Rcode {
    pub fn to_u8(self) -> u8 {
        match self {
            Rcode::NoError => 0,
            Rcode::ServFail => 2,
            Rcode::NxDomain => 3,
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rcode::NoError => f.write_str("NOERROR"),
            Rcode::ServFail => f.write_str("SERVFAIL"),
            Rcode::NxDomain => f.write_str("NXDOMAIN"),
        }
    }
}

/// Structured answer, ready for a wire encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedAnswer {
    pub rcode: Rcode,
    /// The AD bit
    pub authenticated: bool,
    pub answer: Vec<RRset>,
    pub authority: Vec<RRset>,
}

/// Shapes a resolution into whatever a caller hands back to its client
pub trait AnswerComposer {
    type Output;

    fn compose(&self, resolution: &Resolution) -> Self::Output;
}

/// Composer behind [`compose_answer`].
///
/// With `checking_disabled` set, data that failed validation is still
/// returned, without the AD bit, the way a resolver honours the CD bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreWireComposer {
    pub checking_disabled: bool,
}

impl AnswerComposer for PreWireComposer {
    type Output = ComposedAnswer;

    fn compose(&self, resolution: &Resolution) -> ComposedAnswer {
        let results = &resolution.results;
        let authenticated =
            !results.is_empty() && results.iter().all(|r| r.status.is_authentic());

        let denial = results.iter().find_map(|r| match r.status {
            ValidationStatus::Nonexistent(denial) => Some(denial),
            _ => None,
        });
        let failed = results.is_empty()
            || results.iter().any(|r| {
                !r.status.is_trusted() && !matches!(r.status, ValidationStatus::Nonexistent(_))
            });

        let mut answer = Vec::new();
        let mut authority = Vec::new();
        for rrset in results.iter().filter_map(|r| r.rrset.as_ref()) {
            if rrset.is_nack() || rrset.section == Section::Authority {
                authority.push(rrset.clone());
            } else {
                answer.push(rrset.clone());
            }
        }

        let nothing = results.iter().all(|r| r.rrset.is_none());
        let rcode = if failed && (!self.checking_disabled || nothing) {
            Rcode::ServFail
        } else {
            match denial {
                Some(Denial::Name) => Rcode::NxDomain,
                Some(Denial::Type) | None => Rcode::NoError,
            }
        };

        if rcode == Rcode::ServFail {
            return ComposedAnswer {
                rcode,
                authenticated: false,
                answer: Vec::new(),
                authority: Vec::new(),
            };
        }
        if denial.is_some() {
            answer.clear();
        }

        ComposedAnswer {
            rcode,
            authenticated,
            answer,
            authority,
        }
    }
}

/// Compose with validation enforced
pub fn compose_answer(resolution: &Resolution) -> ComposedAnswer {
    PreWireComposer::default().compose(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{AnswerKind, Name, RecordClass, RecordType};
    use crate::validator::{AssertionId, QueryError, ValidationResult};

    fn rrset(owner: &str, rtype: RecordType, kind: AnswerKind) -> RRset {
        let mut rrset = RRset::new(Name::from_ascii(owner).unwrap(), rtype, RecordClass::IN, 300)
            .with_data(vec![192, 0, 2, 1]);
        rrset.ans_kind = kind;
        rrset
    }

    fn resolution(results: Vec<ValidationResult>) -> Resolution {
        Resolution {
            results,
            rounds: 1,
            queries: None,
            assertions: None,
        }
    }

    fn result(rrset: RRset, status: ValidationStatus) -> ValidationResult {
        ValidationResult {
            status,
            trusted: true,
            ..ValidationResult::new(AssertionId(0), rrset)
        }
    }

    #[test]
    fn test_success_sets_ad() {
        let answer = compose_answer(&resolution(vec![result(
            rrset("www.example.com", RecordType::A, AnswerKind::Straight),
            ValidationStatus::Success,
        )]));
        assert_eq!(answer.rcode, Rcode::NoError);
        assert!(answer.authenticated);
        assert_eq!(answer.answer.len(), 1);
        assert!(answer.authority.is_empty());
    }

    #[test]
    fn test_name_denial_is_nxdomain() {
        let status = ValidationStatus::Nonexistent(Denial::Name);
        let answer = compose_answer(&resolution(vec![
            result(rrset("example.com", RecordType::SOA, AnswerKind::NackSoa), status.clone()),
            result(rrset("a.example.com", RecordType::NSEC, AnswerKind::NackNxt), status),
        ]));
        assert_eq!(answer.rcode, Rcode::NxDomain);
        assert!(answer.authenticated);
        assert!(answer.answer.is_empty());
        assert_eq!(answer.authority.len(), 2);
    }

    #[test]
    fn test_type_denial_is_empty_noerror() {
        let status = ValidationStatus::Nonexistent(Denial::Type);
        let answer = compose_answer(&resolution(vec![result(
            rrset("example.com", RecordType::SOA, AnswerKind::NackSoa),
            status,
        )]));
        assert_eq!(answer.rcode, Rcode::NoError);
        assert!(answer.answer.is_empty());
    }

    #[test]
    fn test_failures_are_servfail() {
        for status in [
            ValidationStatus::Bogus,
            ValidationStatus::BogusProof,
            ValidationStatus::IncompleteProof,
            ValidationStatus::IndeterminateDs,
        ] {
            let answer = compose_answer(&resolution(vec![result(
                rrset("www.example.com", RecordType::A, AnswerKind::Straight),
                status,
            )]));
            assert_eq!(answer.rcode, Rcode::ServFail);
            assert!(!answer.authenticated);
            assert!(answer.answer.is_empty());
        }
    }

    #[test]
    fn test_checking_disabled_returns_data_without_ad() {
        let composer = PreWireComposer {
            checking_disabled: true,
        };
        let answer = composer.compose(&resolution(vec![result(
            rrset("www.example.com", RecordType::A, AnswerKind::Straight),
            ValidationStatus::IndeterminateTrust,
        )]));
        assert_eq!(answer.rcode, Rcode::NoError);
        assert!(!answer.authenticated);
        assert_eq!(answer.answer.len(), 1);

        let answer = composer.compose(&resolution(vec![ValidationResult::dns_error(
            None,
            QueryError::NoAnswer,
        )]));
        assert_eq!(answer.rcode, Rcode::ServFail);
    }
}
