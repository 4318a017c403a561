use super::assertion::{AssertionId, AssertionState};
use super::query::QueryError;
use crate::dns::RRset;
use serde::{Serialize, Serializer};
use std::fmt;

/// What kind of non-existence an NSEC proof established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// The name does not exist at all
    Name,
    /// The name exists but holds no data of the queried type
    Type,
}

/// Verdict for one answer RRset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Not decided yet
    #[default]
    DontKnow,
    /// Every signature up the chain checked out so far
    VerifiedChain,
    Success,
    /// Reserved for a provably unsigned delegation; never produced
    ProvablyInsecure,
    Bogus,
    BogusProof,
    IncompleteProof,
    Nonexistent(Denial),
    IndeterminateTrust,
    IndeterminateDs,
    IndeterminateProof,
    IndeterminateError,
    IndeterminateZone,
    BareRrsig,
    DnsError(QueryError),
}

impl ValidationStatus {
    /// Ordering used to keep a walk from softening an earlier verdict
    pub fn severity(&self) -> u8 {
        use ValidationStatus::*;
        match self {
            DontKnow => 0,
            VerifiedChain | Success | ProvablyInsecure | Nonexistent(_) => 1,
            BareRrsig => 2,
            IncompleteProof | IndeterminateTrust | IndeterminateDs | IndeterminateProof
            | IndeterminateError | IndeterminateZone | DnsError(_) => 3,
            Bogus | BogusProof => 4,
        }
    }

    /// Data that was validated, or whose absence was
    pub fn is_authentic(&self) -> bool {
        matches!(self, ValidationStatus::Success | ValidationStatus::Nonexistent(_))
    }

    pub fn is_trusted(&self) -> bool {
        self.is_authentic() || *self == ValidationStatus::ProvablyInsecure
    }

    pub fn code(&self) -> &'static str {
        use ValidationStatus::*;
        match self {
            DontKnow => "dont_know",
            VerifiedChain => "verified_chain",
            Success => "success",
            ProvablyInsecure => "provably_insecure",
            Bogus => "bogus",
            BogusProof => "bogus_proof",
            IncompleteProof => "incomplete_proof",
            Nonexistent(Denial::Name) => "nonexistent_name",
            Nonexistent(Denial::Type) => "nonexistent_type",
            IndeterminateTrust => "indeterminate_trust",
            IndeterminateDs => "indeterminate_ds",
            IndeterminateProof => "indeterminate_proof",
            IndeterminateError => "indeterminate_error",
            IndeterminateZone => "indeterminate_zone",
            BareRrsig => "bare_rrsig",
            DnsError(_) => "dns_error",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ValidationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Move `current` to `next` unless that would make it less severe
pub fn escalate(current: &mut ValidationStatus, next: ValidationStatus) {
    if next.severity() >= current.severity() {
        *current = next;
    }
}

/// Outcome for one answer RRset of the top query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub assertion: Option<AssertionId>,
    pub rrset: Option<RRset>,
    pub status: ValidationStatus,
    /// A trust anchor or trusted zone was reached
    pub trusted: bool,
    /// State of the assertion the chain walk stopped at
    pub detail: Option<AssertionState>,
}

impl ValidationResult {
    pub fn new(assertion: AssertionId, rrset: RRset) -> Self {
        Self {
            assertion: Some(assertion),
            rrset: Some(rrset),
            status: ValidationStatus::DontKnow,
            trusted: false,
            detail: None,
        }
    }

    pub fn dns_error(assertion: Option<AssertionId>, err: QueryError) -> Self {
        Self {
            assertion,
            rrset: None,
            status: ValidationStatus::DnsError(err),
            trusted: false,
            detail: None,
        }
    }

    pub fn is_nack(&self) -> bool {
        self.rrset.as_ref().is_some_and(|rrset| rrset.is_nack())
    }
}

/// Settle the verdicts left by the chain walks. Returns true when a
/// negative answer still has to be proven.
pub fn fixup(results: &mut [ValidationResult]) -> bool {
    let mut partially_correct = false;
    let mut negative = false;

    for result in results.iter_mut() {
        if matches!(
            result.status,
            ValidationStatus::DontKnow | ValidationStatus::VerifiedChain
        ) {
            result.status = if result.trusted {
                ValidationStatus::Success
            } else {
                ValidationStatus::IndeterminateTrust
            };
        }
        if result.status != ValidationStatus::Success {
            partially_correct = true;
        }
        if result.is_nack() {
            negative = true;
        }
    }

    if negative && partially_correct {
        for result in results.iter_mut() {
            result.status = ValidationStatus::BogusProof;
        }
        return false;
    }
    negative
}
