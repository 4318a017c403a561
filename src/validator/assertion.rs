use super::query::{QueryError, QueryId};
use crate::dns::{RRset, SigStatus};
use serde::Serialize;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Handle of an assertion inside one [`AssertionChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AssertionId(pub(crate) usize);

impl AssertionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What an unfinished assertion is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pending {
    Init,
    WaitForTrust,
    WaitForRrsig,
    CanVerify,
}

/// Reasons an assertion can make no further progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    DataMissing,
    BareRrsig,
    WrongAnswer,
    IrrelevantProof,
    RrsigMissing,
    DnskeyMissing,
    DsMissing,
    NoTrustAnchor,
    UntrustedZone,
    Dns(QueryError),
}

/// How an assertion came to be believed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Proven {
    Verified,
    TrustedKey,
    TrustedZone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionState {
    Incomplete(Pending),
    Error(AssertionError),
    Failure(SigStatus),
    /// The record expected to vouch for this one was proven absent
    NegativeProof,
    Success(Proven),
}

impl Default for AssertionState {
    fn default() -> Self {
        AssertionState::Incomplete(Pending::Init)
    }
}

impl AssertionState {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, AssertionState::Incomplete(_))
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_incomplete()
    }

    pub fn is_trusted(&self) -> bool {
        matches!(
            self,
            AssertionState::Success(Proven::TrustedKey | Proven::TrustedZone)
        )
    }

    pub fn pending(&self) -> Option<Pending> {
        match self {
            AssertionState::Incomplete(pending) => Some(*pending),
            _ => None,
        }
    }
}

impl fmt::Display for AssertionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionState::Incomplete(pending) => write!(f, "incomplete({:?})", pending),
            AssertionState::Error(AssertionError::Dns(err)) => write!(f, "dns_error({})", err),
            AssertionState::Error(err) => write!(f, "error({:?})", err),
            AssertionState::Failure(status) => write!(f, "failure({:?})", status),
            AssertionState::NegativeProof => write!(f, "negative_proof"),
            AssertionState::Success(proven) => write!(f, "success({:?})", proven),
        }
    }
}

/// One RRset pending or done with verification, plus its edges in the
/// chain of trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub rrset: RRset,
    pub state: AssertionState,
    /// The assertion whose keys (or DS) vouch for this one
    pub trust: Option<AssertionId>,
    /// Next assertion built from the same response
    pub more_data: Option<AssertionId>,
    pub pending_query: Option<QueryId>,
    /// The query whose answer produced this assertion
    pub origin: QueryId,
}

/// Arena holding every assertion of one resolve call
#[derive(Debug, Clone, Default)]
pub struct AssertionChain {
    nodes: Vec<Assertion>,
}

impl AssertionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rrset: RRset, origin: QueryId) -> AssertionId {
        let id = AssertionId(self.nodes.len());
        self.nodes.push(Assertion {
            rrset,
            state: AssertionState::default(),
            trust: None,
            more_data: None,
            pending_query: None,
            origin,
        });
        id
    }

    /// `first` and every assertion reachable through `more_data`
    pub fn siblings(&self, first: AssertionId) -> Siblings<'_> {
        Siblings {
            chain: self,
            next: Some(first),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssertionId, &Assertion)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (AssertionId(idx), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<AssertionId> for AssertionChain {
    type Output = Assertion;

    fn index(&self, id: AssertionId) -> &Assertion {
        &self.nodes[id.0]
    }
}

impl IndexMut<AssertionId> for AssertionChain {
    fn index_mut(&mut self, id: AssertionId) -> &mut Assertion {
        &mut self.nodes[id.0]
    }
}

pub struct Siblings<'a> {
    chain: &'a AssertionChain,
    next: Option<AssertionId>,
}

impl Iterator for Siblings<'_> {
    type Item = AssertionId;

    fn next(&mut self) -> Option<AssertionId> {
        let current = self.next?;
        self.next = self.chain[current].more_data;
        Some(current)
    }
}
