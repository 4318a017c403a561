use super::assertion::AssertionId;
use crate::dns::{Name, RecordClass, RecordType};
use crate::error::{Result, TransportError, ValidatorError};
use serde::Serialize;
use std::ops::{Index, IndexMut};
use thiserror::Error;
use tracing::{debug, trace};

/// Handle of a query inside one [`QueryChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryId(pub(crate) usize);

impl QueryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Why a query produced no usable answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("no answer")]
    NoAnswer,

    #[error("conflicting answers")]
    ConflictingAnswers,

    #[error("transport: {0}")]
    Transport(TransportError),

    #[error("name cannot be rendered")]
    BadName,
}

impl From<TransportError> for QueryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NoAnswer => QueryError::NoAnswer,
            TransportError::BadName => QueryError::BadName,
            other => QueryError::Transport(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryState {
    #[default]
    Init,
    Sent,
    Answered,
    ConflictingAnswers,
    Error(QueryError),
}

impl QueryState {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Error(_) | QueryState::ConflictingAnswers)
    }

    /// The failure this state stands for, if any
    pub fn error(&self) -> Option<QueryError> {
        match self {
            QueryState::Error(err) => Some(err.clone()),
            QueryState::ConflictingAnswers => Some(QueryError::ConflictingAnswers),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: Name,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub state: QueryState,
    /// First assertion built from the answer; set once
    pub answer: Option<AssertionId>,
    /// Where the answer's CNAME chain ended, if it left `name`
    pub target: Option<Name>,
}

impl Query {
    fn new(name: Name, rtype: RecordType, class: RecordClass) -> Self {
        Self {
            name,
            rtype,
            class,
            state: QueryState::Init,
            answer: None,
            target: None,
        }
    }

    /// The name the data finally belongs to
    pub fn top_name(&self) -> &Name {
        self.target.as_ref().unwrap_or(&self.name)
    }

    pub fn matches(&self, name: &Name, rtype: RecordType, class: RecordClass) -> bool {
        self.rtype == rtype && self.class == class && &self.name == name
    }
}

/// Every sub-query of one resolve call, deduplicated by (name, type, class)
/// and kept most-recently-needed first.
#[derive(Debug, Clone)]
pub struct QueryChain {
    queries: Vec<Query>,
    order: Vec<QueryId>,
    revision: u64,
    max_queries: usize,
}

impl QueryChain {
    pub fn new(max_queries: usize) -> Self {
        Self {
            queries: Vec::new(),
            order: Vec::new(),
            revision: 0,
            max_queries,
        }
    }

    /// Return the existing query for this triple, moved to the front, or
    /// insert a fresh one at the front.
    pub fn add_query(
        &mut self,
        name: Name,
        rtype: RecordType,
        class: RecordClass,
    ) -> Result<QueryId> {
        if let Some(pos) = self
            .order
            .iter()
            .position(|id| self.queries[id.0].matches(&name, rtype, class))
        {
            let id = self.order[pos];
            if pos != 0 {
                self.order.remove(pos);
                self.order.insert(0, id);
                self.revision += 1;
                trace!("Promoted query {} {} {}", name, rtype, class);
            }
            return Ok(id);
        }

        if self.queries.len() >= self.max_queries {
            return Err(ValidatorError::TooManyQueries(self.max_queries));
        }

        let id = QueryId(self.queries.len());
        debug!("Adding query {} {} {}", name, rtype, class);
        self.queries.push(Query::new(name, rtype, class));
        self.order.insert(0, id);
        self.revision += 1;
        Ok(id)
    }

    pub fn find(&self, name: &Name, rtype: RecordType, class: RecordClass) -> Option<QueryId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.queries[id.0].matches(name, rtype, class))
    }

    /// Front-most query still waiting to be asked
    pub fn first_init(&self) -> Option<QueryId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.queries[id.0].state == QueryState::Init)
    }

    /// Query handles, front first
    pub fn ids(&self) -> impl Iterator<Item = QueryId> + '_ {
        self.order.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, &Query)> + '_ {
        self.order.iter().map(|id| (*id, &self.queries[id.0]))
    }

    /// Changes whenever the front of the chain changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl Index<QueryId> for QueryChain {
    type Output = Query;

    fn index(&self, id: QueryId) -> &Query {
        &self.queries[id.0]
    }
}

impl IndexMut<QueryId> for QueryChain {
    fn index_mut(&mut self, id: QueryId) -> &mut Query {
        &mut self.queries[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    #[test]
    fn test_add_query_dedups_and_promotes() {
        let mut chain = QueryChain::new(16);
        let a = chain
            .add_query(name("example.com"), RecordType::DNSKEY, RecordClass::IN)
            .unwrap();
        let b = chain
            .add_query(name("example.com"), RecordType::DS, RecordClass::IN)
            .unwrap();
        assert_eq!(chain.ids().collect::<Vec<_>>(), vec![b, a]);

        let revision = chain.revision();
        let again = chain
            .add_query(name("EXAMPLE.com"), RecordType::DNSKEY, RecordClass::IN)
            .unwrap();
        assert_eq!(again, a);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.ids().collect::<Vec<_>>(), vec![a, b]);
        assert_ne!(chain.revision(), revision);
    }

    #[test]
    fn test_re_adding_front_keeps_revision() {
        let mut chain = QueryChain::new(16);
        let a = chain
            .add_query(name("example.com"), RecordType::A, RecordClass::IN)
            .unwrap();
        let revision = chain.revision();
        assert_eq!(
            chain
                .add_query(name("example.com"), RecordType::A, RecordClass::IN)
                .unwrap(),
            a
        );
        assert_eq!(chain.revision(), revision);
    }

    #[test]
    fn test_query_budget() {
        let mut chain = QueryChain::new(2);
        chain.add_query(name("a.com"), RecordType::A, RecordClass::IN).unwrap();
        chain.add_query(name("b.com"), RecordType::A, RecordClass::IN).unwrap();
        assert_eq!(
            chain.add_query(name("c.com"), RecordType::A, RecordClass::IN),
            Err(ValidatorError::TooManyQueries(2))
        );
        // existing entries are still reachable at the limit
        assert!(chain.add_query(name("a.com"), RecordType::A, RecordClass::IN).is_ok());
    }

    #[test]
    fn test_first_init_skips_sent() {
        let mut chain = QueryChain::new(8);
        let a = chain.add_query(name("a.com"), RecordType::A, RecordClass::IN).unwrap();
        let b = chain.add_query(name("b.com"), RecordType::A, RecordClass::IN).unwrap();
        assert_eq!(chain.first_init(), Some(b));
        chain[b].state = QueryState::Sent;
        assert_eq!(chain.first_init(), Some(a));
        chain[a].state = QueryState::Error(QueryError::NoAnswer);
        assert_eq!(chain.first_init(), None);
        assert!(chain[a].state.is_error());
    }

    #[test]
    fn test_transport_error_mapping() {
        assert_eq!(QueryError::from(TransportError::NoAnswer), QueryError::NoAnswer);
        assert_eq!(QueryError::from(TransportError::BadName), QueryError::BadName);
        assert_eq!(
            QueryError::from(TransportError::Timeout),
            QueryError::Transport(TransportError::Timeout)
        );
        assert_eq!(
            QueryState::ConflictingAnswers.error(),
            Some(QueryError::ConflictingAnswers)
        );
    }
}
