//! Outbound query capability.
//!
//! The validator never talks to the network itself. It hands each query to
//! a [`Transport`] and receives the parsed RRsets of the answer:
//! - [`StaticTransport`] answers from an in-memory table or a TOML fixture
//! - anything speaking real DNS implements the trait outside this crate

pub mod memory;

pub use memory::StaticTransport;

use crate::dns::{Name, RRset, RecordClass, RecordType};
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;

/// A parsed answer to one query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// The query name followed by each CNAME target that was chased.
    /// The last element is the name the data is finally owned by.
    pub qnames: Vec<Name>,
    /// Every RRset from every section, signatures attached
    pub rrsets: Vec<RRset>,
}

impl Response {
    pub fn new(qname: Name, rrsets: Vec<RRset>) -> Self {
        Self {
            qnames: vec![qname],
            rrsets,
        }
    }

    pub fn with_cname_target(mut self, target: Name) -> Self {
        self.qnames.push(target);
        self
    }

    /// The final name of the CNAME chain
    pub fn top_name(&self) -> Option<&Name> {
        self.qnames.last()
    }

    /// The name the CNAME chain started from
    pub fn original_name(&self) -> Option<&Name> {
        self.qnames.first()
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one query and wait for its parsed answer
    async fn send_query(
        &self,
        name: &Name,
        rtype: RecordType,
        class: RecordClass,
    ) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_query(
        &self,
        name: &Name,
        rtype: RecordType,
        class: RecordClass,
    ) -> Result<Response, TransportError> {
        (**self).send_query(name, rtype, class).await
    }
}
