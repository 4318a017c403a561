//! The validating resolver.
//!
//! One call to [`Validator::resolve_and_check`] owns a [`QueryChain`] and an
//! [`AssertionChain`]. It loops over three steps until every answer has a
//! verdict:
//! - answer pending queries from the shared [`RrsetCache`]
//! - send the front-most unanswered query through the [`Transport`]
//! - walk the chain of trust above each answer, verifying what can be
//!   verified
//!
//! Negative answers then go through the NSEC prover.

pub mod assertion;
pub mod builder;
pub mod proof;
pub mod query;
pub mod status;
mod verify;

pub use assertion::{
    Assertion, AssertionChain, AssertionError, AssertionId, AssertionState, Pending, Proven,
};
pub use query::{Query, QueryChain, QueryError, QueryId, QueryState};
pub use status::{Denial, ValidationResult, ValidationStatus};

use crate::cache::RrsetCache;
use crate::config::ValidatorConfig;
use crate::dns::{Name, RecordClass, RecordType, RrsetStatus};
use crate::dnssec::{Policy, PolicyHandle, RingVerifier, SignatureVerifier};
use crate::error::{Result, ValidatorError};
use crate::transport::{Response, Transport};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

/// Options for one resolve call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveFlags {
    /// Return the query and assertion chains along with the results
    pub keep_chain: bool,
}

/// Everything one resolve call produced
#[derive(Debug, Clone)]
pub struct Resolution {
    pub results: Vec<ValidationResult>,
    pub rounds: usize,
    pub queries: Option<QueryChain>,
    pub assertions: Option<AssertionChain>,
}

impl Resolution {
    /// True when there is at least one result and every result is trusted
    pub fn is_trusted(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.status.is_trusted())
    }

    pub fn is_authentic(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.status.is_authentic())
    }
}

/// Per-call working state shared by the builder, verifier and prover
pub(crate) struct Session<'a> {
    queries: QueryChain,
    assertions: AssertionChain,
    policy: &'a Policy,
    verifier: &'a dyn SignatureVerifier,
    clock_skew: u32,
    max_chain_depth: usize,
    now: u32,
}

impl<'a> Session<'a> {
    fn new(
        policy: &'a Policy,
        verifier: &'a dyn SignatureVerifier,
        config: &ValidatorConfig,
        now: u32,
    ) -> Self {
        Self {
            queries: QueryChain::new(config.max_queries),
            assertions: AssertionChain::new(),
            policy,
            verifier,
            clock_skew: config.clock_skew,
            max_chain_depth: config.max_chain_depth,
            now,
        }
    }
}

/// DNSSEC-validating resolver over a [`Transport`]
pub struct Validator<T, V = RingVerifier> {
    transport: T,
    verifier: V,
    cache: Arc<RrsetCache>,
    policy: Arc<PolicyHandle>,
    config: ValidatorConfig,
    /// Current time for signature validation (for testing)
    current_time: Option<u32>,
}

impl<T: Transport> Validator<T, RingVerifier> {
    pub fn new(transport: T, policy: Policy) -> Self {
        Self::with_verifier(transport, RingVerifier::new(), policy)
    }
}

impl<T: Transport, V: SignatureVerifier> Validator<T, V> {
    pub fn with_verifier(transport: T, verifier: V, policy: Policy) -> Self {
        let config = ValidatorConfig::default();
        Self {
            transport,
            verifier,
            cache: Arc::new(RrsetCache::from_config(&config)),
            policy: Arc::new(PolicyHandle::new(policy)),
            config,
            current_time: None,
        }
    }

    /// Replace the configuration and start a cache sized by it. Call
    /// before [`Validator::with_cache`] when sharing a cache.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.cache = Arc::new(RrsetCache::from_config(&config));
        self.config = config;
        self
    }

    /// Share a cache with other validators
    pub fn with_cache(mut self, cache: Arc<RrsetCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Share a reloadable policy with other validators
    pub fn with_policy_handle(mut self, policy: Arc<PolicyHandle>) -> Self {
        self.policy = policy;
        self
    }

    /// Set current time for testing
    pub fn set_current_time(&mut self, time: u32) {
        self.current_time = Some(time);
    }

    fn now(&self) -> u32 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or_default()
        })
    }

    pub fn cache(&self) -> &Arc<RrsetCache> {
        &self.cache
    }

    pub fn policy(&self) -> &Arc<PolicyHandle> {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Resolve `name`/`rtype`/`class` and validate every answer RRset
    pub async fn resolve_and_check(
        &self,
        name: &Name,
        rtype: RecordType,
        class: RecordClass,
        flags: ResolveFlags,
    ) -> Result<Resolution> {
        let policy = self.policy.snapshot();
        let mut session = Session::new(&policy, &self.verifier, &self.config, self.now());
        let top = session.queries.add_query(name.clone(), rtype, class)?;
        debug!("Resolving {} {} {}", name, rtype, class);

        let mut results: Vec<ValidationResult> = Vec::new();
        let mut rounds = 0;

        loop {
            rounds += 1;
            if rounds > self.config.max_rounds {
                warn!("Giving up on {} {} after {} rounds", name, rtype, self.config.max_rounds);
                return Err(ValidatorError::RoundBudget(self.config.max_rounds));
            }

            let revision = session.queries.revision();
            if self.config.cache_enabled {
                self.ask_cache(&mut session)?;
            }
            self.ask_resolver(&mut session).await?;

            if session.queries.revision() != revision {
                trace!("New queries queued, looking them up first");
                continue;
            }

            let top_query = &session.queries[top];
            if top_query.state != QueryState::Answered {
                let err = top_query.state.error().unwrap_or(QueryError::NoAnswer);
                debug!("Query {} {} failed: {}", name, rtype, err);
                results = vec![ValidationResult::dns_error(top_query.answer, err)];
                break;
            }
            let Some(answer) = top_query.answer else {
                results = vec![ValidationResult::dns_error(None, QueryError::NoAnswer)];
                break;
            };

            if session.verify_and_validate(answer, &mut results)? {
                break;
            }
        }

        let negative = status::fixup(&mut results);
        if negative {
            let qname = session.queries[top].top_name().clone();
            proof::prove_nonexistence(&qname, &mut results);
        }

        for result in &results {
            debug!("{} {} {}: {}", name, rtype, class, result.status);
        }

        let (queries, assertions) = if flags.keep_chain {
            (Some(session.queries), Some(session.assertions))
        } else {
            (None, None)
        };
        Ok(Resolution {
            results,
            rounds,
            queries,
            assertions,
        })
    }

    /// Resolve several questions concurrently over the shared cache
    pub async fn resolve_batch(
        &self,
        questions: &[(Name, RecordType, RecordClass)],
        flags: ResolveFlags,
    ) -> Vec<Result<Resolution>> {
        join_all(
            questions
                .iter()
                .map(|(name, rtype, class)| self.resolve_and_check(name, *rtype, *class, flags)),
        )
        .await
    }

    /// Answer every pending query the cache can, repeating while answers
    /// queue further queries the cache may also hold
    fn ask_cache(&self, session: &mut Session<'_>) -> Result<()> {
        loop {
            let hit = session.queries.ids().find_map(|id| {
                let query = &session.queries[id];
                if query.state != QueryState::Init {
                    return None;
                }
                self.cache
                    .get(&query.name, query.rtype, query.class)
                    .map(|rrset| (id, rrset))
            });
            let Some((id, rrset)) = hit else {
                return Ok(());
            };

            let query = &mut session.queries[id];
            trace!("Answering {} {} from cache", query.name, query.rtype);
            query.state = QueryState::Answered;
            let response = Response::new(query.name.clone(), vec![rrset]);
            session.assimilate_answers(id, &response)?;
        }
    }

    /// Send the front-most unasked query and fold in its answer
    async fn ask_resolver(&self, session: &mut Session<'_>) -> Result<bool> {
        let Some(id) = session.queries.first_init() else {
            return Ok(false);
        };
        let query = &mut session.queries[id];
        query.state = QueryState::Sent;
        let (name, rtype, class) = (query.name.clone(), query.rtype, query.class);
        debug!("Sending query {} {} {}", name, rtype, class);

        match self.transport.send_query(&name, rtype, class).await {
            Ok(response) if response.is_empty() => {
                debug!("Empty answer for {} {}", name, rtype);
                session.queries[id].state = QueryState::Error(QueryError::NoAnswer);
            }
            Ok(response) => {
                session.queries[id].state = QueryState::Answered;
                session.assimilate_answers(id, &response)?;
                if self.config.cache_enabled {
                    self.stow_accepted(session, id, response);
                }
            }
            Err(err) => {
                warn!("Query {} {} {} failed: {}", name, rtype, class, err);
                session.queries[id].state = QueryState::Error(err.into());
            }
        }
        Ok(true)
    }

    /// Cache the RRsets of `response` that were taken as answers to `id`.
    /// Nothing is kept from a response whose answers conflict.
    fn stow_accepted(&self, session: &Session<'_>, id: QueryId, response: Response) {
        let query = &session.queries[id];
        if query.state == QueryState::ConflictingAnswers {
            debug!("Not caching conflicting answers for {} {}", query.name, query.rtype);
            return;
        }
        let accepted: Vec<bool> = query
            .answer
            .map(|first| {
                session
                    .assertions
                    .siblings(first)
                    .map(|sibling| session.assertions[sibling].rrset.status != RrsetStatus::Wrong)
                    .collect()
            })
            .unwrap_or_default();

        self.cache.stow_all(
            response
                .rrsets
                .into_iter()
                .zip(accepted)
                .filter(|(rrset, accepted)| {
                    *accepted && (!rrset.data.is_empty() || !rrset.sigs.is_empty())
                })
                .map(|(rrset, _)| rrset),
        );
    }
}
