use super::{Response, Transport};
use crate::dns::{Credibility, Name, RRset, RecordClass, RecordType, Section};
use crate::error::{ConfigError, TransportError};
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

type QueryKey = (Name, RecordType, RecordClass);

/// [`Transport`] answering from a fixed table of responses.
///
/// Unknown questions fail with [`TransportError::NoAnswer`]. Every call,
/// answered or not, is counted.
#[derive(Debug, Default)]
pub struct StaticTransport {
    answers: RwLock<FxHashMap<QueryKey, Result<Response, TransportError>>>,
    served: AtomicUsize,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: Name, rtype: RecordType, class: RecordClass, response: Response) {
        self.answers.write().insert((name, rtype, class), Ok(response));
    }

    pub fn insert_error(
        &self,
        name: Name,
        rtype: RecordType,
        class: RecordClass,
        error: TransportError,
    ) {
        self.answers.write().insert((name, rtype, class), Err(error));
    }

    /// Number of queries sent so far
    pub fn queries_served(&self) -> usize {
        self.served.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.answers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.read().is_empty()
    }

    /// Build a transport from a TOML fixture.
    ///
    /// ```toml
    /// [[response]]
    /// name = "www.example.com"
    /// type = "A"
    ///
    /// [[response.rrset]]
    /// name = "www.example.com"
    /// type = "A"
    /// ttl = 300
    /// rdata = ["c0000201"]
    /// sigs = ["0001..."]
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let fixture: Fixture = toml::from_str(text)?;
        let transport = Self::new();

        for entry in fixture.response {
            let name = Name::from_ascii(&entry.name)?;
            let result = match entry.error.as_deref() {
                Some(code) => Err(parse_error(code)?),
                None => {
                    let mut response = Response::new(name.clone(), Vec::new());
                    for target in &entry.cnames {
                        response = response.with_cname_target(Name::from_ascii(target)?);
                    }
                    for set in &entry.rrset {
                        response.rrsets.push(set.to_rrset()?);
                    }
                    Ok(response)
                }
            };
            transport
                .answers
                .write()
                .insert((name, entry.rtype, entry.class), result);
        }

        debug!("Loaded {} fixture responses", transport.len());
        Ok(transport)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn send_query(
        &self,
        name: &Name,
        rtype: RecordType,
        class: RecordClass,
    ) -> Result<Response, TransportError> {
        self.served.fetch_add(1, Ordering::Relaxed);
        let key = (name.clone(), rtype, class);
        let answer = self.answers.read().get(&key).cloned();
        trace!("Static answer for {} {} {}: {:?}", name, rtype, class, answer.is_some());
        answer.unwrap_or(Err(TransportError::NoAnswer))
    }
}

fn parse_error(code: &str) -> Result<TransportError, ConfigError> {
    match code {
        "no_answer" => Ok(TransportError::NoAnswer),
        "timeout" => Ok(TransportError::Timeout),
        "servfail" => Ok(TransportError::Rcode(2)),
        "nxdomain" => Ok(TransportError::Rcode(3)),
        "refused" => Ok(TransportError::Rcode(5)),
        other => Err(ConfigError::InvalidValue {
            field: "error",
            value: other.to_string(),
        }),
    }
}

fn default_ttl() -> u32 {
    3600
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default)]
    response: Vec<FixtureResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureResponse {
    name: String,
    #[serde(rename = "type")]
    rtype: RecordType,
    #[serde(default)]
    class: RecordClass,
    #[serde(default)]
    cnames: Vec<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    rrset: Vec<FixtureRrset>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureRrset {
    name: String,
    #[serde(rename = "type")]
    rtype: RecordType,
    #[serde(default)]
    class: RecordClass,
    #[serde(default = "default_ttl")]
    ttl: u32,
    #[serde(default)]
    section: Section,
    #[serde(default)]
    credibility: Credibility,
    #[serde(default)]
    rdata: Vec<String>,
    #[serde(default)]
    sigs: Vec<String>,
}

impl FixtureRrset {
    fn to_rrset(&self) -> Result<RRset, ConfigError> {
        let mut rrset = RRset::new(Name::from_ascii(&self.name)?, self.rtype, self.class, self.ttl)
            .with_section(self.section)
            .with_credibility(self.credibility);
        for rdata in &self.rdata {
            rrset.push_data(decode_hex("rdata", rdata)?);
        }
        for sig in &self.sigs {
            rrset.push_sig(decode_hex("sigs", sig)?);
        }
        Ok(rrset)
    }
}

fn decode_hex(field: &'static str, text: &str) -> Result<Vec<u8>, ConfigError> {
    let compact: String = text.split_whitespace().collect();
    hex::decode(&compact).map_err(|_| ConfigError::InvalidValue {
        field,
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_question_is_no_answer() {
        let transport = StaticTransport::new();
        let result = transport
            .send_query(&name("example.com"), RecordType::A, RecordClass::IN)
            .await;
        assert_eq!(result, Err(TransportError::NoAnswer));
        assert_eq!(transport.queries_served(), 1);
    }

    #[tokio::test]
    async fn test_fixture_round_trip() {
        let transport = StaticTransport::from_toml(
            r#"
            [[response]]
            name = "alias.example.com"
            type = "A"
            cnames = ["www.example.com"]

            [[response.rrset]]
            name = "alias.example.com"
            type = "CNAME"
            rdata = ["03777777076578616d706c6503636f6d00"]

            [[response.rrset]]
            name = "www.example.com"
            type = "A"
            ttl = 300
            credibility = "auth_answer"
            rdata = ["c0000201", "c0000202"]

            [[response]]
            name = "slow.example.com"
            type = "A"
            error = "timeout"
            "#,
        )
        .unwrap();
        assert_eq!(transport.len(), 2);

        let response = transport
            .send_query(&name("alias.example.com"), RecordType::A, RecordClass::IN)
            .await
            .unwrap();
        assert_eq!(response.top_name(), Some(&name("www.example.com")));
        assert_eq!(response.original_name(), Some(&name("alias.example.com")));
        assert_eq!(response.rrsets.len(), 2);
        assert_eq!(response.rrsets[1].data.len(), 2);
        assert_eq!(response.rrsets[1].cred, Credibility::AuthAnswer);

        let slow = transport
            .send_query(&name("slow.example.com"), RecordType::A, RecordClass::IN)
            .await;
        assert_eq!(slow, Err(TransportError::Timeout));
    }

    #[test]
    fn test_fixture_rejects_bad_hex() {
        let err = StaticTransport::from_toml(
            r#"
            [[response]]
            name = "example.com"
            type = "A"
            [[response.rrset]]
            name = "example.com"
            type = "A"
            rdata = ["zz"]
            "#,
        );
        assert!(matches!(err, Err(ConfigError::InvalidValue { field: "rdata", .. })));
    }
}
