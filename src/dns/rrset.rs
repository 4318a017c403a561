use super::enums::{RecordClass, RecordType};
use super::name::Name;
use super::rdata::{Dnskey, Ds, Rrsig};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Message section an RRset arrived in
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Answer,
    Authority,
    Additional,
}

/// How much an RRset is believed, best first (RFC 2181 §5.4.1)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Credibility {
    LocalFile,
    AuthAnswer,
    AuthAuthority,
    #[default]
    NonAuthAnswer,
    Additional,
}

/// Role an RRset plays in answering the query that fetched it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    #[default]
    Unset,
    Straight,
    Cname,
    NackNxt,
    NackSoa,
    BareRrsig,
}

impl AnswerKind {
    pub fn is_nack(self) -> bool {
        matches!(self, AnswerKind::NackNxt | AnswerKind::NackSoa)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RrsetStatus {
    #[default]
    Unchecked,
    Wrong,
    Verified,
}

/// Outcome of checking one RRSIG
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SigStatus {
    #[default]
    Unset,
    Verified,
    WildcardVerified,
    WrongLabelCount,
    AlgorithmMismatch,
    InvalidKey,
    RrsigNotYetActive,
    RrsigExpired,
    AlgorithmNotSupported,
    DnskeyNoMatch,
    /// Signer is not the owner or one of its ancestors
    KeyNotAuthorized,
    BadDelegation,
    NotVerified,
}

impl SigStatus {
    pub fn is_verified(self) -> bool {
        matches!(self, SigStatus::Verified | SigStatus::WildcardVerified)
    }
}

/// One resource record's rdata plus its verification status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rr {
    pub rdata: Bytes,
    pub status: SigStatus,
}

impl Rr {
    pub fn new(rdata: impl Into<Bytes>) -> Self {
        Self {
            rdata: rdata.into(),
            status: SigStatus::Unset,
        }
    }
}

/// A set of records sharing owner, type and class, with the RRSIGs that
/// cover it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRset {
    pub name: Name,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: Vec<Rr>,
    pub sigs: Vec<Rr>,
    pub status: RrsetStatus,
    pub section: Section,
    pub ans_kind: AnswerKind,
    pub cred: Credibility,
}

impl RRset {
    pub fn new(name: Name, rtype: RecordType, class: RecordClass, ttl: u32) -> Self {
        Self {
            name,
            rtype,
            class,
            ttl,
            data: Vec::new(),
            sigs: Vec::new(),
            status: RrsetStatus::Unchecked,
            section: Section::Answer,
            ans_kind: AnswerKind::Unset,
            cred: Credibility::NonAuthAnswer,
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub fn with_credibility(mut self, cred: Credibility) -> Self {
        self.cred = cred;
        self
    }

    pub fn with_data(mut self, rdata: impl Into<Bytes>) -> Self {
        self.push_data(rdata);
        self
    }

    pub fn with_sig(mut self, rdata: impl Into<Bytes>) -> Self {
        self.push_sig(rdata);
        self
    }

    pub fn push_data(&mut self, rdata: impl Into<Bytes>) {
        self.data.push(Rr::new(rdata));
    }

    pub fn push_sig(&mut self, rdata: impl Into<Bytes>) {
        self.sigs.push(Rr::new(rdata));
    }

    /// Sort records into canonical order and drop duplicates (RFC 4034 §6.3)
    pub fn canonicalize(&mut self) {
        self.data.sort_by(|a, b| a.rdata.cmp(&b.rdata));
        self.data.dedup_by(|a, b| a.rdata == b.rdata);
    }

    /// RRSIGs that parse, paired with their index in `sigs`
    pub fn parsed_sigs(&self) -> impl Iterator<Item = (usize, Rrsig)> + '_ {
        self.sigs
            .iter()
            .enumerate()
            .filter_map(|(idx, rr)| Rrsig::parse(&rr.rdata).ok().map(|sig| (idx, sig)))
    }

    /// DNSKEY records that parse; empty for any other type
    pub fn dnskeys(&self) -> Vec<Dnskey> {
        if self.rtype != RecordType::DNSKEY {
            return Vec::new();
        }
        self.data
            .iter()
            .filter_map(|rr| Dnskey::parse(&rr.rdata).ok())
            .collect()
    }

    /// DS records that parse; empty for any other type
    pub fn ds_records(&self) -> Vec<Ds> {
        if self.rtype != RecordType::DS {
            return Vec::new();
        }
        self.data
            .iter()
            .filter_map(|rr| Ds::parse(&rr.rdata).ok())
            .collect()
    }

    pub fn is_nack(&self) -> bool {
        self.ans_kind.is_nack()
    }

    /// True when the (name, type, class) triple matches
    pub fn same_key(&self, name: &Name, rtype: RecordType, class: RecordClass) -> bool {
        self.rtype == rtype && self.class == class && &self.name == name
    }
}
