pub mod enums;
pub mod name;
pub mod rdata;
pub mod rrset;

pub use enums::{RecordClass, RecordType};
pub use name::Name;
pub use rdata::{Dnskey, Ds, Nsec, Rrsig};
pub use rrset::{AnswerKind, Credibility, RRset, Rr, RrsetStatus, Section, SigStatus};
