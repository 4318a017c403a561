pub mod algorithm;
pub mod crypto;
pub mod denial;
pub mod digest;
pub mod key_tag;
pub mod trust_anchor;

pub use algorithm::DnsSecAlgorithm;
pub use crypto::{RingVerifier, SignatureVerifier};
pub use digest::DigestType;
pub use trust_anchor::{
    Policy, PolicyHandle, TrustAnchor, TrustAnchorList, TrustMatch, ZoneExpectation, ZonePolicy,
};
