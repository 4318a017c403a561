use std::fmt;

/// DNSSEC algorithm numbers the validator knows about (RFC 8624 table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DnsSecAlgorithm {
    RsaMd5 = 1,
    Dsa = 3,
    RsaSha1 = 5,
    DsaNsec3Sha1 = 6,
    RsaSha1Nsec3Sha1 = 7,
    RsaSha256 = 8,
    RsaSha512 = 10,
    EccGost = 12,
    EcdsaP256Sha256 = 13,
    EcdsaP384Sha384 = 14,
    Ed25519 = 15,
    Ed448 = 16,
}

impl DnsSecAlgorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RsaMd5),
            3 => Some(Self::Dsa),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            16 => Some(Self::Ed448),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether [`RingVerifier`](super::crypto::RingVerifier) can check
    /// signatures made with this algorithm
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RsaSha1
                | Self::RsaSha1Nsec3Sha1
                | Self::RsaSha256
                | Self::RsaSha512
                | Self::EcdsaP256Sha256
                | Self::EcdsaP384Sha384
                | Self::Ed25519
        )
    }

    pub fn is_rsa(&self) -> bool {
        matches!(
            self,
            Self::RsaMd5 | Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 | Self::RsaSha256 | Self::RsaSha512
        )
    }

    /// RSA verification parameters; ring wants the key split into its
    /// components, so these are used with `RsaPublicKeyComponents`
    pub fn rsa_parameters(&self) -> Option<&'static ring::signature::RsaParameters> {
        match self {
            Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 => {
                Some(&ring::signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY)
            }
            Self::RsaSha256 => Some(&ring::signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY),
            Self::RsaSha512 => Some(&ring::signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY),
            _ => None,
        }
    }

    /// Verification algorithm for keys ring accepts as a single byte string
    pub fn ring_algorithm(&self) -> Option<&'static dyn ring::signature::VerificationAlgorithm> {
        match self {
            Self::EcdsaP256Sha256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED),
            Self::EcdsaP384Sha384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED),
            Self::Ed25519 => Some(&ring::signature::ED25519),
            _ => None,
        }
    }
}

impl fmt::Display for DnsSecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RsaMd5 => "RSAMD5",
            Self::Dsa => "DSA",
            Self::RsaSha1 => "RSASHA1",
            Self::DsaNsec3Sha1 => "DSA-NSEC3-SHA1",
            Self::RsaSha1Nsec3Sha1 => "RSASHA1-NSEC3-SHA1",
            Self::RsaSha256 => "RSASHA256",
            Self::RsaSha512 => "RSASHA512",
            Self::EccGost => "ECC-GOST",
            Self::EcdsaP256Sha256 => "ECDSAP256SHA256",
            Self::EcdsaP384Sha384 => "ECDSAP384SHA384",
            Self::Ed25519 => "ED25519",
            Self::Ed448 => "ED448",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_support() {
        assert_eq!(DnsSecAlgorithm::from_u8(8), Some(DnsSecAlgorithm::RsaSha256));
        assert_eq!(DnsSecAlgorithm::from_u8(2), None);
        assert!(DnsSecAlgorithm::EcdsaP256Sha256.is_supported());
        assert!(!DnsSecAlgorithm::Dsa.is_supported());
        assert!(DnsSecAlgorithm::RsaSha512.rsa_parameters().is_some());
        assert!(DnsSecAlgorithm::RsaSha512.ring_algorithm().is_none());
        assert_eq!(DnsSecAlgorithm::Ed25519.to_string(), "ED25519");
    }
}
