//! Typed views over the rdata of the DNSSEC record types the validator
//! has to look inside of.

use super::enums::RecordType;
use super::name::Name;
use crate::dnssec::key_tag::key_tag;
use crate::error::RdataError;

/// DNSKEY flag: the key is a zone key
pub const DNSKEY_ZONE_KEY: u16 = 0x0100;

/// DNSKEY flag: secure entry point
pub const DNSKEY_SEP: u16 = 0x0001;

/// The only protocol value a DNSKEY may carry
pub const DNSKEY_PROTOCOL: u8 = 3;

fn be_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn be_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// RRSIG rdata (RFC 4034 §3.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: RecordType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer: Name,
    pub signature: Vec<u8>,
}

impl Rrsig {
    const FIXED_LEN: usize = 18;

    pub fn parse(rdata: &[u8]) -> Result<Self, RdataError> {
        if rdata.len() < Self::FIXED_LEN + 1 {
            return Err(RdataError::Truncated("RRSIG"));
        }

        let (signer, used) = Name::from_wire(&rdata[Self::FIXED_LEN..])?;
        Ok(Self {
            type_covered: RecordType::from(be_u16(rdata, 0)),
            algorithm: rdata[2],
            labels: rdata[3],
            original_ttl: be_u32(rdata, 4),
            expiration: be_u32(rdata, 8),
            inception: be_u32(rdata, 12),
            key_tag: be_u16(rdata, 16),
            signer,
            signature: rdata[Self::FIXED_LEN + used..].to_vec(),
        })
    }

    /// Rdata with the signature field left off, which is the prefix of the
    /// data a signature is computed over.
    pub fn signed_prefix(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::FIXED_LEN + self.signer.wire_len());
        data.extend_from_slice(&self.type_covered.to_u16().to_be_bytes());
        data.push(self.algorithm);
        data.push(self.labels);
        data.extend_from_slice(&self.original_ttl.to_be_bytes());
        data.extend_from_slice(&self.expiration.to_be_bytes());
        data.extend_from_slice(&self.inception.to_be_bytes());
        data.extend_from_slice(&self.key_tag.to_be_bytes());
        data.extend_from_slice(self.signer.as_wire());
        data
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = self.signed_prefix();
        data.extend_from_slice(&self.signature);
        data
    }
}

/// DNSKEY rdata (RFC 4034 §2.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl Dnskey {
    pub fn parse(rdata: &[u8]) -> Result<Self, RdataError> {
        if rdata.len() < 4 {
            return Err(RdataError::Truncated("DNSKEY"));
        }
        Ok(Self {
            flags: be_u16(rdata, 0),
            protocol: rdata[2],
            algorithm: rdata[3],
            public_key: rdata[4..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + self.public_key.len());
        data.extend_from_slice(&self.flags.to_be_bytes());
        data.push(self.protocol);
        data.push(self.algorithm);
        data.extend_from_slice(&self.public_key);
        data
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & DNSKEY_ZONE_KEY != 0
    }

    pub fn is_sep(&self) -> bool {
        self.flags & DNSKEY_SEP != 0
    }

    pub fn key_tag(&self) -> u16 {
        key_tag(self.algorithm, &self.to_bytes())
    }
}

/// DS rdata (RFC 4034 §5.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

impl Ds {
    pub fn parse(rdata: &[u8]) -> Result<Self, RdataError> {
        if rdata.len() < 5 {
            return Err(RdataError::Truncated("DS"));
        }
        Ok(Self {
            key_tag: be_u16(rdata, 0),
            algorithm: rdata[2],
            digest_type: rdata[3],
            digest: rdata[4..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + self.digest.len());
        data.extend_from_slice(&self.key_tag.to_be_bytes());
        data.push(self.algorithm);
        data.push(self.digest_type);
        data.extend_from_slice(&self.digest);
        data
    }
}

/// NSEC rdata (RFC 4034 §4.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec {
    pub next: Name,
    bitmap: Vec<u8>,
}

impl Nsec {
    pub fn new(next: Name, types: &[RecordType]) -> Self {
        Self {
            next,
            bitmap: encode_type_bitmap(types),
        }
    }

    pub fn parse(rdata: &[u8]) -> Result<Self, RdataError> {
        let (next, used) = Name::from_wire(rdata)?;
        let bitmap = rdata[used..].to_vec();

        // Walk the windows once so has_type never sees a malformed map
        let mut pos = 0;
        while pos < bitmap.len() {
            let len = *bitmap.get(pos + 1).ok_or(RdataError::Truncated("NSEC"))? as usize;
            if len == 0 || len > 32 {
                return Err(RdataError::Malformed("NSEC"));
            }
            if pos + 2 + len > bitmap.len() {
                return Err(RdataError::Truncated("NSEC"));
            }
            pos += 2 + len;
        }

        Ok(Self { next, bitmap })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = self.next.as_wire().to_vec();
        data.extend_from_slice(&self.bitmap);
        data
    }

    /// Whether the type bit map lists `rtype`
    pub fn has_type(&self, rtype: RecordType) -> bool {
        let value = rtype.to_u16();
        let window = (value >> 8) as u8;
        let low = (value & 0xFF) as usize;

        let mut pos = 0;
        while pos + 1 < self.bitmap.len() {
            let len = self.bitmap[pos + 1] as usize;
            if self.bitmap[pos] == window {
                return self
                    .bitmap
                    .get(pos + 2 + low / 8)
                    .is_some_and(|byte| low / 8 < len && byte & (0x80u8 >> (low % 8)) != 0);
            }
            pos += 2 + len;
        }
        false
    }

    pub fn types(&self) -> Vec<RecordType> {
        let mut types = Vec::new();
        let mut pos = 0;
        while pos + 1 < self.bitmap.len() {
            let window = self.bitmap[pos] as u16;
            let len = self.bitmap[pos + 1] as usize;
            for (i, byte) in self.bitmap[pos + 2..pos + 2 + len].iter().enumerate() {
                for bit in 0..8usize {
                    if byte & (0x80u8 >> bit) != 0 {
                        types.push(RecordType::from((window << 8) | (i * 8 + bit) as u16));
                    }
                }
            }
            pos += 2 + len;
        }
        types
    }
}

fn encode_type_bitmap(types: &[RecordType]) -> Vec<u8> {
    let mut values: Vec<u16> = types.iter().map(|t| t.to_u16()).collect();
    values.sort_unstable();
    values.dedup();

    let mut out = Vec::new();
    let mut idx = 0;
    while idx < values.len() {
        let window = (values[idx] >> 8) as u8;
        let mut block = [0u8; 32];
        let mut used = 0;
        while idx < values.len() && (values[idx] >> 8) as u8 == window {
            let low = (values[idx] & 0xFF) as usize;
            block[low / 8] |= 0x80u8 >> (low % 8);
            used = used.max(low / 8 + 1);
            idx += 1;
        }
        out.push(window);
        out.push(used as u8);
        out.extend_from_slice(&block[..used]);
    }
    out
}
