use crate::error::RdataError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Maximum length of a domain name in wire format (RFC 1035)
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a single label
pub const MAX_LABEL_LEN: usize = 63;

/// An owned, uncompressed, lower-cased domain name in wire format.
///
/// Names are case-normalized at construction, so equality and hashing are
/// plain byte operations. Ordering is the DNSSEC canonical order of
/// RFC 4034 §6.1: labels are compared right to left and a name sorts
/// directly after all of its ancestors.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
    wire: Vec<u8>,
}

impl Name {
    /// The root name
    pub fn root() -> Self {
        Self { wire: vec![0] }
    }

    /// Parse a presentation-format name such as `www.example.com.`
    ///
    /// Escapes are not interpreted; the trailing dot is optional.
    pub fn from_ascii(s: &str) -> Result<Self, RdataError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Ok(Self::root());
        }

        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        let mut wire = Vec::with_capacity(trimmed.len() + 2);
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(RdataError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(RdataError::InvalidLabelLength(label.len()));
            }
            wire.push(label.len() as u8);
            wire.extend(label.bytes().map(|b| b.to_ascii_lowercase()));
        }
        wire.push(0);

        if wire.len() > MAX_NAME_LEN {
            return Err(RdataError::NameTooLong);
        }
        Ok(Self { wire })
    }

    /// Read an uncompressed wire-format name from the start of `data`.
    ///
    /// Returns the name and the number of bytes consumed.
    pub fn from_wire(data: &[u8]) -> Result<(Self, usize), RdataError> {
        let mut wire = Vec::with_capacity(32);
        let mut pos = 0;

        loop {
            let len = *data.get(pos).ok_or(RdataError::Truncated("name"))? as usize;
            if len == 0 {
                wire.push(0);
                pos += 1;
                break;
            }
            if len & 0xC0 == 0xC0 {
                return Err(RdataError::CompressedName);
            }
            if len > MAX_LABEL_LEN {
                return Err(RdataError::InvalidLabelLength(len));
            }

            let label = data
                .get(pos + 1..pos + 1 + len)
                .ok_or(RdataError::Truncated("name"))?;
            wire.push(len as u8);
            wire.extend(label.iter().map(|b| b.to_ascii_lowercase()));
            pos += 1 + len;

            if wire.len() >= MAX_NAME_LEN {
                return Err(RdataError::NameTooLong);
            }
        }

        Ok((Self { wire }, pos))
    }

    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Labels from left to right, root label excluded
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            wire: &self.wire,
            pos: 0,
        }
    }

    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    pub fn is_wildcard(&self) -> bool {
        self.labels().next() == Some(b"*".as_slice())
    }

    /// The name with its leftmost label removed; `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let skip = self.wire[0] as usize + 1;
        Some(Self {
            wire: self.wire[skip..].to_vec(),
        })
    }

    /// Keep only the rightmost `count` labels
    pub fn trim_to(&self, count: usize) -> Self {
        let total = self.label_count();
        let mut name = self.clone();
        for _ in count..total {
            name = match name.parent() {
                Some(parent) => parent,
                None => break,
            };
        }
        name
    }

    /// Prefix this name with a `*` label
    pub fn prepend_wildcard(&self) -> Result<Self, RdataError> {
        if self.wire.len() + 2 > MAX_NAME_LEN {
            return Err(RdataError::NameTooLong);
        }
        let mut wire = Vec::with_capacity(self.wire.len() + 2);
        wire.push(1);
        wire.push(b'*');
        wire.extend_from_slice(&self.wire);
        Ok(Self { wire })
    }

    /// True if `self` equals `ancestor` or lies below it
    pub fn ends_with(&self, ancestor: &Name) -> bool {
        self.wire.len() >= ancestor.wire.len() && {
            let offset = self.wire.len() - ancestor.wire.len();
            self.wire[offset..] == ancestor.wire[..] && self.is_label_boundary(offset)
        }
    }

    /// True if `self` lies strictly below `ancestor`
    pub fn is_proper_subdomain_of(&self, ancestor: &Name) -> bool {
        self.wire.len() > ancestor.wire.len() && self.ends_with(ancestor)
    }

    /// Longest name that both `self` and `other` end with
    pub fn common_suffix(&self, other: &Name) -> Name {
        let mine: Vec<&[u8]> = self.labels().collect();
        let theirs: Vec<&[u8]> = other.labels().collect();
        let shared = mine
            .iter()
            .rev()
            .zip(theirs.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        self.trim_to(shared)
    }

    fn is_label_boundary(&self, offset: usize) -> bool {
        let mut pos = 0;
        while pos < offset {
            pos += self.wire[pos] as usize + 1;
        }
        pos == offset
    }
}

/// Iterator over the labels of a [`Name`]
pub struct Labels<'a> {
    wire: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.wire.get(self.pos)? as usize;
        if len == 0 {
            return None;
        }
        let label = &self.wire[self.pos + 1..self.pos + 1 + len];
        self.pos += len + 1;
        Some(label)
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        let mine: Vec<&[u8]> = self.labels().collect();
        let theirs: Vec<&[u8]> = other.labels().collect();
        mine.iter().rev().cmp(theirs.iter().rev())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, ".");
        }
        for label in self.labels() {
            write!(f, "{}.", String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl FromStr for Name {
    type Err = RdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ascii(s)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::from_ascii(&s).map_err(serde::de::Error::custom)
    }
}
