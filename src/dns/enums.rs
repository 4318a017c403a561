use crate::error::RdataError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    #[default]
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    DNAME,
    DS,
    RRSIG,
    NSEC,
    DNSKEY,
    NSEC3,
    TLSA,
    HTTPS,
    ANY,
    Unknown(u16),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordClass {
    #[default]
    IN,
    CH,
    HS,
    ANY,
    Unknown(u16),
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            255 => RecordClass::ANY,
            x => RecordClass::Unknown(x),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(class: RecordClass) -> u16 {
        match class {
            RecordClass::IN => 1,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::ANY => 255,
            RecordClass::Unknown(x) => x,
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            39 => RecordType::DNAME,
            43 => RecordType::DS,
            46 => RecordType::RRSIG,
            47 => RecordType::NSEC,
            48 => RecordType::DNSKEY,
            50 => RecordType::NSEC3,
            52 => RecordType::TLSA,
            65 => RecordType::HTTPS,
            255 => RecordType::ANY,
            x => RecordType::Unknown(x),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(rtype: RecordType) -> u16 {
        match rtype {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::DNAME => 39,
            RecordType::DS => 43,
            RecordType::RRSIG => 46,
            RecordType::NSEC => 47,
            RecordType::DNSKEY => 48,
            RecordType::NSEC3 => 50,
            RecordType::TLSA => 52,
            RecordType::HTTPS => 65,
            RecordType::ANY => 255,
            RecordType::Unknown(x) => x,
        }
    }
}

impl RecordType {
    pub fn to_u16(self) -> u16 {
        self.into()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Unknown(x) => write!(f, "TYPE{}", x),
            other => write!(f, "{:?}", other),
        }
    }
}

impl FromStr for RecordType {
    type Err = RdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let rtype = match upper.as_str() {
            "A" => RecordType::A,
            "NS" => RecordType::NS,
            "CNAME" => RecordType::CNAME,
            "SOA" => RecordType::SOA,
            "PTR" => RecordType::PTR,
            "MX" => RecordType::MX,
            "TXT" => RecordType::TXT,
            "AAAA" => RecordType::AAAA,
            "SRV" => RecordType::SRV,
            "DNAME" => RecordType::DNAME,
            "DS" => RecordType::DS,
            "RRSIG" => RecordType::RRSIG,
            "NSEC" => RecordType::NSEC,
            "DNSKEY" => RecordType::DNSKEY,
            "NSEC3" => RecordType::NSEC3,
            "TLSA" => RecordType::TLSA,
            "HTTPS" => RecordType::HTTPS,
            "ANY" => RecordType::ANY,
            other => match other.strip_prefix("TYPE").map(str::parse::<u16>) {
                Some(Ok(x)) => RecordType::from(x),
                _ => return Err(RdataError::UnknownType(s.to_string())),
            },
        };
        Ok(rtype)
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Unknown(x) => write!(f, "CLASS{}", x),
            other => write!(f, "{:?}", other),
        }
    }
}

impl FromStr for RecordClass {
    type Err = RdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let class = match upper.as_str() {
            "IN" => RecordClass::IN,
            "CH" => RecordClass::CH,
            "HS" => RecordClass::HS,
            "ANY" => RecordClass::ANY,
            other => match other.strip_prefix("CLASS").map(str::parse::<u16>) {
                Some(Ok(x)) => RecordClass::from(x),
                _ => return Err(RdataError::UnknownClass(s.to_string())),
            },
        };
        Ok(class)
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for RecordClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_numbers() {
        assert_eq!(RecordType::from(48), RecordType::DNSKEY);
        assert_eq!(u16::from(RecordType::DS), 43);
        assert_eq!(RecordType::from(4242), RecordType::Unknown(4242));
        assert_eq!(u16::from(RecordType::Unknown(4242)), 4242);
    }

    #[test]
    fn test_type_mnemonics() {
        assert_eq!("nsec".parse::<RecordType>().unwrap(), RecordType::NSEC);
        assert_eq!("TYPE99".parse::<RecordType>().unwrap(), RecordType::Unknown(99));
        assert!("BOGUS".parse::<RecordType>().is_err());
        assert_eq!(RecordType::Unknown(99).to_string(), "TYPE99");
        assert_eq!("in".parse::<RecordClass>().unwrap(), RecordClass::IN);
    }
}
