use thiserror::Error;

/// Errors raised while interpreting names and rdata handed over by the
/// parsing collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdataError {
    #[error("Invalid label length: {0}")]
    InvalidLabelLength(usize),

    #[error("DNS name too long")]
    NameTooLong,

    #[error("Empty label inside domain name")]
    EmptyLabel,

    #[error("Compression pointer not allowed in rdata name")]
    CompressedName,

    #[error("Truncated {0} rdata")]
    Truncated(&'static str),

    #[error("Malformed {0} rdata")]
    Malformed(&'static str),

    #[error("Unknown record type mnemonic: {0}")]
    UnknownType(String),

    #[error("Unknown record class mnemonic: {0}")]
    UnknownClass(String),
}

/// Failures reported by the transport capability. These never abort a
/// resolve call; they are folded into the state of the affected query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("No answer received")]
    NoAnswer,

    #[error("Query timed out")]
    Timeout,

    #[error("Server returned rcode {0}")]
    Rcode(u8),

    #[error("Could not render query name")]
    BadName,

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Invalid trust anchor for {zone}: {reason}")]
    InvalidTrustAnchor { zone: String, reason: String },

    #[error("Invalid record data: {0}")]
    Rdata(#[from] RdataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Hard failures of a resolve call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    #[error("Query chain exceeded {0} queries")]
    TooManyQueries(usize),

    #[error("Resolution did not settle within {0} rounds")]
    RoundBudget(usize),
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
