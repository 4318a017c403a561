pub mod cache;
pub mod compose;
pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod lookup;
pub mod transport;
pub mod validator;

pub use cache::RrsetCache;
pub use compose::{AnswerComposer, ComposedAnswer, Rcode, compose_answer};
pub use config::ValidatorConfig;
pub use error::{Result, ValidatorError};
pub use lookup::{HostLookup, lookup_host};
pub use transport::{Response, StaticTransport, Transport};
pub use validator::{Resolution, ResolveFlags, ValidationResult, ValidationStatus, Validator};
