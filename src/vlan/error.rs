//! Errors raised by the VLAN model, its validation and its renderers.

use crate::ip::{AllocationError, CidrError};
use crate::keys::KeyError;
use std::fmt;

/// VLAN model errors
#[derive(Debug, thiserror::Error)]
pub enum VlanError {
    #[error("name not set")]
    EmptyName,

    #[error("name is already in use: {0}")]
    DuplicateName(String),

    #[error("network invalid ({value}): {source}")]
    InvalidCidr {
        value: String,
        #[source]
        source: CidrError,
    },

    #[error("{field} invalid: {source}")]
    InvalidKey {
        field: &'static str,
        #[source]
        source: KeyError,
    },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("public key mismatch: got '{stated}', expected '{derived}'")]
    KeyMismatch { stated: String, derived: String },

    #[error("client keys both unset")]
    MissingKeys,

    #[error("listen port not set")]
    MissingListenPort,

    #[error("network {network} overlaps with {other}")]
    AddressOverlap { network: String, other: String },

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("no such client: {0}")]
    NoSuchClient(String),

    #[error("client has no private key defined: {0}")]
    MissingPrivateKey(String),

    #[error("vlan has no configured public endpoint")]
    NoPublicEndpoint,

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl VlanError {
    pub(crate) fn invalid_cidr(value: &str) -> impl FnOnce(CidrError) -> VlanError + '_ {
        move |source| VlanError::InvalidCidr {
            value: value.to_string(),
            source,
        }
    }

    pub(crate) fn invalid_key(field: &'static str) -> impl FnOnce(KeyError) -> VlanError {
        move |source| VlanError::InvalidKey { field, source }
    }
}

/// Where in the document a validation finding was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Vlan,
    Server,
    Client(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Vlan => f.write_str("vlan"),
            Position::Server => f.write_str("server"),
            Position::Client(idx) => write!(f, "client[{}]", idx),
        }
    }
}

/// A validation error tagged with the entity it was found on
#[derive(Debug)]
pub struct PositionedError {
    pub position: Position,
    pub error: VlanError,
}

impl fmt::Display for PositionedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.error)
    }
}

/// Every structural error found by one validation pass
#[derive(Debug)]
pub struct ValidationErrors(pub Vec<PositionedError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[PositionedError] {
        &self.0
    }

    /// Errors reported for one position
    pub fn at(&self, position: Position) -> impl Iterator<Item = &VlanError> {
        self.0
            .iter()
            .filter(move |e| e.position == position)
            .map(|e| &e.error)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
