//! The VLAN network model.
//!
//! A VLAN document holds one server, an ordered list of clients and the
//! settings they share. This module owns the document types, the operations
//! that add clients to it, its validation, and YAML persistence.

pub mod error;
pub mod loader;
pub mod model;
pub mod validation;

pub use error::{Position, PositionedError, ValidationErrors, VlanError};
pub use loader::{create_vlan, load_vlan, save_vlan};
pub use model::{Vlan, VlanClient, VlanServer};
pub use validation::ValidationReport;
