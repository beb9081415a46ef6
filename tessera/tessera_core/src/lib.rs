//! # Tessera Core
//!
//! `tessera_core` provides the building blocks shared by the Tessera
//! infrastructure-composition framework: deterministic naming helpers,
//! deferred values, construction arguments, node identities and the error
//! hierarchy.
//!
//! ## Crate Structure
//!
//! - **naming**: Physical names, logical-name normalization, pretty hashes
//! - **deferred**: Values only known at provisioning time, and their combinators
//! - **args**: Ordered construction arguments and resource options
//! - **id**: Node URNs and synthesis session identifiers
//! - **error**: Error types for all Tessera components
//! - **utils**: App context and logging setup

pub mod args;
pub mod deferred;
pub mod error;
pub mod id;
pub mod naming;
pub mod utils;

// Re-export key types for convenience
pub use args::{resolve_properties, Args, PropertyMap, ResourceOptions};
pub use deferred::{Deferred, Input, Resolver};
pub use error::{Error, Result};
pub use id::{SessionId, Urn};
pub use naming::{hash_to_pretty_string, physical_name, sanitize};
pub use utils::{AppContext, LogLevel};
