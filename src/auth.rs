//! Auth-domain models: scope sets, token records, and identity claims.

pub mod claims;
pub mod scope;
pub mod token;

pub use claims::*;
pub use scope::*;
pub use token::{record::*, secret::*};
