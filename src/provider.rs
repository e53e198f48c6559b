//! Identity provider metadata.
//!
//! `descriptor` exposes the validated endpoint set (`ProviderDescriptor`) consumed by flows and
//! business queries. `discovery` fetches an OpenID Connect discovery document and turns it into
//! the same endpoint set.

pub mod descriptor;
pub mod discovery;

pub use descriptor::*;
pub use discovery::*;
