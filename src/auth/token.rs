//! Token secrets and the token sets issued by the identity provider.

pub mod record;
pub mod secret;
