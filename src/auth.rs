//! Credential models shared by the provider and the signer.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
