//! Key-generation infrastructure adapter.
//!
//! Implements the [`pipeline::KeyGenerator`] port by shelling out to GnuPG.
//! Each call runs in its own [`EphemeralKeyring`] so generated key material
//! never lands in a persistent keyring, and the keyring is destroyed before
//! the call returns.
//!
//! ## Requirements
//!
//! - `gpg` 2.1 or later (for `--quick-generate-key` and loopback pinentry)
//! - `gpgconf`, to stop the agent gpg starts for each keyring (optional;
//!   the keyring directory is removed either way)

mod colons;
mod gpg;
mod keyring;

pub use colons::primary_fingerprint;
pub use gpg::{GpgConfig, GpgKeyGenerator};
pub use keyring::EphemeralKeyring;
