//! Seed derivation for auxiliary random streams
//!
//! Key, operation and scan streams take their seeds straight from the
//! configuration. Streams that have no seed of their own (value lengths and
//! value characters) are derived from one master seed with SHA-256, so that
//! they stay independent of each other and reproducible across runs.
//!
//! # Example
//!
//! ```
//! use tracegen_core::seed::{derive_seed, components};
//!
//! let length_seed = derive_seed(42, components::VALUE_LENGTH);
//! let charset_seed = derive_seed(42, components::VALUE_CHARSET);
//!
//! assert_eq!(length_seed, derive_seed(42, components::VALUE_LENGTH));
//! assert_ne!(length_seed, charset_seed);
//! ```

use sha2::{Digest, Sha256};

/// Derive a component-specific seed from a master seed using SHA-256
///
/// The master seed is hashed big-endian, followed by the component name; the
/// first eight bytes of the digest form the derived seed.
pub fn derive_seed(master_seed: u64, component: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(master_seed.to_be_bytes());
    hasher.update(component.as_bytes());
    let result = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&result[..8]);
    u64::from_be_bytes(head)
}

/// Component names for seed derivation
pub mod components {
    pub const VALUE_LENGTH: &str = "value_length";
    pub const VALUE_CHARSET: &str = "value_charset";
}
