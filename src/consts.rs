//! Capacity limits for every byte string the client holds.
//!
//! Inputs longer than these limits are rejected, never truncated.

/// Size of the digest produced by [`SecurityBackend::hash`](crate::SecurityBackend::hash).
pub const SHA256_HASH_SIZE: usize = 32;

pub const DEVICE_IDENTIFIER_MAX_LENGTH: usize = 64;
pub const DEVICE_CAPABILITIES_MAX_LENGTH: usize = 64;
pub const SECURE_SIGN_ON_CODE_MAX_LENGTH: usize = 32;

/// KS public key. Large enough for an uncompressed SEC1 P-256 point.
pub const KS_PUB_MAX_LENGTH: usize = 65;
pub const KS_PRI_MAX_LENGTH: usize = 32;

pub const N1_PUB_MAX_LENGTH: usize = 65;
pub const N1_PRI_MAX_LENGTH: usize = 32;
pub const N2_PUB_MAX_LENGTH: usize = 65;

pub const KT_MAX_LENGTH: usize = 32;

pub const TRUST_ANCHOR_CERT_MAX_LENGTH: usize = 512;
pub const KD_PUB_CERT_MAX_LENGTH: usize = 512;
pub const KD_PRI_MAX_LENGTH: usize = 64;

/// Largest signature any backend may produce for an outgoing message.
pub const SIGNATURE_MAX_LENGTH: usize = 128;
