//! The security backend seam.
//!
//! The protocol driver never touches a concrete primitive. Everything it needs
//! goes through [`SecurityBackend`], chosen once when the client is built. A
//! backend can be software crypto, a hardware engine, or a test double.
//!
//! 安全后端接口。协议驱动从不直接接触具体的密码原语，所需的一切都通过
//! [`SecurityBackend`] 完成，后端在构建客户端时选定一次。

use crate::consts::SHA256_HASH_SIZE;
use crate::crypto::ecc256::Ecc256Backend;
use crate::error::InitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A backend operation failed.
///
/// Backends fail closed and report nothing more specific; the driver turns this
/// into a step-specific error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("security backend operation failed")]
pub struct BackendError;

pub type Digest = [u8; SHA256_HASH_SIZE];

/// The nine operations a Sign-On Basic variant has to supply.
///
/// Output buffers are handed in with their full capacity. An operation either
/// writes one complete value and returns its length, or returns [`BackendError`].
/// A successful return never describes a partially written value.
///
/// Sign-On Basic 变体必须提供的九个操作。每个操作要么写入一个完整的值并返回其长度，
/// 要么返回 [`BackendError`]，绝不会报告部分写入的值。
pub trait SecurityBackend: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// SHA-256 of `payload`.
    fn hash(&self, payload: &[u8]) -> Result<Digest, BackendError>;

    /// Generates the N1 key pair. Returns `(public_len, private_len)`.
    fn generate_ephemeral_keypair(
        &self,
        public_out: &mut [u8],
        private_out: &mut [u8],
    ) -> Result<(usize, usize), BackendError>;

    /// Derives KT from the controller's N2 public key and the device's N1 private key.
    fn derive_session_secret(
        &self,
        peer_public: &[u8],
        local_private: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError>;

    fn sign_bootstrapping_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError>;

    fn verify_bootstrapping_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError>;

    fn sign_certificate_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError>;

    fn verify_certificate_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError>;

    /// Decrypts the KD private key with KT.
    fn decrypt_issued_private_key(
        &self,
        key: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError>;

    fn sign_finish_message(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError>;
}

/// Built-in Sign-On Basic variants.
///
/// 内置的 Sign-On Basic 变体。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Variant {
    /// P-256 ECDSA and ECDH, SHA-256, AES-128-CBC.
    Ecc256 = 0,
}

impl Variant {
    /// Creates the backend for this variant.
    pub fn bind(self) -> Result<Box<dyn SecurityBackend>, BackendError> {
        match self {
            Variant::Ecc256 => Ok(Box::new(Ecc256Backend::new()?)),
        }
    }
}

impl TryFrom<u8> for Variant {
    type Error = InitError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Variant::Ecc256),
            other => Err(InitError::UnrecognizedVariant(other)),
        }
    }
}

impl From<Variant> for u8 {
    fn from(variant: Variant) -> Self {
        variant as u8
    }
}
