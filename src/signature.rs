//! Signing and verification of Sign-On Basic packets.
//!
//! Outgoing packets are hashed and the digest is signed; incoming packets are
//! handed to the backend together with their signed payload. Keeping this in one
//! place makes every step sign and verify the same bytes.
//!
//! 管理 Sign-On Basic 数据包的签名与验证。发送的数据包先哈希再对摘要签名；
//! 接收的数据包连同其签名负载一起交给后端验证。

use crate::buffer::Bounded;
use crate::consts::SIGNATURE_MAX_LENGTH;
use crate::crypto::suite::{BackendError, SecurityBackend};
use crate::protocol::message::SignedPacket;

pub type SignatureBuf = Bounded<SIGNATURE_MAX_LENGTH>;

/// The outgoing packets that carry a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStep {
    BootstrappingRequest,
    CertificateRequest,
    FinishMessage,
}

/// The incoming packets whose signature is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyingStep {
    BootstrappingResponse,
    CertificateResponse,
}

/// Which half of hash-then-sign failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignFailure {
    Hash,
    Sign,
}

/// Hashes `payload` and signs the digest with `private_key`.
///
/// 对 `payload` 进行哈希并使用 `private_key` 对摘要签名。
pub fn sign_payload(
    backend: &dyn SecurityBackend,
    step: SigningStep,
    private_key: &[u8],
    payload: &[u8],
) -> Result<SignatureBuf, SignFailure> {
    let digest = backend.hash(payload).map_err(|_| SignFailure::Hash)?;
    SignatureBuf::filled_by(|out| match step {
        SigningStep::BootstrappingRequest => {
            backend.sign_bootstrapping_request(private_key, &digest, out)
        }
        SigningStep::CertificateRequest => {
            backend.sign_certificate_request(private_key, &digest, out)
        }
        SigningStep::FinishMessage => backend.sign_finish_message(private_key, &digest, out),
    })
    .map_err(|_| SignFailure::Sign)
}

/// Checks the signature of a received packet against `key`.
///
/// 使用 `key` 验证所接收数据包的签名。
pub fn verify_packet(
    backend: &dyn SecurityBackend,
    step: VerifyingStep,
    packet: &SignedPacket<'_>,
    key: &[u8],
) -> Result<(), BackendError> {
    match step {
        VerifyingStep::BootstrappingResponse => {
            backend.verify_bootstrapping_response(packet.signed_payload, packet.signature, key)
        }
        VerifyingStep::CertificateResponse => {
            backend.verify_certificate_response(packet.signed_payload, packet.signature, key)
        }
    }
}
