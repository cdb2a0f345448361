//! Shared fixtures for the integration tests.
//! 集成测试共用的测试夹具。

pub mod controller;

use sign_on_basic::protocol::message::{SignOnMessage, to_signed_vec};
use sign_on_basic::{BackendError, SecurityBackend};

pub const DEVICE_ID: &[u8] = b"/home/livingroom/thermostat";
pub const CAPABILITIES: &[u8] = b"temperature;humidity";
pub const SECURE_SIGN_ON_CODE: &[u8] = b"qr-code-secret-01";
pub const KS_PUB: &[u8] = b"fixture-ks-public";
pub const KS_PRI: &[u8] = b"fixture-ks-private";

pub const N1_PUB: &[u8] = b"fixture-n1-public";
pub const N1_PRI: &[u8] = b"fixture-n1-private";
pub const N2_PUB: &[u8] = b"fixture-n2-public";
pub const KT: &[u8] = b"fixture-session-secret";
pub const TRUST_ANCHOR_CERT: &[u8] = b"fixture-trust-anchor-certificate";
pub const KD_PUB_CERT: &[u8] = b"fixture-kd-certificate";
pub const KD_PRI_ENCRYPTED: &[u8] = b"fixture-kd-private-encrypted";
pub const KD_PRI: &[u8] = b"fixture-kd-private";

/// Deterministic backend.
///
/// - hash: the payload, truncated or zero-padded to 32 bytes
/// - sign: key followed by the digest
/// - verify: the signature equals key followed by hash(payload)
/// - key generation, KT and decryption return fixtures
#[derive(Debug, Default)]
pub struct FixtureBackend;

impl FixtureBackend {
    pub fn digest(payload: &[u8]) -> [u8; 32] {
        let mut digest = [0u8; 32];
        let len = payload.len().min(32);
        digest[..len].copy_from_slice(&payload[..len]);
        digest
    }

    pub fn signature(key: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut signature = key.to_vec();
        signature.extend_from_slice(&Self::digest(payload));
        signature
    }

    fn write(out: &mut [u8], value: &[u8]) -> Result<usize, BackendError> {
        out.get_mut(..value.len())
            .ok_or(BackendError)?
            .copy_from_slice(value);
        Ok(value.len())
    }

    fn sign(key: &[u8], digest: &[u8], out: &mut [u8]) -> Result<usize, BackendError> {
        let mut signature = key.to_vec();
        signature.extend_from_slice(digest);
        Self::write(out, &signature)
    }

    fn verify(payload: &[u8], signature: &[u8], key: &[u8]) -> Result<(), BackendError> {
        if signature == Self::signature(key, payload) {
            Ok(())
        } else {
            Err(BackendError)
        }
    }
}

impl SecurityBackend for FixtureBackend {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn hash(&self, payload: &[u8]) -> Result<[u8; 32], BackendError> {
        Ok(Self::digest(payload))
    }

    fn generate_ephemeral_keypair(
        &self,
        public_out: &mut [u8],
        private_out: &mut [u8],
    ) -> Result<(usize, usize), BackendError> {
        Ok((
            Self::write(public_out, N1_PUB)?,
            Self::write(private_out, N1_PRI)?,
        ))
    }

    fn derive_session_secret(
        &self,
        peer_public: &[u8],
        local_private: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        if peer_public != N2_PUB || local_private != N1_PRI {
            return Err(BackendError);
        }
        Self::write(out, KT)
    }

    fn sign_bootstrapping_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        Self::sign(private_key, payload, out)
    }

    fn verify_bootstrapping_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError> {
        Self::verify(payload, signature, key)
    }

    fn sign_certificate_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        Self::sign(private_key, payload, out)
    }

    fn verify_certificate_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError> {
        Self::verify(payload, signature, key)
    }

    fn decrypt_issued_private_key(
        &self,
        key: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        if key != KT || ciphertext != KD_PRI_ENCRYPTED {
            return Err(BackendError);
        }
        Self::write(out, KD_PRI)
    }

    fn sign_finish_message(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        Self::sign(private_key, payload, out)
    }
}

/// Encodes `message` signed the way [`FixtureBackend`] expects.
pub fn fixture_signed<'a, M: SignOnMessage<'a>>(message: M, key: &[u8]) -> Vec<u8> {
    let payload = message.payload();
    to_signed_vec(M::PACKET_TYPE, &payload, &FixtureBackend::signature(key, &payload))
}
