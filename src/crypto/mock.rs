//! Deterministic backend for unit tests.
//!
//! hash pads or truncates the payload to 32 bytes, a signature is the key followed
//! by the digest, and verification recomputes that. Key generation, KT and the
//! decrypted KD private key are fixed fixtures.
//!
//! One operation can be made to fail, either on every call or only after a given
//! number of calls have succeeded, so later steps can be reached first.

use crate::consts::SHA256_HASH_SIZE;
use crate::crypto::suite::{BackendError, Digest, SecurityBackend};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const N1_PUB: &[u8] = b"device-ephemeral-public-key";
pub const N1_PRI: &[u8] = b"device-ephemeral-private";
pub const KT: &[u8] = b"fixed-session-secret";
pub const KD_PRI: &[u8] = b"issued-device-private-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Hash,
    Keypair,
    Derive,
    Sign,
    Verify,
    Decrypt,
}

#[derive(Debug)]
pub struct MockBackend {
    fail: Option<MockOp>,
    /// Calls of `fail` still allowed to succeed.
    successes_left: AtomicUsize,
    decrypted: &'static [u8],
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            fail: None,
            successes_left: AtomicUsize::new(0),
            decrypted: KD_PRI,
        }
    }
}

impl MockBackend {
    /// Fails every call of `op`.
    pub fn failing(op: MockOp) -> Self {
        Self::failing_after(op, 0)
    }

    /// Lets the first `successes` calls of `op` through, then fails the rest.
    pub fn failing_after(op: MockOp, successes: usize) -> Self {
        Self {
            fail: Some(op),
            successes_left: AtomicUsize::new(successes),
            ..Self::default()
        }
    }

    /// Reports `plaintext` as the decrypted KD private key.
    pub fn decrypting_to(plaintext: &'static [u8]) -> Self {
        Self {
            decrypted: plaintext,
            ..Self::default()
        }
    }

    fn check(&self, op: MockOp) -> Result<(), BackendError> {
        if self.fail != Some(op) {
            return Ok(());
        }
        self.successes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| BackendError)
    }

    pub fn digest(payload: &[u8]) -> Digest {
        let mut digest = [0u8; SHA256_HASH_SIZE];
        let len = payload.len().min(SHA256_HASH_SIZE);
        digest[..len].copy_from_slice(&payload[..len]);
        digest
    }

    /// What a peer using this backend would put in a Signature field.
    pub fn mock_signature(&self, key: &[u8], payload: &[u8]) -> Vec<u8> {
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

    fn sign(&self, key: &[u8], digest: &[u8], out: &mut [u8]) -> Result<usize, BackendError> {
        self.check(MockOp::Sign)?;
        let mut signature = key.to_vec();
        signature.extend_from_slice(digest);
        Self::write(out, &signature)
    }

    fn verify(&self, payload: &[u8], signature: &[u8], key: &[u8]) -> Result<(), BackendError> {
        self.check(MockOp::Verify)?;
        if signature == self.mock_signature(key, payload).as_slice() {
            Ok(())
        } else {
            Err(BackendError)
        }
    }
}

impl SecurityBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn hash(&self, payload: &[u8]) -> Result<Digest, BackendError> {
        self.check(MockOp::Hash)?;
        Ok(Self::digest(payload))
    }

    fn generate_ephemeral_keypair(
        &self,
        public_out: &mut [u8],
        private_out: &mut [u8],
    ) -> Result<(usize, usize), BackendError> {
        self.check(MockOp::Keypair)?;
        Ok((
            Self::write(public_out, N1_PUB)?,
            Self::write(private_out, N1_PRI)?,
        ))
    }

    fn derive_session_secret(
        &self,
        _peer_public: &[u8],
        _local_private: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        self.check(MockOp::Derive)?;
        Self::write(out, KT)
    }

    fn sign_bootstrapping_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        self.sign(private_key, payload, out)
    }

    fn verify_bootstrapping_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError> {
        self.verify(payload, signature, key)
    }

    fn sign_certificate_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        self.sign(private_key, payload, out)
    }

    fn verify_certificate_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError> {
        self.verify(payload, signature, key)
    }

    fn decrypt_issued_private_key(
        &self,
        _key: &[u8],
        _ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        self.check(MockOp::Decrypt)?;
        Self::write(out, self.decrypted)
    }

    fn sign_finish_message(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        self.sign(private_key, payload, out)
    }
}
