//! Software implementation of the `Ecc256` variant.
//!
//! - hashes are SHA-256
//! - N1 and KS keys are P-256; public keys travel as raw 64-byte `X || Y`
//!   (65-byte uncompressed SEC1 is accepted as input too)
//! - KT is the ECDH x-coordinate
//! - signatures are raw 64-byte `r || s` ECDSA over the digest the driver hands in
//! - the KD private key arrives as `IV || AES-128-CBC(KT[..16])` without padding
//!
//! `Ecc256` 变体的软件实现。

use crate::consts::SHA256_HASH_SIZE;
use crate::crypto::suite::{BackendError, Digest, SecurityBackend};
use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand_core::{OsRng, RngCore};
use sha2::{Digest as _, Sha256};
use zeroize::Zeroizing;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Length of a raw `X || Y` public key.
pub const RAW_PUBLIC_KEY_LEN: usize = 64;
pub const PRIVATE_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;
const AES_BLOCK_LEN: usize = 16;
const AES_KEY_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct Ecc256Backend;

impl Ecc256Backend {
    /// Binds the backend after checking that the OS entropy source answers.
    pub fn new() -> Result<Self, BackendError> {
        let mut probe = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|_| BackendError)?;
        Ok(Self)
    }
}

/// Parses a P-256 public key in raw or uncompressed SEC1 form.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, BackendError> {
    if bytes.len() == RAW_PUBLIC_KEY_LEN {
        let mut sec1 = [0u8; RAW_PUBLIC_KEY_LEN + 1];
        sec1[0] = SEC1_UNCOMPRESSED_TAG;
        sec1[1..].copy_from_slice(bytes);
        return PublicKey::from_sec1_bytes(&sec1).map_err(|_| BackendError);
    }
    PublicKey::from_sec1_bytes(bytes).map_err(|_| BackendError)
}

/// Encodes a public key as raw `X || Y`.
pub fn raw_public_key(key: &PublicKey) -> [u8; RAW_PUBLIC_KEY_LEN] {
    let point = key.to_encoded_point(false);
    let mut raw = [0u8; RAW_PUBLIC_KEY_LEN];
    raw.copy_from_slice(&point.as_bytes()[1..]);
    raw
}

fn write_output(out: &mut [u8], value: &[u8]) -> Result<usize, BackendError> {
    let dest = out.get_mut(..value.len()).ok_or(BackendError)?;
    dest.copy_from_slice(value);
    Ok(value.len())
}

fn sign_digest(private_key: &[u8], digest: &[u8], out: &mut [u8]) -> Result<usize, BackendError> {
    if out.len() < SIGNATURE_LEN {
        return Err(BackendError);
    }
    let key = SigningKey::from_slice(private_key).map_err(|_| BackendError)?;
    let signature: Signature = key.sign_prehash(digest).map_err(|_| BackendError)?;
    write_output(out, &signature.to_bytes())
}

fn verify_payload(payload: &[u8], signature: &[u8], key: &[u8]) -> Result<(), BackendError> {
    let key = VerifyingKey::from(&parse_public_key(key)?);
    let signature = Signature::from_slice(signature).map_err(|_| BackendError)?;
    let digest = Sha256::digest(payload);
    key.verify_prehash(&digest, &signature)
        .map_err(|_| BackendError)
}

impl SecurityBackend for Ecc256Backend {
    fn name(&self) -> &'static str {
        "ecc256"
    }

    fn hash(&self, payload: &[u8]) -> Result<Digest, BackendError> {
        let mut digest = [0u8; SHA256_HASH_SIZE];
        digest.copy_from_slice(&Sha256::digest(payload));
        Ok(digest)
    }

    fn generate_ephemeral_keypair(
        &self,
        public_out: &mut [u8],
        private_out: &mut [u8],
    ) -> Result<(usize, usize), BackendError> {
        if public_out.len() < RAW_PUBLIC_KEY_LEN || private_out.len() < PRIVATE_KEY_LEN {
            return Err(BackendError);
        }
        let secret = SecretKey::random(&mut OsRng);
        let mut private = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        private.copy_from_slice(&secret.to_bytes());
        let public_len = write_output(public_out, &raw_public_key(&secret.public_key()))?;
        let private_len = write_output(private_out, private.as_slice())?;
        Ok((public_len, private_len))
    }

    fn derive_session_secret(
        &self,
        peer_public: &[u8],
        local_private: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        let peer = parse_public_key(peer_public)?;
        let secret = SecretKey::from_slice(local_private).map_err(|_| BackendError)?;
        let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
        write_output(out, shared.raw_secret_bytes())
    }

    fn sign_bootstrapping_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        sign_digest(private_key, payload, out)
    }

    fn verify_bootstrapping_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError> {
        verify_payload(payload, signature, key)
    }

    fn sign_certificate_request(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        sign_digest(private_key, payload, out)
    }

    fn verify_certificate_response(
        &self,
        payload: &[u8],
        signature: &[u8],
        key: &[u8],
    ) -> Result<(), BackendError> {
        verify_payload(payload, signature, key)
    }

    fn decrypt_issued_private_key(
        &self,
        key: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        let key = key.get(..AES_KEY_LEN).ok_or(BackendError)?;
        if ciphertext.len() < 2 * AES_BLOCK_LEN || ciphertext.len() % AES_BLOCK_LEN != 0 {
            return Err(BackendError);
        }
        let (iv, body) = ciphertext.split_at(AES_BLOCK_LEN);
        if out.len() < body.len() {
            return Err(BackendError);
        }

        let mut plaintext = Zeroizing::new(vec![0u8; body.len()]);
        let len = Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| BackendError)?
            .decrypt_padded_b2b_mut::<NoPadding>(body, &mut plaintext)
            .map_err(|_| BackendError)?
            .len();
        write_output(out, &plaintext[..len])
    }

    fn sign_finish_message(
        &self,
        private_key: &[u8],
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, BackendError> {
        sign_digest(private_key, payload, out)
    }
}
