//! A software controller for end-to-end runs against the `Ecc256` variant.
//!
//! It plays the other side of the exchange with `p256`, `aes` and `cbc` directly,
//! without going through the crate's backend.

use aes::Aes128;
use cbc::cipher::{BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::{PublicKey, SecretKey};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use sign_on_basic::crypto::ecc256::{parse_public_key, raw_public_key};
use sign_on_basic::crypto::keys::{CONTENT_TLV_TYPE, DATA_TLV_TYPE};
use sign_on_basic::protocol::message::{
    BootstrappingRequest, BootstrappingResponse, CertificateRequest, CertificateResponse,
    FinishMessage, SignOnMessage, SignedPacket, to_signed_vec,
};
use sign_on_basic::protocol::tlv::push_block;
use sign_on_basic::{VerificationKey, VerificationPolicy};

/// Builds an NDN Data packet whose Content is `public_key`.
pub fn certificate(name: &[u8], public_key: &[u8]) -> Vec<u8> {
    let mut value = Vec::new();
    push_block(&mut value, 0x07, name);
    push_block(&mut value, CONTENT_TLV_TYPE, public_key);
    let mut cert = Vec::new();
    push_block(&mut cert, DATA_TLV_TYPE, &value);
    cert
}

pub fn raw(key: &SigningKey) -> Vec<u8> {
    raw_public_key(&PublicKey::from(key.verifying_key())).to_vec()
}

fn verify(packet: &SignedPacket<'_>, key: &VerifyingKey) -> bool {
    Signature::from_slice(packet.signature)
        .map(|signature| key.verify(packet.signed_payload, &signature).is_ok())
        .unwrap_or(false)
}

fn sign<'a, M: SignOnMessage<'a>>(message: M, key: &SigningKey) -> Vec<u8> {
    let payload = message.payload();
    let signature: Signature = key.sign(&payload);
    to_signed_vec(M::PACKET_TYPE, &payload, &signature.to_bytes())
}

pub struct Controller {
    pub ks: SigningKey,
    pub anchor: SigningKey,
    pub trust_anchor_cert: Vec<u8>,
    pub policy: VerificationPolicy,
    n2: Option<SecretKey>,
    kt: Option<[u8; 32]>,
    kd: Option<SigningKey>,
    pub issued_certificate: Vec<u8>,
}

impl Controller {
    pub fn new(policy: VerificationPolicy) -> Self {
        let anchor = SigningKey::random(&mut OsRng);
        let trust_anchor_cert = certificate(b"/home/controller/KEY/1", &raw(&anchor));
        Self {
            ks: SigningKey::random(&mut OsRng),
            anchor,
            trust_anchor_cert,
            policy,
            n2: None,
            kt: None,
            kd: None,
            issued_certificate: Vec::new(),
        }
    }

    pub fn ks_public(&self) -> Vec<u8> {
        raw(&self.ks)
    }

    pub fn ks_private(&self) -> Vec<u8> {
        self.ks.to_bytes().to_vec()
    }

    fn response_key(&self, source: VerificationKey) -> &SigningKey {
        match source {
            VerificationKey::SharedKey => &self.ks,
            VerificationKey::TrustAnchor => &self.anchor,
        }
    }

    /// Checks the device's request and answers with N2 and the trust anchor.
    pub fn answer_bootstrapping_request(&mut self, request: &[u8]) -> Vec<u8> {
        let (request, packet) = BootstrappingRequest::decode(request).unwrap();
        assert!(verify(&packet, self.ks.verifying_key()), "device signature");

        let n1 = parse_public_key(request.n1_pub).unwrap();
        let n2 = SecretKey::random(&mut OsRng);
        let shared = p256::ecdh::diffie_hellman(n2.to_nonzero_scalar(), n1.as_affine());
        let mut kt = [0u8; 32];
        kt.copy_from_slice(shared.raw_secret_bytes());

        let n2_pub = raw_public_key(&n2.public_key());
        let response = sign(
            BootstrappingResponse {
                trust_anchor_cert: &self.trust_anchor_cert,
                n2_pub: &n2_pub,
            },
            self.response_key(self.policy.bootstrapping_response),
        );
        self.n2 = Some(n2);
        self.kt = Some(kt);
        response
    }

    /// Checks the hashes in the certificate request and issues KD.
    pub fn answer_certificate_request(&mut self, request: &[u8]) -> Vec<u8> {
        let (request, packet) = CertificateRequest::decode(request).unwrap();
        assert!(verify(&packet, self.ks.verifying_key()), "device signature");

        let n2_pub = raw_public_key(&self.n2.as_ref().unwrap().public_key());
        assert_eq!(request.n2_pub_hash, Sha256::digest(n2_pub).as_slice());
        assert_eq!(
            request.trust_anchor_cert_hash,
            Sha256::digest(&self.trust_anchor_cert).as_slice()
        );

        let kd = SigningKey::random(&mut OsRng);
        self.issued_certificate = certificate(request.device_identifier, &raw(&kd));

        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut iv);
        let kt = self.kt.unwrap();
        let mut body = [0u8; 32];
        cbc::Encryptor::<Aes128>::new_from_slices(&kt[..16], &iv)
            .unwrap()
            .encrypt_padded_b2b_mut::<NoPadding>(&kd.to_bytes(), &mut body)
            .unwrap();
        let mut encrypted = iv.to_vec();
        encrypted.extend_from_slice(&body);

        let response = sign(
            CertificateResponse {
                issued_certificate: &self.issued_certificate,
                encrypted_issued_private_key: &encrypted,
            },
            self.response_key(self.policy.certificate_response),
        );
        self.kd = Some(kd);
        response
    }

    /// Whether the finish message was signed with the issued KD key.
    pub fn accepts_finish_message(&self, finish: &[u8]) -> bool {
        let (_, packet) = FinishMessage::decode(finish).unwrap();
        verify(&packet, self.kd.as_ref().unwrap().verifying_key())
    }
}
