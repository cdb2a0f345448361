//! Chooses which public key verifies each controller response.
//!
//! The controller signs its responses either with the KS key pair it shares with
//! the device or with the key of its trust anchor certificate. Which one is in use
//! is a deployment decision, so it is configured per response.
//!
//! 选择用于验证每个控制器响应的公钥。控制器可以使用与设备共享的 KS 密钥对签名，
//! 也可以使用其信任锚证书中的密钥签名；这是部署层面的选择，因此按响应分别配置。

use crate::error::{DecodeError, Field};
use crate::protocol::tlv::{self, Decoder};
use serde::{Deserialize, Serialize};

/// TLV type of an NDN Data packet.
pub const DATA_TLV_TYPE: u32 = 0x06;
/// TLV type of the Content block inside a Data packet.
pub const CONTENT_TLV_TYPE: u32 = 0x15;

/// Source of a verification key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKey {
    /// The KS public key passed in at initialization.
    #[default]
    SharedKey,
    /// The public key in the Content of the trust anchor certificate.
    ///
    /// For the bootstrapping response this certificate arrives in the same,
    /// not yet authenticated, response. A signature that checks out against it
    /// therefore says nothing about who sent the response: any peer can pick its
    /// own anchor and pass the step without knowing KS. For the certificate
    /// response the anchor stored earlier is used.
    ///
    /// 对引导响应而言，该证书随同一个尚未认证的响应到达，因此验证通过并不能证明响应来源：
    /// 任何对端都可以自带信任锚，在不知道 KS 的情况下通过这一步。
    TrustAnchor,
}

/// Verification key for each of the two controller responses.
///
/// 两个控制器响应各自使用的验证密钥。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationPolicy {
    pub bootstrapping_response: VerificationKey,
    pub certificate_response: VerificationKey,
}

impl VerificationPolicy {
    /// Both responses verified with the KS public key.
    pub const fn shared_key() -> Self {
        Self {
            bootstrapping_response: VerificationKey::SharedKey,
            certificate_response: VerificationKey::SharedKey,
        }
    }

    /// Both responses verified with the trust anchor's key.
    ///
    /// The bootstrapping response is then not tied to KS; see
    /// [`VerificationKey::TrustAnchor`].
    pub const fn trust_anchor() -> Self {
        Self {
            bootstrapping_response: VerificationKey::TrustAnchor,
            certificate_response: VerificationKey::TrustAnchor,
        }
    }
}

/// Returns the public key carried in a certificate.
///
/// Certificates are NDN Data packets; the key is the value of the Content block.
pub fn certificate_public_key(cert: &[u8]) -> Result<&[u8], DecodeError> {
    let data = Decoder::new(cert).expect_block(DATA_TLV_TYPE)?;
    tlv::find(data.value, CONTENT_TLV_TYPE)?
        .map(|content| content.value)
        .filter(|key| !key.is_empty())
        .ok_or(DecodeError::MissingField(Field::CertificateContent))
}

/// Picks the verification key for a response.
///
/// `trust_anchor_cert` is the certificate the response should be checked against:
/// the one in the response itself for the bootstrapping response, the stored one
/// afterwards.
pub fn select_verification_key<'a>(
    source: VerificationKey,
    shared_public_key: &'a [u8],
    trust_anchor_cert: &'a [u8],
) -> Result<&'a [u8], DecodeError> {
    match source {
        VerificationKey::SharedKey => Ok(shared_public_key),
        VerificationKey::TrustAnchor => certificate_public_key(trust_anchor_cert),
    }
}
