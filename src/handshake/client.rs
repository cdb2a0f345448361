//! Implements the device side of the Sign-On Basic state machine.
//! 实现 Sign-On Basic 状态机的设备端。

use crate::buffer::Bounded;
use crate::consts::*;
use crate::crypto::keys::VerificationPolicy;
use crate::crypto::suite::SecurityBackend;
use crate::error::{Field, InitError, StageError};
use crate::protocol::state::Stage;
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

mod builder;
mod state_awaiting_bootstrapping_response;
mod state_awaiting_certificate_response;
mod state_bootstrapped;
mod state_certified;
mod state_initialized;

pub use builder::SignOnClientBuilder;

/// Everything one sign-on exchange keeps between steps.
///
/// Each byte string is copied in and owned here. Steps build their results in
/// locals and only assign them once nothing else can fail.
///
/// 一次签到交换在各步骤之间保存的全部数据。每个步骤先在局部变量中构建结果，
/// 只有在不会再失败时才写回。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientState {
    pub(crate) stage: Stage,
    pub(crate) device_identifier: Bounded<DEVICE_IDENTIFIER_MAX_LENGTH>,
    pub(crate) device_capabilities: Bounded<DEVICE_CAPABILITIES_MAX_LENGTH>,
    pub(crate) secure_sign_on_code: Bounded<SECURE_SIGN_ON_CODE_MAX_LENGTH>,
    /// Public half of KS, the key pair shared with the controller out of band.
    /// It verifies responses under the shared-key policy.
    ///
    /// KS 的公钥，即与控制器在带外共享的密钥对。在共享密钥策略下用于验证响应。
    pub(crate) shared_pub: Bounded<KS_PUB_MAX_LENGTH>,
    /// Private half of KS. It signs the bootstrapping and certificate requests
    /// and lives as long as the client.
    ///
    /// KS 的私钥，用于签名引导请求和证书请求，与客户端同生命周期。
    pub(crate) shared_pri: Bounded<KS_PRI_MAX_LENGTH>,
    /// Public half of N1, the device's ephemeral key pair, sent in the
    /// bootstrapping request.
    ///
    /// N1 的公钥，即设备的临时密钥对，随引导请求发送。
    pub(crate) ephemeral_pub: Bounded<N1_PUB_MAX_LENGTH>,
    /// Private half of N1. It is only needed to derive KT and is erased as soon
    /// as the bootstrapping response commits.
    ///
    /// N1 的私钥。仅用于派生 KT，引导响应处理成功后立即擦除。
    pub(crate) ephemeral_pri: Bounded<N1_PRI_MAX_LENGTH>,
    /// N2, the controller's ephemeral public key from the bootstrapping response.
    ///
    /// N2，来自引导响应的控制器临时公钥。
    pub(crate) peer_ephemeral_pub: Bounded<N2_PUB_MAX_LENGTH>,
    /// KT, the secret agreed from N1 and N2. It decrypts the KD private key and
    /// is erased as soon as the certificate response commits.
    ///
    /// KT，由 N1 和 N2 协商出的密钥。用于解密 KD 私钥，证书响应处理成功后立即擦除。
    pub(crate) session_secret: Bounded<KT_MAX_LENGTH>,
    /// The controller's trust anchor certificate from the bootstrapping response.
    ///
    /// 来自引导响应的控制器信任锚证书。
    pub(crate) trust_anchor_cert: Bounded<TRUST_ANCHOR_CERT_MAX_LENGTH>,
    /// Certificate for KD, the device's long-term key pair issued by the
    /// controller.
    ///
    /// KD 的证书，KD 是控制器签发给设备的长期密钥对。
    pub(crate) issued_cert: Bounded<KD_PUB_CERT_MAX_LENGTH>,
    /// Decrypted KD private key. It is kept until the client is dropped or handed
    /// out through [`SignOnClient::into_credential`].
    ///
    /// 解密后的 KD 私钥，保留到客户端被丢弃或通过 `into_credential` 交出为止。
    pub(crate) issued_pri: Bounded<KD_PRI_MAX_LENGTH>,
}

impl ClientState {
    pub(crate) fn new(
        device_identifier: &[u8],
        device_capabilities: &[u8],
        secure_sign_on_code: &[u8],
        shared_public_key: &[u8],
        shared_private_key: &[u8],
    ) -> Result<Self, InitError> {
        Ok(Self {
            stage: Stage::Initialized,
            device_identifier: Bounded::try_from_slice(device_identifier)
                .map_err(InitError::too_large(Field::DeviceIdentifier))?,
            device_capabilities: Bounded::try_from_slice(device_capabilities)
                .map_err(InitError::too_large(Field::DeviceCapabilities))?,
            secure_sign_on_code: Bounded::try_from_slice(secure_sign_on_code)
                .map_err(InitError::too_large(Field::SecureSignOnCode))?,
            shared_pub: Bounded::try_from_slice(shared_public_key)
                .map_err(InitError::too_large(Field::SharedPublicKey))?,
            shared_pri: Bounded::try_from_slice(shared_private_key)
                .map_err(InitError::too_large(Field::SharedPrivateKey))?,
            ephemeral_pub: Bounded::new(),
            ephemeral_pri: Bounded::new(),
            peer_ephemeral_pub: Bounded::new(),
            session_secret: Bounded::new(),
            trust_anchor_cert: Bounded::new(),
            issued_cert: Bounded::new(),
            issued_pri: Bounded::new(),
        })
    }
}

/// The device-side Sign-On Basic client.
///
/// Drive it by calling the five steps in order:
///
/// 1. [`construct_bootstrapping_request`](Self::construct_bootstrapping_request)
/// 2. [`process_bootstrapping_response`](Self::process_bootstrapping_response)
/// 3. [`construct_certificate_request`](Self::construct_certificate_request)
/// 4. [`process_certificate_response`](Self::process_certificate_response)
/// 5. [`construct_finish_message`](Self::construct_finish_message)
///
/// A step called out of order fails with a [`StageError`]. A step that fails for
/// any reason leaves the client exactly as it was, so it can be retried with
/// corrected input or abandoned.
///
/// 设备端 Sign-On Basic 客户端。按顺序调用五个步骤；乱序调用会返回 [`StageError`]。
/// 任何失败的步骤都不会改变客户端状态，因此可以用修正后的输入重试或直接放弃。
#[derive(Debug)]
pub struct SignOnClient {
    backend: Box<dyn SecurityBackend>,
    policy: VerificationPolicy,
    pub(crate) state: ClientState,
}

impl SignOnClient {
    /// Creates a client for the variant with the numeric selector `variant`.
    ///
    /// All byte inputs are copied. Inputs over their capacity are rejected.
    ///
    /// 使用数字选择器 `variant` 指定的变体创建客户端。所有字节输入都会被复制，超出容量的输入会被拒绝。
    pub fn init(
        variant: u8,
        device_identifier: &[u8],
        device_capabilities: &[u8],
        secure_sign_on_code: &[u8],
        shared_public_key: &[u8],
        shared_private_key: &[u8],
    ) -> Result<Self, InitError> {
        SignOnClientBuilder::new()
            .variant_id(variant)
            .device_identifier(device_identifier)
            .device_capabilities(device_capabilities)
            .secure_sign_on_code(secure_sign_on_code)
            .shared_public_key(shared_public_key)
            .shared_private_key(shared_private_key)
            .build()
    }

    pub fn builder<'a>() -> SignOnClientBuilder<'a> {
        SignOnClientBuilder::new()
    }

    pub(crate) fn from_parts(
        backend: Box<dyn SecurityBackend>,
        policy: VerificationPolicy,
        state: ClientState,
    ) -> Self {
        debug!(backend = backend.name(), ?policy, "sign-on client initialized");
        Self {
            backend,
            policy,
            state,
        }
    }

    /// Fails unless the client is at `expected`.
    pub(crate) fn expect_stage(&self, expected: Stage) -> Result<(), StageError> {
        if self.state.stage == expected {
            Ok(())
        } else {
            Err(StageError {
                expected,
                actual: self.state.stage,
            })
        }
    }

    /// Moves to the next stage. Only called once a step has committed.
    pub(crate) fn advance(&mut self) {
        let from = self.state.stage;
        self.state.stage = from.next().unwrap_or(from);
        debug!(from = ?from, to = ?self.state.stage, "sign-on stage advanced");
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn is_finished(&self) -> bool {
        self.state.stage.is_terminal()
    }

    pub fn verification_policy(&self) -> VerificationPolicy {
        self.policy
    }

    pub fn device_identifier(&self) -> &[u8] {
        self.state.device_identifier.as_slice()
    }

    pub fn device_capabilities(&self) -> &[u8] {
        self.state.device_capabilities.as_slice()
    }

    pub fn secure_sign_on_code(&self) -> &[u8] {
        self.state.secure_sign_on_code.as_slice()
    }

    pub fn shared_public_key(&self) -> &[u8] {
        self.state.shared_pub.as_slice()
    }

    /// N1 public key, once the bootstrapping request has been built.
    pub fn ephemeral_public_key(&self) -> Option<&[u8]> {
        self.state.ephemeral_pub.non_empty()
    }

    /// N2 public key, once the bootstrapping response has been processed.
    pub fn peer_ephemeral_public_key(&self) -> Option<&[u8]> {
        self.state.peer_ephemeral_pub.non_empty()
    }

    pub fn trust_anchor_certificate(&self) -> Option<&[u8]> {
        self.state.trust_anchor_cert.non_empty()
    }

    /// KD certificate, once the certificate response has been processed.
    pub fn issued_certificate(&self) -> Option<&[u8]> {
        self.state.issued_cert.non_empty()
    }

    /// KD private key, once the certificate response has been processed.
    pub fn issued_private_key(&self) -> Option<&[u8]> {
        self.state.issued_pri.non_empty()
    }

    /// Whether the N1 private key is still held.
    pub fn holds_ephemeral_private_key(&self) -> bool {
        !self.state.ephemeral_pri.is_empty()
    }

    /// Whether KT is still held.
    pub fn holds_session_secret(&self) -> bool {
        !self.state.session_secret.is_empty()
    }

    /// Abandons the exchange, erasing N1's private key and KT.
    ///
    /// The stage is left as is, so no further step can use the erased material.
    ///
    /// 放弃本次交换，擦除 N1 私钥和 KT。
    pub fn abort(&mut self) {
        self.state.ephemeral_pri.zeroize();
        self.state.session_secret.zeroize();
        debug!(stage = ?self.state.stage, "sign-on exchange aborted");
    }

    /// Hands the issued credential to the caller once the exchange has finished.
    ///
    /// 交换完成后将签发的凭证交给调用方。
    pub fn into_credential(self) -> Result<IssuedCredential, StageError> {
        self.expect_stage(Stage::Finished)?;
        Ok(IssuedCredential {
            certificate: self.state.issued_cert.as_slice().to_vec(),
            private_key: Zeroizing::new(self.state.issued_pri.as_slice().to_vec()),
        })
    }
}

/// The KD certificate and private key issued by the controller.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub certificate: Vec<u8>,
    pub private_key: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("certificate_len", &self.certificate.len())
            .field("private_key_len", &self.private_key.len())
            .finish()
    }
}
