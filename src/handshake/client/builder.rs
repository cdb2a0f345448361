use super::{ClientState, SignOnClient};
use crate::crypto::keys::VerificationPolicy;
use crate::crypto::suite::{SecurityBackend, Variant};
use crate::error::InitError;
use tracing::warn;

enum BackendSource {
    Selector(u8),
    Custom(Box<dyn SecurityBackend>),
}

/// A builder for creating a `SignOnClient`.
///
/// The device identifier, the KS key pair and a backend are required. Capabilities
/// and the secure sign-on code default to empty, and the verification policy
/// defaults to [`VerificationPolicy::shared_key`].
///
/// 用于创建 `SignOnClient` 的构建器。
///
/// 设备标识符、KS 密钥对和后端是必需的。
#[derive(Default)]
pub struct SignOnClientBuilder<'a> {
    backend: Option<BackendSource>,
    device_identifier: Option<&'a [u8]>,
    device_capabilities: Option<&'a [u8]>,
    secure_sign_on_code: Option<&'a [u8]>,
    shared_public_key: Option<&'a [u8]>,
    shared_private_key: Option<&'a [u8]>,
    verification_policy: VerificationPolicy,
}

impl<'a> SignOnClientBuilder<'a> {
    /// Creates a new `SignOnClientBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses one of the built-in variants.
    ///
    /// 使用内置变体之一。
    pub fn variant(self, variant: Variant) -> Self {
        self.variant_id(variant.into())
    }

    /// Uses the built-in variant with numeric selector `id`.
    ///
    /// An unknown selector is reported by [`build`](Self::build).
    pub fn variant_id(mut self, id: u8) -> Self {
        self.backend = Some(BackendSource::Selector(id));
        self
    }

    /// Uses a caller-supplied backend, such as a hardware crypto engine.
    ///
    /// 使用调用方提供的后端，例如硬件加密引擎。
    pub fn backend(mut self, backend: Box<dyn SecurityBackend>) -> Self {
        self.backend = Some(BackendSource::Custom(backend));
        self
    }

    pub fn device_identifier(mut self, identifier: &'a [u8]) -> Self {
        self.device_identifier = Some(identifier);
        self
    }

    pub fn device_capabilities(mut self, capabilities: &'a [u8]) -> Self {
        self.device_capabilities = Some(capabilities);
        self
    }

    pub fn secure_sign_on_code(mut self, code: &'a [u8]) -> Self {
        self.secure_sign_on_code = Some(code);
        self
    }

    /// Sets the public half of KS.
    pub fn shared_public_key(mut self, key: &'a [u8]) -> Self {
        self.shared_public_key = Some(key);
        self
    }

    /// Sets the private half of KS.
    pub fn shared_private_key(mut self, key: &'a [u8]) -> Self {
        self.shared_private_key = Some(key);
        self
    }

    /// Sets which key verifies each controller response.
    ///
    /// 设置用于验证每个控制器响应的密钥。
    pub fn verification_policy(mut self, policy: VerificationPolicy) -> Self {
        self.verification_policy = policy;
        self
    }

    /// Builds the `SignOnClient`.
    ///
    /// The variant selector is checked and the backend bound before the byte
    /// inputs are copied against their capacities.
    ///
    /// 构建 `SignOnClient`。先检查变体选择器并绑定后端，再按容量复制字节输入。
    pub fn build(self) -> Result<SignOnClient, InitError> {
        let backend = match self
            .backend
            .ok_or(InitError::BuilderMissingField("backend"))?
        {
            BackendSource::Selector(id) => {
                let variant = Variant::try_from(id)?;
                variant.bind().map_err(|err| {
                    warn!(?variant, %err, "failed to bind security backend");
                    InitError::BackendBindingFailed
                })?
            }
            BackendSource::Custom(backend) => backend,
        };

        let state = ClientState::new(
            self.device_identifier
                .ok_or(InitError::BuilderMissingField("device_identifier"))?,
            self.device_capabilities.unwrap_or_default(),
            self.secure_sign_on_code.unwrap_or_default(),
            self.shared_public_key
                .ok_or(InitError::BuilderMissingField("shared_public_key"))?,
            self.shared_private_key
                .ok_or(InitError::BuilderMissingField("shared_private_key"))?,
        )?;

        Ok(SignOnClient::from_parts(
            backend,
            self.verification_policy,
            state,
        ))
    }
}
