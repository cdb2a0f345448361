use super::SignOnClient;
use crate::buffer::Bounded;
use crate::consts::{KD_PRI_MAX_LENGTH, KD_PUB_CERT_MAX_LENGTH};
use crate::crypto::keys::select_verification_key;
use crate::error::{CertificateResponseError, DecodeError, Field};
use crate::protocol::message::{CertificateResponse, SignOnMessage};
use crate::protocol::state::Stage;
use crate::signature::{VerifyingStep, verify_packet};
use tracing::{debug, warn};
use zeroize::Zeroize;

impl SignOnClient {
    /// Absorbs the controller's certificate response.
    ///
    /// After the signature checks out, the KD private key is decrypted with KT and
    /// KT is erased. The KD certificate and private key are stored together, or
    /// not at all.
    ///
    /// 处理控制器的证书响应。签名验证通过后，用 KT 解密 KD 私钥并擦除 KT。
    /// KD 证书和私钥要么一起保存，要么都不保存。
    pub fn process_certificate_response(
        &mut self,
        response: &[u8],
    ) -> Result<(), CertificateResponseError> {
        self.expect_stage(Stage::CertificateRequestConstructed)?;
        let backend = self.backend.as_ref();

        let (message, packet) = CertificateResponse::decode(response)?;
        let issued_cert = Bounded::<KD_PUB_CERT_MAX_LENGTH>::try_from_slice(
            message.issued_certificate,
        )
        .map_err(DecodeError::too_large(Field::IssuedCertificate))?;

        let key = select_verification_key(
            self.policy.certificate_response,
            self.state.shared_pub.as_slice(),
            self.state.trust_anchor_cert.as_slice(),
        )?;
        verify_packet(backend, VerifyingStep::CertificateResponse, &packet, key).map_err(
            |_| {
                warn!("certificate response signature rejected");
                CertificateResponseError::SignatureVerificationFailed
            },
        )?;

        let session_secret = self
            .state
            .session_secret
            .non_empty()
            .ok_or(CertificateResponseError::DecryptionFailed)?;
        let issued_pri = Bounded::<KD_PRI_MAX_LENGTH>::filled_by(|out| {
            backend.decrypt_issued_private_key(
                session_secret,
                message.encrypted_issued_private_key,
                out,
            )
        })
        .map_err(|err| {
            warn!(%err, "KD private key decryption failed");
            CertificateResponseError::DecryptionFailed
        })?;
        if issued_pri.is_empty() {
            return Err(CertificateResponseError::DecryptionFailed);
        }

        self.state.issued_cert = issued_cert;
        self.state.issued_pri = issued_pri;
        self.state.session_secret.zeroize();
        self.advance();
        debug!(
            certificate_len = self.state.issued_cert.len(),
            "certificate response processed"
        );
        Ok(())
    }
}
