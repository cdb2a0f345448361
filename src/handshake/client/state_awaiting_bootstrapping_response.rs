use super::SignOnClient;
use crate::buffer::Bounded;
use crate::consts::{KT_MAX_LENGTH, N2_PUB_MAX_LENGTH, TRUST_ANCHOR_CERT_MAX_LENGTH};
use crate::crypto::keys::select_verification_key;
use crate::error::{BootstrappingResponseError, DecodeError, Field};
use crate::protocol::message::{BootstrappingResponse, SignOnMessage};
use crate::protocol::state::Stage;
use crate::signature::{VerifyingStep, verify_packet};
use tracing::{debug, warn};
use zeroize::Zeroize;

impl SignOnClient {
    /// Absorbs the controller's bootstrapping response.
    ///
    /// The packet is decoded and its signature checked before anything else.
    /// KT is then derived from N1 and N2, after which the N1 private key is erased.
    /// Nothing is stored unless every check passes.
    ///
    /// 处理控制器的引导响应。先解码并验证签名，然后由 N1 和 N2 派生 KT，随后擦除 N1 私钥。
    /// 只有所有检查都通过时才会保存数据。
    pub fn process_bootstrapping_response(
        &mut self,
        response: &[u8],
    ) -> Result<(), BootstrappingResponseError> {
        self.expect_stage(Stage::BootstrappingRequestConstructed)?;
        let backend = self.backend.as_ref();

        let (message, packet) = BootstrappingResponse::decode(response)?;
        let trust_anchor_cert =
            Bounded::<TRUST_ANCHOR_CERT_MAX_LENGTH>::try_from_slice(message.trust_anchor_cert)
                .map_err(DecodeError::too_large(Field::TrustAnchorCert))?;
        let peer_ephemeral_pub = Bounded::<N2_PUB_MAX_LENGTH>::try_from_slice(message.n2_pub)
            .map_err(DecodeError::too_large(Field::N2Pub))?;

        // The trust anchor arrives in this same response.
        let key = select_verification_key(
            self.policy.bootstrapping_response,
            self.state.shared_pub.as_slice(),
            message.trust_anchor_cert,
        )?;
        verify_packet(backend, VerifyingStep::BootstrappingResponse, &packet, key).map_err(
            |_| {
                warn!("bootstrapping response signature rejected");
                BootstrappingResponseError::SignatureVerificationFailed
            },
        )?;

        let ephemeral_pri = self
            .state
            .ephemeral_pri
            .non_empty()
            .ok_or(BootstrappingResponseError::SessionSecretDerivationFailed)?;
        let session_secret = Bounded::<KT_MAX_LENGTH>::filled_by(|out| {
            backend.derive_session_secret(message.n2_pub, ephemeral_pri, out)
        })
        .map_err(|err| {
            warn!(%err, "KT derivation failed");
            BootstrappingResponseError::SessionSecretDerivationFailed
        })?;

        self.state.trust_anchor_cert = trust_anchor_cert;
        self.state.peer_ephemeral_pub = peer_ephemeral_pub;
        self.state.session_secret = session_secret;
        self.state.ephemeral_pri.zeroize();
        self.advance();
        debug!(
            trust_anchor_len = self.state.trust_anchor_cert.len(),
            "bootstrapping response processed"
        );
        Ok(())
    }
}
