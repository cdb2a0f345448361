use super::SignOnClient;
use crate::error::CertificateRequestError;
use crate::protocol::message::{CertificateRequest, SignOnMessage, encode_signed};
use crate::protocol::state::Stage;
use crate::signature::{SigningStep, sign_payload};
use tracing::{debug, warn};

impl SignOnClient {
    /// Builds the certificate request into `out` and returns its length.
    ///
    /// The request carries the hashes of N2 and of the trust anchor certificate,
    /// showing the controller which bootstrapping response the device accepted.
    ///
    /// 将证书请求写入 `out` 并返回其长度。请求中包含 N2 和信任锚证书的哈希值。
    pub fn construct_certificate_request(
        &mut self,
        out: &mut [u8],
    ) -> Result<usize, CertificateRequestError> {
        self.expect_stage(Stage::BootstrappingResponseProcessed)?;
        let backend = self.backend.as_ref();

        let n2_pub_hash = backend
            .hash(self.state.peer_ephemeral_pub.as_slice())
            .map_err(|err| {
                warn!(%err, "hashing N2 failed");
                CertificateRequestError::N2PubHashFailed
            })?;
        let trust_anchor_cert_hash = backend
            .hash(self.state.trust_anchor_cert.as_slice())
            .map_err(|err| {
                warn!(%err, "hashing the trust anchor certificate failed");
                CertificateRequestError::TrustAnchorCertHashFailed
            })?;

        let request = CertificateRequest {
            device_identifier: self.state.device_identifier.as_slice(),
            n2_pub_hash: &n2_pub_hash,
            trust_anchor_cert_hash: &trust_anchor_cert_hash,
        };
        let payload = request.payload();
        let signature = sign_payload(
            backend,
            SigningStep::CertificateRequest,
            self.state.shared_pri.as_slice(),
            &payload,
        )?;
        let len = encode_signed(
            out,
            CertificateRequest::PACKET_TYPE,
            &payload,
            signature.as_slice(),
        )?;

        self.advance();
        debug!(len, "certificate request constructed");
        Ok(len)
    }
}
