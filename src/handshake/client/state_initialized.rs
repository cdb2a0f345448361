use super::SignOnClient;
use crate::buffer::Bounded;
use crate::consts::{N1_PRI_MAX_LENGTH, N1_PUB_MAX_LENGTH};
use crate::error::BootstrappingRequestError;
use crate::protocol::message::{BootstrappingRequest, SignOnMessage, encode_signed};
use crate::protocol::state::Stage;
use crate::signature::{SigningStep, sign_payload};
use tracing::{debug, warn};

impl SignOnClient {
    /// Builds the bootstrapping request into `out` and returns its length.
    ///
    /// Generates the N1 key pair, sends the device identifier, capabilities and N1
    /// public key, and signs them with the KS private key. N1 is only kept once the
    /// whole message has been written.
    ///
    /// 将引导请求写入 `out` 并返回其长度。生成 N1 密钥对，发送设备标识符、能力和 N1 公钥，
    /// 并使用 KS 私钥签名。只有在整条消息写入之后才会保存 N1。
    pub fn construct_bootstrapping_request(
        &mut self,
        out: &mut [u8],
    ) -> Result<usize, BootstrappingRequestError> {
        self.expect_stage(Stage::Initialized)?;
        let backend = self.backend.as_ref();

        let (ephemeral_pub, ephemeral_pri) =
            Bounded::<N1_PUB_MAX_LENGTH>::filled_with_pair_by::<N1_PRI_MAX_LENGTH, _>(
                |public_out, private_out| {
                    backend.generate_ephemeral_keypair(public_out, private_out)
                },
            )
            .map_err(|err| {
                warn!(%err, "N1 key pair generation failed");
                BootstrappingRequestError::KeypairGenerationFailed
            })?;

        let request = BootstrappingRequest {
            device_identifier: self.state.device_identifier.as_slice(),
            device_capabilities: self.state.device_capabilities.as_slice(),
            n1_pub: ephemeral_pub.as_slice(),
        };
        let payload = request.payload();
        let signature = sign_payload(
            backend,
            SigningStep::BootstrappingRequest,
            self.state.shared_pri.as_slice(),
            &payload,
        )?;
        let len = encode_signed(
            out,
            BootstrappingRequest::PACKET_TYPE,
            &payload,
            signature.as_slice(),
        )?;

        self.state.ephemeral_pub = ephemeral_pub;
        self.state.ephemeral_pri = ephemeral_pri;
        self.advance();
        debug!(len, "bootstrapping request constructed");
        Ok(len)
    }
}
