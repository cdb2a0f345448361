use super::SignOnClient;
use crate::error::FinishMessageError;
use crate::protocol::message::{FinishMessage, SignOnMessage, encode_signed};
use crate::protocol::state::Stage;
use crate::signature::{SigningStep, sign_payload};
use tracing::debug;

impl SignOnClient {
    /// Builds the finish message into `out` and returns its length.
    ///
    /// Signed with the newly issued KD private key, which proves to the controller
    /// that the device holds it. This ends the exchange.
    ///
    /// 将完成消息写入 `out` 并返回其长度。使用新签发的 KD 私钥签名，以此结束交换。
    pub fn construct_finish_message(&mut self, out: &mut [u8]) -> Result<usize, FinishMessageError> {
        self.expect_stage(Stage::CertificateResponseProcessed)?;

        let finish = FinishMessage {
            device_identifier: self.state.device_identifier.as_slice(),
        };
        let payload = finish.payload();
        let signature = sign_payload(
            self.backend.as_ref(),
            SigningStep::FinishMessage,
            self.state.issued_pri.as_slice(),
            &payload,
        )?;
        let len = encode_signed(out, FinishMessage::PACKET_TYPE, &payload, signature.as_slice())?;

        self.advance();
        debug!(len, "finish message constructed, sign-on complete");
        Ok(len)
    }
}
