//! The five Sign-On Basic wire messages.
//!
//! Every message is one outer TLV block (the packet header) whose value holds the
//! message fields followed by a single `Signature` block. The signature covers the
//! value bytes in front of the `Signature` block.
//!
//! Both directions are implemented for every message so that a controller, or a
//! test harness standing in for one, can use the same codec.
//!
//! 定义 Sign-On Basic 的五种线路消息。每条消息都是一个外层 TLV 块，其值包含消息字段，
//! 最后是一个 `Signature` 块；签名覆盖 `Signature` 块之前的所有值字节。

use crate::error::{BufferTooShort, DecodeError, Field, TlvError};
use crate::protocol::tlv::{self, Decoder, Encoder, probe_block_size};

/// TLV type numbers of packets and fields.
pub mod tlv_type {
    pub const BOOTSTRAPPING_REQUEST: u32 = 0xC0;
    pub const BOOTSTRAPPING_RESPONSE: u32 = 0xC1;
    pub const CERTIFICATE_REQUEST: u32 = 0xC2;
    pub const CERTIFICATE_RESPONSE: u32 = 0xC3;
    pub const FINISH_MESSAGE: u32 = 0xC4;

    pub const DEVICE_IDENTIFIER: u32 = 0x80;
    pub const DEVICE_CAPABILITIES: u32 = 0x81;
    pub const N1_PUB: u32 = 0x82;
    pub const N2_PUB: u32 = 0x83;
    pub const TRUST_ANCHOR_CERT: u32 = 0x84;
    pub const N2_PUB_HASH: u32 = 0x85;
    pub const TRUST_ANCHOR_CERT_HASH: u32 = 0x86;
    pub const KD_PUB_CERT: u32 = 0x87;
    pub const KD_PRI_ENC: u32 = 0x88;
    pub const SIGNATURE: u32 = 0x89;
}

/// A received packet split into its signed part and its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedPacket<'a> {
    pub packet_type: u32,
    /// Field blocks in front of the signature. This is what the signature covers.
    pub signed_payload: &'a [u8],
    pub signature: &'a [u8],
}

impl<'a> SignedPacket<'a> {
    /// Checks the packet header and locates the signature.
    ///
    /// The header is checked first, then the signature, so a packet with neither
    /// reports the header.
    ///
    /// 检查包头并定位签名。先检查包头，再检查签名。
    pub fn open(bytes: &'a [u8], packet_type: u32) -> Result<Self, DecodeError> {
        let mut outer = Decoder::new(bytes);
        let packet = outer
            .expect_block(packet_type)
            .map_err(|_| DecodeError::MissingField(Field::PacketHeader))?;
        if !outer.is_empty() {
            return Err(TlvError::TrailingBytes(bytes.len() - outer.offset()).into());
        }

        let mut inner = Decoder::new(packet.value);
        let mut signature = None;
        for block in &mut inner {
            let block = block?;
            if block.tlv_type == tlv_type::SIGNATURE {
                signature = Some(block);
                break;
            }
        }
        let signature = signature.ok_or(DecodeError::MissingField(Field::Signature))?;
        if !inner.is_empty() {
            return Err(TlvError::TrailingBytes(packet.value.len() - inner.offset()).into());
        }

        Ok(Self {
            packet_type,
            signed_payload: &packet.value[..signature.offset],
            signature: signature.value,
        })
    }

    /// Returns the value of a field from the signed part of the packet.
    pub fn field(&self, tlv_type: u32, field: Field) -> Result<&'a [u8], DecodeError> {
        tlv::find(self.signed_payload, tlv_type)?
            .map(|block| block.value)
            .ok_or(DecodeError::MissingField(field))
    }
}

/// Common shape of the Sign-On Basic messages.
///
/// Sign-On Basic 消息的通用结构。
pub trait SignOnMessage<'a>: Sized {
    const PACKET_TYPE: u32;

    /// The message fields in wire order.
    fn fields(&self) -> Vec<(u32, &'a [u8])>;

    /// Reads the fields out of an opened packet, in wire order.
    fn from_packet(packet: &SignedPacket<'a>) -> Result<Self, DecodeError>;

    /// Encodes the fields. This is the part that gets hashed and signed.
    fn payload(&self) -> Vec<u8> {
        let fields = self.fields();
        let len = fields
            .iter()
            .map(|(tlv_type, value)| probe_block_size(*tlv_type, value.len()))
            .sum();
        let mut out = Vec::with_capacity(len);
        for (tlv_type, value) in fields {
            tlv::push_block(&mut out, tlv_type, value);
        }
        out
    }

    /// Decodes a complete signed packet.
    fn decode(bytes: &'a [u8]) -> Result<(Self, SignedPacket<'a>), DecodeError> {
        let packet = SignedPacket::open(bytes, Self::PACKET_TYPE)?;
        let message = Self::from_packet(&packet)?;
        Ok((message, packet))
    }
}

/// Size of a complete packet with the given payload and signature lengths.
pub const fn encoded_len(packet_type: u32, payload_len: usize, signature_len: usize) -> usize {
    probe_block_size(
        packet_type,
        payload_len + probe_block_size(tlv_type::SIGNATURE, signature_len),
    )
}

/// Writes a complete packet into `out` and returns its length.
///
/// The full size is checked before the first byte is written.
///
/// 将完整的数据包写入 `out` 并返回其长度。在写入第一个字节之前检查完整大小。
pub fn encode_signed(
    out: &mut [u8],
    packet_type: u32,
    payload: &[u8],
    signature: &[u8],
) -> Result<usize, BufferTooShort> {
    let value_len = payload.len() + probe_block_size(tlv_type::SIGNATURE, signature.len());
    let mut encoder = Encoder::new(out);
    encoder.reserve(probe_block_size(packet_type, value_len))?;
    encoder.append_type(packet_type)?;
    encoder.append_length(value_len)?;
    encoder.append_raw(payload)?;
    encoder.append_block(tlv_type::SIGNATURE, signature)?;
    Ok(encoder.offset())
}

/// Like [`encode_signed`], into a new vector.
pub fn to_signed_vec(packet_type: u32, payload: &[u8], signature: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(payload.len() + signature.len() + 6);
    value.extend_from_slice(payload);
    tlv::push_block(&mut value, tlv_type::SIGNATURE, signature);
    let mut out = Vec::with_capacity(encoded_len(packet_type, payload.len(), signature.len()));
    tlv::push_block(&mut out, packet_type, &value);
    out
}

/// Device → controller. Announces the device and its N1 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrappingRequest<'a> {
    pub device_identifier: &'a [u8],
    pub device_capabilities: &'a [u8],
    pub n1_pub: &'a [u8],
}

impl<'a> SignOnMessage<'a> for BootstrappingRequest<'a> {
    const PACKET_TYPE: u32 = tlv_type::BOOTSTRAPPING_REQUEST;

    fn fields(&self) -> Vec<(u32, &'a [u8])> {
        vec![
            (tlv_type::DEVICE_IDENTIFIER, self.device_identifier),
            (tlv_type::DEVICE_CAPABILITIES, self.device_capabilities),
            (tlv_type::N1_PUB, self.n1_pub),
        ]
    }

    fn from_packet(packet: &SignedPacket<'a>) -> Result<Self, DecodeError> {
        Ok(Self {
            device_identifier: packet.field(tlv_type::DEVICE_IDENTIFIER, Field::DeviceIdentifier)?,
            device_capabilities: packet
                .field(tlv_type::DEVICE_CAPABILITIES, Field::DeviceCapabilities)?,
            n1_pub: packet.field(tlv_type::N1_PUB, Field::N1Pub)?,
        })
    }
}

/// Controller → device. Carries the trust anchor and the N2 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrappingResponse<'a> {
    pub trust_anchor_cert: &'a [u8],
    pub n2_pub: &'a [u8],
}

impl<'a> SignOnMessage<'a> for BootstrappingResponse<'a> {
    const PACKET_TYPE: u32 = tlv_type::BOOTSTRAPPING_RESPONSE;

    fn fields(&self) -> Vec<(u32, &'a [u8])> {
        vec![
            (tlv_type::TRUST_ANCHOR_CERT, self.trust_anchor_cert),
            (tlv_type::N2_PUB, self.n2_pub),
        ]
    }

    fn from_packet(packet: &SignedPacket<'a>) -> Result<Self, DecodeError> {
        Ok(Self {
            trust_anchor_cert: packet.field(tlv_type::TRUST_ANCHOR_CERT, Field::TrustAnchorCert)?,
            n2_pub: packet.field(tlv_type::N2_PUB, Field::N2Pub)?,
        })
    }
}

/// Device → controller. Proves receipt of the bootstrapping response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateRequest<'a> {
    pub device_identifier: &'a [u8],
    pub n2_pub_hash: &'a [u8],
    pub trust_anchor_cert_hash: &'a [u8],
}

impl<'a> SignOnMessage<'a> for CertificateRequest<'a> {
    const PACKET_TYPE: u32 = tlv_type::CERTIFICATE_REQUEST;

    fn fields(&self) -> Vec<(u32, &'a [u8])> {
        vec![
            (tlv_type::DEVICE_IDENTIFIER, self.device_identifier),
            (tlv_type::N2_PUB_HASH, self.n2_pub_hash),
            (tlv_type::TRUST_ANCHOR_CERT_HASH, self.trust_anchor_cert_hash),
        ]
    }

    fn from_packet(packet: &SignedPacket<'a>) -> Result<Self, DecodeError> {
        Ok(Self {
            device_identifier: packet.field(tlv_type::DEVICE_IDENTIFIER, Field::DeviceIdentifier)?,
            n2_pub_hash: packet.field(tlv_type::N2_PUB_HASH, Field::N2PubHash)?,
            trust_anchor_cert_hash: packet
                .field(tlv_type::TRUST_ANCHOR_CERT_HASH, Field::TrustAnchorCertHash)?,
        })
    }
}

/// Controller → device. Carries the KD certificate and the encrypted KD private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateResponse<'a> {
    pub issued_certificate: &'a [u8],
    pub encrypted_issued_private_key: &'a [u8],
}

impl<'a> SignOnMessage<'a> for CertificateResponse<'a> {
    const PACKET_TYPE: u32 = tlv_type::CERTIFICATE_RESPONSE;

    fn fields(&self) -> Vec<(u32, &'a [u8])> {
        vec![
            (tlv_type::KD_PUB_CERT, self.issued_certificate),
            (tlv_type::KD_PRI_ENC, self.encrypted_issued_private_key),
        ]
    }

    fn from_packet(packet: &SignedPacket<'a>) -> Result<Self, DecodeError> {
        Ok(Self {
            issued_certificate: packet.field(tlv_type::KD_PUB_CERT, Field::IssuedCertificate)?,
            encrypted_issued_private_key: packet
                .field(tlv_type::KD_PRI_ENC, Field::EncryptedIssuedPrivateKey)?,
        })
    }
}

/// Device → controller. Signed with the KD private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishMessage<'a> {
    pub device_identifier: &'a [u8],
}

impl<'a> SignOnMessage<'a> for FinishMessage<'a> {
    const PACKET_TYPE: u32 = tlv_type::FINISH_MESSAGE;

    fn fields(&self) -> Vec<(u32, &'a [u8])> {
        vec![(tlv_type::DEVICE_IDENTIFIER, self.device_identifier)]
    }

    fn from_packet(packet: &SignedPacket<'a>) -> Result<Self, DecodeError> {
        Ok(Self {
            device_identifier: packet.field(tlv_type::DEVICE_IDENTIFIER, Field::DeviceIdentifier)?,
        })
    }
}
