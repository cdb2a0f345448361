use crate::buffer::CapacityError;
use crate::protocol::state::Stage;
use crate::signature::SignFailure;
use std::fmt;
use thiserror::Error;

pub use crate::protocol::tlv::TlvError;

/// Names a field of the client state or of a wire message.
///
/// Used to make decode and capacity errors point at the exact field that failed.
///
/// 标识客户端状态或线路消息中的一个字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PacketHeader,
    Signature,
    DeviceIdentifier,
    DeviceCapabilities,
    SecureSignOnCode,
    SharedPublicKey,
    SharedPrivateKey,
    N1Pub,
    N2Pub,
    TrustAnchorCert,
    N2PubHash,
    TrustAnchorCertHash,
    IssuedCertificate,
    EncryptedIssuedPrivateKey,
    CertificateContent,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::PacketHeader => "packet header",
            Field::Signature => "signature",
            Field::DeviceIdentifier => "device identifier",
            Field::DeviceCapabilities => "device capabilities",
            Field::SecureSignOnCode => "secure sign-on code",
            Field::SharedPublicKey => "KS public key",
            Field::SharedPrivateKey => "KS private key",
            Field::N1Pub => "N1 public key",
            Field::N2Pub => "N2 public key",
            Field::TrustAnchorCert => "trust anchor certificate",
            Field::N2PubHash => "N2 public key hash",
            Field::TrustAnchorCertHash => "trust anchor certificate hash",
            Field::IssuedCertificate => "KD public certificate",
            Field::EncryptedIssuedPrivateKey => "encrypted KD private key",
            Field::CertificateContent => "certificate content",
        };
        f.write_str(name)
    }
}

/// A step was called while the client was at a different stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step requires stage {expected:?}, client is at {actual:?}")]
pub struct StageError {
    pub expected: Stage,
    pub actual: Stage,
}

/// Errors raised while reading a wire message.
///
/// 读取线路消息时产生的错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing or unreadable {0}")]
    MissingField(Field),

    #[error("{field} is {len} bytes, limit is {max}")]
    FieldTooLarge { field: Field, len: usize, max: usize },

    #[error("malformed TLV: {0}")]
    Tlv(#[from] TlvError),
}

impl DecodeError {
    pub(crate) fn too_large(field: Field) -> impl FnOnce(CapacityError) -> Self {
        move |err| DecodeError::FieldTooLarge {
            field,
            len: err.len,
            max: err.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("unrecognized sign-on variant {0}")]
    UnrecognizedVariant(u8),

    #[error("failed to bind the security backend")]
    BackendBindingFailed,

    #[error("{field} is {len} bytes, limit is {max}")]
    FieldTooLarge { field: Field, len: usize, max: usize },

    #[error("builder is missing required field: {0}")]
    BuilderMissingField(&'static str),
}

impl InitError {
    pub(crate) fn too_large(field: Field) -> impl FnOnce(CapacityError) -> Self {
        move |err| InitError::FieldTooLarge {
            field,
            len: err.len,
            max: err.max,
        }
    }
}

/// Errors from constructing the bootstrapping request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootstrappingRequestError {
    #[error(transparent)]
    WrongStage(#[from] StageError),

    #[error("destination buffer too short: need {required} bytes, have {available}")]
    BufferTooShort { required: usize, available: usize },

    #[error("failed to generate the N1 key pair")]
    KeypairGenerationFailed,

    #[error("failed to hash the signature payload")]
    HashFailed,

    #[error("failed to sign the bootstrapping request")]
    SignatureFailed,
}

/// Errors from processing the bootstrapping request response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootstrappingResponseError {
    #[error(transparent)]
    WrongStage(#[from] StageError),

    #[error("missing or unreadable {0}")]
    MissingField(Field),

    #[error("{field} is {len} bytes, limit is {max}")]
    FieldTooLarge { field: Field, len: usize, max: usize },

    #[error("malformed TLV: {0}")]
    Malformed(TlvError),

    #[error("bootstrapping response signature did not verify")]
    SignatureVerificationFailed,

    #[error("failed to derive KT from the ephemeral keys")]
    SessionSecretDerivationFailed,
}

/// Errors from constructing the certificate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CertificateRequestError {
    #[error(transparent)]
    WrongStage(#[from] StageError),

    #[error("destination buffer too short: need {required} bytes, have {available}")]
    BufferTooShort { required: usize, available: usize },

    #[error("failed to hash the N2 public key")]
    N2PubHashFailed,

    #[error("failed to hash the trust anchor certificate")]
    TrustAnchorCertHashFailed,

    #[error("failed to hash the signature payload")]
    HashFailed,

    #[error("failed to sign the certificate request")]
    SignatureFailed,
}

/// Errors from processing the certificate request response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CertificateResponseError {
    #[error(transparent)]
    WrongStage(#[from] StageError),

    #[error("missing or unreadable {0}")]
    MissingField(Field),

    #[error("{field} is {len} bytes, limit is {max}")]
    FieldTooLarge { field: Field, len: usize, max: usize },

    #[error("malformed TLV: {0}")]
    Malformed(TlvError),

    #[error("certificate response signature did not verify")]
    SignatureVerificationFailed,

    #[error("failed to decrypt the KD private key")]
    DecryptionFailed,
}

/// Errors from constructing the finish message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FinishMessageError {
    #[error(transparent)]
    WrongStage(#[from] StageError),

    #[error("destination buffer too short: need {required} bytes, have {available}")]
    BufferTooShort { required: usize, available: usize },

    #[error("failed to hash the signature payload")]
    HashFailed,

    #[error("failed to sign the finish message")]
    SignatureFailed,
}

macro_rules! impl_from_decode_error {
    ($($ty:ty),+) => {$(
        impl From<DecodeError> for $ty {
            fn from(err: DecodeError) -> Self {
                match err {
                    DecodeError::MissingField(field) => Self::MissingField(field),
                    DecodeError::FieldTooLarge { field, len, max } => {
                        Self::FieldTooLarge { field, len, max }
                    }
                    DecodeError::Tlv(err) => Self::Malformed(err),
                }
            }
        }
    )+};
}

impl_from_decode_error!(BootstrappingResponseError, CertificateResponseError);

/// The destination buffer cannot hold an encoded message.
///
/// Always detected before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("destination buffer too short: need {required} bytes, have {available}")]
pub struct BufferTooShort {
    pub required: usize,
    pub available: usize,
}

macro_rules! impl_from_buffer_too_short {
    ($($ty:ty),+) => {$(
        impl From<BufferTooShort> for $ty {
            fn from(err: BufferTooShort) -> Self {
                Self::BufferTooShort {
                    required: err.required,
                    available: err.available,
                }
            }
        }
    )+};
}

impl_from_buffer_too_short!(
    BootstrappingRequestError,
    CertificateRequestError,
    FinishMessageError
);

macro_rules! impl_from_sign_failure {
    ($($ty:ty),+) => {$(
        impl From<SignFailure> for $ty {
            fn from(failure: SignFailure) -> Self {
                match failure {
                    SignFailure::Hash => Self::HashFailed,
                    SignFailure::Sign => Self::SignatureFailed,
                }
            }
        }
    )+};
}

impl_from_sign_failure!(
    BootstrappingRequestError,
    CertificateRequestError,
    FinishMessageError
);

/// Top-level error for callers that drive the whole exchange with `?`.
///
/// 供使用 `?` 驱动整个交换流程的调用方使用的顶层错误。
#[derive(Debug, Error)]
pub enum SignOnError {
    #[error("initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("bootstrapping request: {0}")]
    BootstrappingRequest(#[from] BootstrappingRequestError),

    #[error("bootstrapping response: {0}")]
    BootstrappingResponse(#[from] BootstrappingResponseError),

    #[error("certificate request: {0}")]
    CertificateRequest(#[from] CertificateRequestError),

    #[error("certificate response: {0}")]
    CertificateResponse(#[from] CertificateResponseError),

    #[error("finish message: {0}")]
    FinishMessage(#[from] FinishMessageError),

    #[error(transparent)]
    WrongStage(#[from] StageError),

    #[error("message decoding failed: {0}")]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, SignOnError>;
