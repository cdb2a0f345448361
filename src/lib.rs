//! Device-side client for the Sign-On Basic credential bootstrapping protocol.
//!
//! A device holding a pre-shared key pair runs a four-message exchange with a
//! controller, negotiates a temporary session secret, and walks away with a
//! certificate and private key issued by the controller.
//!
//! 设备端 Sign-On Basic 凭证引导协议客户端。

pub mod buffer;
pub mod consts;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod protocol;
pub mod signature;

pub use crypto::suite::{BackendError, SecurityBackend, Variant};
pub use crypto::keys::{VerificationKey, VerificationPolicy};
pub use error::{Result, SignOnError};
pub use handshake::client::{IssuedCredential, SignOnClient, SignOnClientBuilder};
pub use protocol::state::Stage;
