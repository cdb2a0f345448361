//! Defines the stages of the Sign-On Basic client state machine.
//!
//! The stage is carried inside the client value and only ever moves forward
//! one step at a time. A failed step leaves it where it was.
//!
//! 定义 Sign-On Basic 客户端状态机的各个阶段。阶段只会逐步前进，失败的步骤不会改变阶段。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Client state is populated; nothing has been sent yet.
    ///
    /// 客户端状态已填充，尚未发送任何消息。
    Initialized,
    /// The bootstrapping request has been built and N1 generated.
    BootstrappingRequestConstructed,
    /// The bootstrapping response was verified and KT derived.
    BootstrappingResponseProcessed,
    /// The certificate request has been built.
    CertificateRequestConstructed,
    /// The issued certificate and private key are held.
    CertificateResponseProcessed,
    /// The finish message has been built. Terminal.
    ///
    /// 已构建完成消息。终止状态。
    Finished,
}

impl Stage {
    /// The stage a successful step moves to, or `None` from [`Stage::Finished`].
    pub const fn next(self) -> Option<Stage> {
        match self {
            Stage::Initialized => Some(Stage::BootstrappingRequestConstructed),
            Stage::BootstrappingRequestConstructed => Some(Stage::BootstrappingResponseProcessed),
            Stage::BootstrappingResponseProcessed => Some(Stage::CertificateRequestConstructed),
            Stage::CertificateRequestConstructed => Some(Stage::CertificateResponseProcessed),
            Stage::CertificateResponseProcessed => Some(Stage::Finished),
            Stage::Finished => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order_and_end() {
        let mut stage = Stage::Initialized;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            visited.push(stage);
        }
        assert_eq!(visited.len(), 6);
        assert!(stage.is_terminal());
    }
}
