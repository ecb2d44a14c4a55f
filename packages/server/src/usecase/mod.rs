//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod connect_participant;
pub mod disconnect_participant;
pub mod dispatch;
pub mod error;
mod presence;
pub mod send_message;

pub use connect_participant::{ConnectParticipantUseCase, OpenedSession};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch::{CollaboratorDispatcher, Collaborators, DEFAULT_DISPATCH_CAPACITY};
pub use error::{ConnectError, SendMessageError};
pub use send_message::{RelayOutcome, SendMessageUseCase};
