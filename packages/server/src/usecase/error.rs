//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{DirectoryError, LifecycleError, ValueObjectError};

/// 接続処理（Connecting / Open）のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// 接続メタデータから有効な ID を得られない
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] ValueObjectError),

    /// 患者が存在しないため、ルームを解決できない
    #[error("patient not found: {0}")]
    PatientNotFound(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<DirectoryError> for ConnectError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::PatientNotFound(id) => ConnectError::PatientNotFound(id),
        }
    }
}

/// メッセージ中継のエラー
///
/// いずれもそのメッセージ単位で閉じたエラーで、接続は切断しない。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// デコードできないペイロード（中継も永続化もしない）
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Open 状態でない接続からのメッセージ
    #[error("connection is not open")]
    ConnectionNotOpen,
}
