//! Error type for the content client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CmsError>;

pub const MSG_UNAUTHORIZED: &str = "APIキーが無効です。microCMSの設定を確認してください。";
pub const MSG_NOT_FOUND: &str =
    "APIエンドポイントが見つかりません。エンドポイント名を確認してください。";
pub const MSG_FORBIDDEN: &str = "アクセス権限がありません。APIキーの権限を確認してください。";
pub const MSG_GENERIC: &str = "microCMSとの通信でエラーが発生しました。";

#[derive(Error, Debug)]
pub enum CmsError {
    /// Required credentials are absent; carries the full user-facing text.
    #[error("{0}")]
    MissingConfig(String),

    /// The API answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CmsError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing to the site owner.
    pub fn user_message(&self) -> String {
        match self.status() {
            Some(401) => MSG_UNAUTHORIZED.to_string(),
            Some(404) => MSG_NOT_FOUND.to_string(),
            Some(403) => MSG_FORBIDDEN.to_string(),
            _ => match self {
                Self::MissingConfig(msg) | Self::InvalidArgument(msg) => msg.clone(),
                Self::Status { .. } | Self::Decode(_) => self.to_string(),
                Self::Request(_) => MSG_GENERIC.to_string(),
            },
        }
    }
}
