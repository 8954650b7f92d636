//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSONとしては正しいが期待した形でない
    #[error("Parse error: {0}")]
    Parse(String),

    /// 解析APIのレスポンスに details が1件もない
    #[error("Response has no detail entries")]
    EmptyDetails,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
