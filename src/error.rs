use thiserror::Error;

#[derive(Error, Debug)]
pub enum XrayScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("個人データ処理への同意が拒否されています。`xray-scan consent --accept` で同意してください")]
    ConsentRejected,

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("ログ初期化エラー: {0}")]
    Logging(String),

    #[error(transparent)]
    Common(#[from] xray_scan_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XrayScanError>;
