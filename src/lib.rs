//! 胸部X線画像AI解析クライアント
//!
//! 解析APIへのアップロード、レスポンスの正規化、失敗時のフォールバック、
//! PDFレポート出力を提供する。

pub mod cli;
pub mod client;
pub mod config;
pub mod consent;
pub mod error;
pub mod export;
pub mod logging;
pub mod upload;

pub use client::{AnalysisOutcome, FailureReason, XrayClient};
pub use config::{ApiConfig, ApiConfigSource, Config, ConfigStore};
pub use error::{Result, XrayScanError};
pub use upload::ImageUpload;
pub use xray_scan_common::{AnalysisResult, DataPoint};
