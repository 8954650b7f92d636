//! 個人データ処理への同意状態
//!
//! 未回答 / 同意 / 拒否 の3状態。拒否中は解析を実行しない（判定はCLI側）。

use crate::config::config_dir;
use crate::error::Result;
use std::path::{Path, PathBuf};

const CONSENT_FILE_NAME: &str = "consent";
const ACCEPTED: &str = "accepted";
const REJECTED: &str = "rejected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentState {
    #[default]
    Unset,
    Accepted,
    Rejected,
}

impl ConsentState {
    fn parse(value: &str) -> Self {
        match value.trim() {
            ACCEPTED => ConsentState::Accepted,
            REJECTED => ConsentState::Rejected,
            _ => ConsentState::Unset,
        }
    }

    /// 解析を進めてよいか（未回答は呼び出し側で確認する）
    pub fn allows_upload(&self) -> bool {
        !matches!(self, ConsentState::Rejected)
    }
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsentState::Unset => write!(f, "未回答"),
            ConsentState::Accepted => write!(f, "同意済み"),
            ConsentState::Rejected => write!(f, "拒否"),
        }
    }
}

/// 同意状態ファイル
#[derive(Debug, Clone)]
pub struct ConsentStore {
    path: PathBuf,
}

impl ConsentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(config_dir()?.join(CONSENT_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 現在の状態。ファイルがなければ未回答
    pub fn state(&self) -> ConsentState {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => ConsentState::parse(&content),
            Err(_) => ConsentState::Unset,
        }
    }

    pub fn accept(&self) -> Result<()> {
        self.write(ACCEPTED)
    }

    pub fn reject(&self) -> Result<()> {
        self.write(REJECTED)
    }

    pub fn record(&self, accepted: bool) -> Result<()> {
        if accepted {
            self.accept()
        } else {
            self.reject()
        }
    }

    /// 未回答に戻す
    pub fn reset(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn write(&self, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, value)?;
        tracing::debug!(path = %self.path.display(), value, "同意状態を保存");
        Ok(())
    }
}
