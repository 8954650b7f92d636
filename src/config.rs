//! 設定モジュール
//!
//! `~/.config/xray-scan/config.json` にAPIのベースURL等を保存する。
//! 解析クライアントは `ApiConfigSource` を通してリクエストごとに設定を読み直す。

use crate::error::{XrayScanError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 解析APIのデフォルトURL
pub const DEFAULT_API_URL: &str = "https://snikasipoin-api-xray-scan-ed4e.twc1.net";

/// 環境変数によるURL上書き
pub const API_URL_ENV: &str = "XRAY_API_URL";

pub const ANALYZE_ENDPOINT: &str = "/upload";
pub const HEALTH_ENDPOINT: &str = "/";

pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(60);
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// 永続化される設定
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// APIのベースURL（未設定ならデフォルト）
    #[serde(default)]
    pub api_url: Option<String>,

    /// PDF出力用のTTFフォント（キリル文字の表示に必要）
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

impl Config {
    /// 有効なベースURL
    pub fn base_url(&self) -> String {
        self.api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url())
    }
}

/// 解析APIのエンドポイント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub analyze: String,
    pub health: String,
}

/// 1リクエスト分のAPI設定スナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub analyze_timeout: Duration,
    pub health_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoints: Endpoints {
                analyze: ANALYZE_ENDPOINT.into(),
                health: HEALTH_ENDPOINT.into(),
            },
            analyze_timeout: ANALYZE_TIMEOUT,
            health_timeout: HEALTH_TIMEOUT,
        }
    }

    pub fn analyze_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoints.analyze)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoints.health)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// リクエスト時点のAPI設定を返す
pub trait ApiConfigSource {
    fn api_config(&self) -> ApiConfig;
}

/// 固定設定（テストや一時的な接続先の指定に使う）
impl ApiConfigSource for ApiConfig {
    fn api_config(&self) -> ApiConfig {
        self.clone()
    }
}

/// JSONファイルに保存する設定ストア
///
/// 読み込みは毎回ファイルから行うため、別プロセスでの変更も次のリクエストから反映される。
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ホームディレクトリ配下の標準パスを使用
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn set_api_url(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(XrayScanError::Config(format!(
                "URLは http:// または https:// で始まる必要があります: {}",
                url
            )));
        }

        let mut config = self.load()?;
        config.api_url = Some(url.trim_end_matches('/').to_string());
        self.save(&config)
    }

    pub fn reset_api_url(&self) -> Result<()> {
        let mut config = self.load()?;
        config.api_url = None;
        self.save(&config)
    }

    pub fn set_font_path(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(XrayScanError::FileNotFound(path.display().to_string()));
        }

        let mut config = self.load()?;
        config.font_path = Some(path.to_path_buf());
        self.save(&config)
    }

    /// 環境変数を優先した有効ベースURL
    pub fn effective_base_url(&self) -> String {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                return url.to_string();
            }
        }

        match self.load() {
            Ok(config) => config.base_url(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "設定ファイルを読めないためデフォルトURLを使用");
                DEFAULT_API_URL.to_string()
            }
        }
    }
}

impl ApiConfigSource for ConfigStore {
    fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.effective_base_url())
    }
}

/// 設定ディレクトリ（`~/.config/xray-scan`）
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| XrayScanError::Config("ホームディレクトリが見つかりません".into()))?;
    Ok(home.join(".config").join("xray-scan"))
}
