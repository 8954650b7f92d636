//! 解析APIクライアント
//!
//! 画像をアップロードして解析結果を取得する。
//! 失敗時（通信・タイムアウト・HTTPエラー・不正なレスポンス）は
//! エラーを返さず固定のフォールバック結果に置き換える。リトライはしない。

mod outcome;

pub use outcome::{AnalysisOutcome, FailureReason};

use crate::config::{ApiConfig, ApiConfigSource};
use crate::error::{XrayScanError, Result};
use crate::upload::ImageUpload;
use reqwest::multipart::{Form, Part};
use xray_scan_common::{fallback_result, normalize, parse_raw_response, AnalysisResult};

/// multipart の画像フィールド名
pub const UPLOAD_FIELD_NAME: &str = "file";

pub struct XrayClient<S> {
    http: reqwest::Client,
    source: S,
}

impl<S: ApiConfigSource> XrayClient<S> {
    pub fn new(source: S) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| XrayScanError::ApiCall(format!("HTTPクライアント初期化エラー: {}", e)))?;
        Ok(Self::with_http_client(http, source))
    }

    pub fn with_http_client(http: reqwest::Client, source: S) -> Self {
        Self { http, source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 画像取得等で共有するHTTPクライアント
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// 現在のAPI設定（呼び出しごとに読み直す）
    pub fn api_config(&self) -> ApiConfig {
        self.source.api_config()
    }

    /// 画像を解析APIに送信
    ///
    /// 常に結果を返す。失敗時は `AnalysisOutcome::Fallback` に理由を添えて返す。
    pub async fn submit_for_analysis(&self, image: &ImageUpload) -> AnalysisOutcome {
        let config = self.source.api_config();

        match self.request_analysis(&config, image).await {
            Ok(result) => AnalysisOutcome::Analyzed(result),
            Err(reason) => {
                tracing::error!(url = %config.analyze_url(), %reason, "解析リクエストに失敗");
                tracing::warn!("サーバーの結果の代わりにローカルのテストデータを使用します");
                AnalysisOutcome::Fallback {
                    result: fallback_result(),
                    reason,
                }
            }
        }
    }

    /// 出所を区別しない解析（常に AnalysisResult を返す）
    pub async fn analyze_xray_image(&self, image: &ImageUpload) -> AnalysisResult {
        self.submit_for_analysis(image).await.into_result()
    }

    async fn request_analysis(
        &self,
        config: &ApiConfig,
        image: &ImageUpload,
    ) -> std::result::Result<AnalysisResult, FailureReason> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| FailureReason::Transport(e.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let url = config.analyze_url();
        tracing::debug!(%url, file = %image.file_name, size = image.len(), "解析リクエスト送信");

        let body = tokio::time::timeout(config.analyze_timeout, self.post_form(&url, form))
            .await
            .map_err(|_| FailureReason::Timeout)??;

        tracing::debug!(body = %body, "APIレスポンス");

        let raw = parse_raw_response(&body)
            .map_err(|e| FailureReason::MalformedJson(e.to_string()))?;

        normalize(&raw).map_err(|e| match e {
            xray_scan_common::Error::EmptyDetails => FailureReason::EmptyDetails,
            other => FailureReason::MalformedJson(other.to_string()),
        })
    }

    async fn post_form(&self, url: &str, form: Form) -> std::result::Result<String, FailureReason> {
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(classify)
    }

    /// APIの疎通確認
    ///
    /// 2xxなら true。エラー・タイムアウト・2xx以外は false。
    pub async fn check_availability(&self) -> bool {
        let config = self.source.api_config();
        let url = config.health_url();

        let request = self
            .http
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send();

        match tokio::time::timeout(config.health_timeout, request).await {
            Ok(Ok(response)) => {
                let available = response.status().is_success();
                tracing::debug!(%url, status = %response.status(), available, "疎通確認");
                available
            }
            Ok(Err(e)) => {
                tracing::error!(%url, error = %e, "API疎通確認エラー");
                false
            }
            Err(_) => {
                tracing::error!(%url, "API疎通確認がタイムアウト");
                false
            }
        }
    }
}

fn classify(error: reqwest::Error) -> FailureReason {
    if error.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Transport(error.to_string())
    }
}
