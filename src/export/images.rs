//! レポート画像の取得
//!
//! APIの画像URL（元画像・ヒートマップ）を取得する。URLがない、または取得に
//! 失敗した場合はローカル画像で代用する。どちらもなければ None（PDFでは参照先を文字で表示）。

use crate::client::FailureReason;
use std::path::Path;
use std::time::Duration;
use xray_scan_common::ReportContent;

/// 画像1枚の取得タイムアウト
pub const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// ReportContent.images と同じ順序で画像データを読み込む
pub async fn load_report_images(
    http: &reqwest::Client,
    content: &ReportContent,
    local_image: Option<&Path>,
) -> Vec<Option<Vec<u8>>> {
    let local = local_image.and_then(|path| match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ローカル画像を読み込めません");
            None
        }
    });

    let mut loaded = Vec::with_capacity(content.images.len());
    for image in &content.images {
        let bytes = if is_remote(&image.source) {
            match fetch_image(http, &image.source).await {
                Ok(bytes) => Some(bytes),
                Err(reason) => {
                    tracing::warn!(url = %image.source, %reason, "画像を取得できません。ローカル画像で代用します");
                    local.clone()
                }
            }
        } else {
            local.clone()
        };
        loaded.push(bytes);
    }
    loaded
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, FailureReason> {
    let request = async {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| FailureReason::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FailureReason::Transport(e.to_string()))?;
        Ok::<_, FailureReason>(bytes.to_vec())
    };

    tokio::time::timeout(IMAGE_FETCH_TIMEOUT, request)
        .await
        .map_err(|_| FailureReason::Timeout)?
}
