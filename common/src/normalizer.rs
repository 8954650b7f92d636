//! APIレスポンス正規化
//!
//! 解析APIの生レスポンスを AnalysisResult に変換する。
//!
//! ## 処理内容
//! 1. details[0] から異常所見フラグと確信度を決定
//! 2. gpt_diagnosis から「Заключение」以降を所見として抽出
//! 3. details 全件を DataPoint に変換（順序・件数はそのまま）

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, DataPoint, RawAnalysisResponse};

/// 所見の開始位置を示すマーカー（判定順）
///
/// 既存の出力と互換を保つため、内容と順序を変更しないこと。
pub const CONCLUSION_MARKERS: &[&str] = &[
    "Заключение:",
    "заключение:",
    "ЗАКЛЮЧЕНИЕ:",
    "### Заключение",
    "### ЗАКЛЮЧЕНИЕ",
    "**Заключение:**",
    "Заключение",
    "ЗАКЛЮЧЕНИЕ",
    "\n\n### Заключение",
    "\nЗаключение:",
    "\n\nЗаключение:",
];

/// 所見が得られなかった場合の表示文言
pub const DEFAULT_CONCLUSION: &str = "Заключение: Анализ завершен";

/// 正常と判定するラベル
pub const NORMAL_LABEL: &str = "Норма";

/// 正常ラベルがこの確信度(%)を超えた場合のみ正常とみなす
pub const NORMAL_CONFIDENCE_THRESHOLD: f64 = 50.0;

/// 最も左に現れるマーカーを探す
///
/// 同じ位置で複数ヒットした場合は CONCLUSION_MARKERS で先に判定したものを返す。
///
/// # Returns
/// * `Some((byte_index, marker))` - 見つかった位置とマーカー
/// * `None` - どのマーカーも含まれない
pub fn find_conclusion_marker(text: &str) -> Option<(usize, &'static str)> {
    let mut found: Option<(usize, &'static str)> = None;

    for &marker in CONCLUSION_MARKERS {
        if let Some(index) = text.find(marker) {
            match found {
                Some((best, _)) if index >= best => {}
                _ => found = Some((index, marker)),
            }
        }
    }

    found
}

/// 診断テキストから所見部分を抽出
///
/// マーカーが見つかればその位置から末尾まで（マーカーを含む）、
/// 見つからなければ入力全体を返す。空文字はそのまま空文字。
///
/// # Examples
/// ```
/// use xray_scan_common::extract_conclusion;
///
/// let text = "Описание снимка.\nЗаключение: норма";
/// assert_eq!(extract_conclusion(text), "\nЗаключение: норма");
/// ```
pub fn extract_conclusion(text: &str) -> &str {
    match find_conclusion_marker(text) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

/// 生レスポンス（JSON文字列）をパース
///
/// JSONとして不正なら `Error::Json`、オブジェクト以外（配列・null等）なら `Error::Parse`。
pub fn parse_raw_response(body: &str) -> Result<RawAnalysisResponse> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let kind = match &value {
        serde_json::Value::Object(_) => return Ok(serde_json::from_value(value)?),
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
    };
    Err(Error::Parse(format!("expected JSON object, got {}", kind)))
}

/// 生レスポンスを AnalysisResult に変換
///
/// details が空の場合は `Error::EmptyDetails` を返す。
/// 呼び出し側（解析クライアント）はこれをフォールバック対象の失敗として扱う。
pub fn normalize(raw: &RawAnalysisResponse) -> Result<AnalysisResult> {
    let primary = raw.details.first().ok_or(Error::EmptyDetails)?;

    let is_normal =
        primary.label == NORMAL_LABEL && primary.confidence > NORMAL_CONFIDENCE_THRESHOLD;

    let conclusion = match extract_conclusion(&raw.gpt_diagnosis) {
        "" => DEFAULT_CONCLUSION.to_string(),
        text => text.to_string(),
    };

    let data_points = raw
        .details
        .iter()
        .map(|detail| DataPoint::new(detail.label.clone(), detail.percent()))
        .collect();

    Ok(AnalysisResult {
        conclusion,
        details: raw.interpretation.clone(),
        confidence: primary.percent(),
        data_points,
        has_abnormality: !is_normal,
        heatmap_url: Some(raw.heatmap_url.clone().unwrap_or_default()),
        original_url: Some(raw.original_url.clone().unwrap_or_default()),
    })
}
