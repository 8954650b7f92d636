//! 解析結果の型定義
//!
//! - RawAnalysisResponse: 解析APIが返す生のJSON（信頼しない入力）
//! - AnalysisResult: 正規化後の結果（表示・PDF出力で使用）

use serde::{Deserialize, Deserializer, Serialize};

/// 解析パラメータ1件（ラベル + 確信度%）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    /// 確信度%。APIの値を四捨五入し 0-100 に丸めたもの（範囲外の値は書き換わる）
    pub percent: u32,
}

impl DataPoint {
    pub fn new(label: impl Into<String>, percent: u32) -> Self {
        Self {
            label: label.into(),
            percent,
        }
    }
}

/// 正規化済みの解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 総合所見（空にはならない）
    pub conclusion: String,

    /// 詳細な読影コメント
    #[serde(default)]
    pub details: String,

    /// アルゴリズムの確信度（%）
    #[serde(default)]
    pub confidence: u32,

    #[serde(default)]
    pub data_points: Vec<DataPoint>,

    #[serde(default)]
    pub has_abnormality: bool,

    /// ヒートマップの相対パス（API側）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap_url: Option<String>,

    /// 元画像の相対パス（API側）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl AnalysisResult {
    /// 空文字を除いたヒートマップのパス
    pub fn heatmap_path(&self) -> Option<&str> {
        non_empty(self.heatmap_url.as_deref())
    }

    /// 空文字を除いた元画像のパス
    pub fn original_path(&self) -> Option<&str> {
        non_empty(self.original_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// APIレスポンスの details 要素
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDetailEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,

    /// 0-100の確信度。整数・小数どちらも受け付ける
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f64,
}

impl RawDetailEntry {
    /// 確信度を整数%に変換（四捨五入、0-100に丸める）
    pub fn percent(&self) -> u32 {
        if !self.confidence.is_finite() {
            return 0;
        }
        self.confidence.round().clamp(0.0, 100.0) as u32
    }
}

/// 解析APIの生レスポンス
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawAnalysisResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub details: Vec<RawDetailEntry>,

    #[serde(deserialize_with = "null_as_default")]
    pub gpt_diagnosis: String,

    #[serde(deserialize_with = "null_as_default")]
    pub interpretation: String,

    pub heatmap_url: Option<String>,

    pub original_url: Option<String>,
}

/// `null` をフィールドのデフォルト値として扱う
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
