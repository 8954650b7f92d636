//! レポート内容モデル
//!
//! PDF等の出力形式に依存しない、レポートのセクション構成を組み立てる。
//! 描画は各フロントエンド側（CLIは printpdf）で行う。

use crate::types::AnalysisResult;

pub const REPORT_TITLE: &str = "Aura X-Ray Scan";
pub const DEFAULT_PATIENT_NAME: &str = "Не указан";
pub const REPORT_FOOTER: &str =
    "Анализ выполнен с использованием алгоритма нейросетевой диагностики AuraX-Ray Scan v1.0";

/// セクション見出し
pub const HEADING_PATIENT: &str = "Данные пациента";
pub const HEADING_CONCLUSION: &str = "Заключение";
pub const HEADING_CONFIDENCE: &str = "Уверенность алгоритма";
pub const HEADING_METRICS: &str = "Параметры анализа";

pub const CAPTION_ORIGINAL: &str = "Оригинальный снимок";
pub const CAPTION_HEATMAP: &str = "Тепловая карта";

/// パラメータ欄の列数
pub const METRIC_COLUMNS: usize = 2;

/// レポートに載せる画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportImage {
    pub caption: &'static str,
    /// 絶対URL、またはローカル画像の参照
    pub source: String,
}

/// パラメータ欄の1セル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetric {
    pub label: String,
    pub value: String,
}

/// レポート全体の内容（上から順に描画する）
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub title: &'static str,
    pub date: String,
    pub patient_name: String,
    pub images: Vec<ReportImage>,
    pub conclusion: String,
    pub has_abnormality: bool,
    pub confidence: u32,
    pub metrics: Vec<ReportMetric>,
    pub footer: &'static str,
}

impl ReportContent {
    /// 解析結果からレポート内容を構築
    ///
    /// # Arguments
    /// * `result` - 正規化済みの解析結果
    /// * `patient_name` - 患者名（未指定・空白は「Не указан」）
    /// * `date` - 表示用にフォーマット済みの日時
    /// * `base_url` - API相対パスを解決するベースURL
    /// * `local_image` - APIに画像URLがない場合に使うローカル画像の参照
    pub fn build(
        result: &AnalysisResult,
        patient_name: Option<&str>,
        date: &str,
        base_url: &str,
        local_image: &str,
    ) -> Self {
        let patient_name = patient_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PATIENT_NAME)
            .to_string();

        let images = vec![
            ReportImage {
                caption: CAPTION_ORIGINAL,
                source: resolve_image_url(base_url, result.original_path(), local_image),
            },
            ReportImage {
                caption: CAPTION_HEATMAP,
                source: resolve_image_url(base_url, result.heatmap_path(), local_image),
            },
        ];

        let metrics = result
            .data_points
            .iter()
            .map(|point| ReportMetric {
                label: point.label.clone(),
                value: format!("{}%", point.percent),
            })
            .collect();

        Self {
            title: REPORT_TITLE,
            date: date.to_string(),
            patient_name,
            images,
            conclusion: result.conclusion.clone(),
            has_abnormality: result.has_abnormality,
            confidence: result.confidence,
            metrics,
            footer: REPORT_FOOTER,
        }
    }

    /// 確信度の表示文字列（例: "94%"）
    pub fn confidence_label(&self) -> String {
        format!("{}%", self.confidence)
    }

    /// 確信度バーの塗りつぶし比率（0.0-1.0）
    pub fn confidence_ratio(&self) -> f32 {
        self.confidence.min(100) as f32 / 100.0
    }

    /// パラメータ欄を METRIC_COLUMNS 列ごとの行に分割
    pub fn metric_rows(&self) -> std::slice::Chunks<'_, ReportMetric> {
        self.metrics.chunks(METRIC_COLUMNS)
    }
}

/// API相対パスを絶対URLに解決
///
/// 相対パスがなければ `fallback`（ローカル画像）を返す。
pub fn resolve_image_url(base_url: &str, relative: Option<&str>, fallback: &str) -> String {
    match relative.filter(|path| !path.is_empty()) {
        Some(path) if path.starts_with("http://") || path.starts_with("https://") => {
            path.to_string()
        }
        Some(path) => {
            let base = base_url.trim_end_matches('/');
            if path.starts_with('/') {
                format!("{}{}", base, path)
            } else {
                format!("{}/{}", base, path)
            }
        }
        None => fallback.to_string(),
    }
}
