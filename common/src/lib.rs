//! X-Ray Scan Common Library
//!
//! CLIと他フロントエンド(WASM/デスクトップ)で共有される型と純粋な変換処理

pub mod types;
pub mod error;
pub mod normalizer;
pub mod fallback;
pub mod report;

pub use types::{AnalysisResult, DataPoint, RawAnalysisResponse, RawDetailEntry};
pub use error::{Error, Result};
pub use normalizer::{
    extract_conclusion, find_conclusion_marker, normalize, parse_raw_response,
    CONCLUSION_MARKERS, DEFAULT_CONCLUSION,
};
pub use fallback::fallback_result;
pub use report::{resolve_image_url, ReportContent, ReportImage, ReportMetric};
