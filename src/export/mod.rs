pub mod fonts;
pub mod images;
pub mod layout;
pub mod pdf;

use crate::error::Result;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use std::path::{Path, PathBuf};
use xray_scan_common::{AnalysisResult, ReportContent};

const MONTHS_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня",
    "июля", "августа", "сентября", "октября", "ноября", "декабря",
];

/// PDFレポート出力のパラメータ
#[derive(Debug, Clone)]
pub struct PdfReportOptions<'a> {
    pub result: &'a AnalysisResult,
    /// APIに画像URLがない・取得できない場合に載せるローカル画像
    pub local_image: Option<PathBuf>,
    /// API相対パスの解決に使うベースURL
    pub base_url: String,
    pub patient_name: Option<String>,
    pub timestamp: DateTime<Local>,
    pub font_path: Option<PathBuf>,
}

/// 日時をロシア語の長い形式に変換（例: "17 октября 2026 г., 14:05"）
pub fn format_report_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    let month = MONTHS_GENITIVE[timestamp.month0() as usize];
    format!(
        "{} {} {} г., {:02}:{:02}",
        timestamp.day(),
        month,
        timestamp.year(),
        timestamp.hour(),
        timestamp.minute()
    )
}

/// 既定のファイル名（xray-report-YYYY-MM-DD.pdf）
pub fn report_file_name<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("xray-report-{}.pdf", timestamp.format("%Y-%m-%d"))
}

/// 出力先がディレクトリ（または拡張子なし）なら既定のファイル名を付ける
pub fn report_output_path(output: &Path, file_name: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(file_name)
    } else {
        output.to_path_buf()
    }
}

/// オプションからレポート内容を組み立てる
pub fn build_report_content(options: &PdfReportOptions<'_>) -> ReportContent {
    let date = format_report_date(&options.timestamp);
    let local_image = options
        .local_image
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());

    ReportContent::build(
        options.result,
        options.patient_name.as_deref(),
        &date,
        &options.base_url,
        &local_image,
    )
}

/// レポート内容を組み立ててPDFを出力
///
/// フォントが見つからない場合は画像取得の前にエラーを返す。
///
/// # Returns
/// 出力したPDFのパス
pub async fn generate_pdf_report(
    options: &PdfReportOptions<'_>,
    http: &reqwest::Client,
    output: &Path,
) -> Result<PathBuf> {
    let font = fonts::resolve_font(options.font_path.as_deref(), &fonts::font_candidates())?;
    let content = build_report_content(options);
    let images = images::load_report_images(http, &content, options.local_image.as_deref()).await;

    let output_path = report_output_path(output, &report_file_name(&options.timestamp));
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    pdf::generate_pdf(&content, &images, &output_path, &font)?;
    Ok(output_path)
}
