//! PDFレポート生成
//!
//! ReportContent を上から順にA4縦ページへ描画する。
//! 内容がページに収まらない場合は自動で改ページする。

use super::layout::*;
use crate::error::{XrayScanError, Result};
use printpdf::image_crate::{self, DynamicImage};
use printpdf::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use xray_scan_common::report::{
    ReportContent, HEADING_CONCLUSION, HEADING_CONFIDENCE, HEADING_METRICS, HEADING_PATIENT,
};

const LAYER_NAME: &str = "Layer 1";

/// 枠に合わせて縮小済みの画像
struct PlacedImage {
    image: DynamicImage,
    width_mm: f32,
    height_mm: f32,
    scale: f32,
}

/// 画像データをデコードして列幅に収める（失敗時は None）
fn place_image(bytes: &[u8]) -> Option<PlacedImage> {
    match image_crate::load_from_memory(bytes) {
        Ok(decoded) => {
            let rgb = decoded.to_rgb8();
            let (width_mm, height_mm, scale) =
                fit_image_mm(rgb.width(), rgb.height(), COLUMN_WIDTH_MM, IMAGE_MAX_HEIGHT_MM);
            Some(PlacedImage {
                image: DynamicImage::ImageRgb8(rgb),
                width_mm,
                height_mm,
                scale,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "画像をデコードできません");
            None
        }
    }
}

/// 描画位置を管理しながらページを追加するライター
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    /// 現在のY座標（mm、下から）
    y: f32,
    pages: usize,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference, font: &'a IndirectFontRef) -> Self {
        Self {
            doc,
            layer,
            font,
            y: A4_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        }
    }

    /// 残り高さが足りなければ改ページ
    fn ensure_space(&mut self, height_mm: f32) {
        if self.y - height_mm >= MARGIN_MM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = A4_HEIGHT_MM - MARGIN_MM;
        self.pages += 1;
        tracing::debug!(page = self.pages, "改ページ");
    }

    fn advance(&mut self, height_mm: f32) {
        self.y -= height_mm;
    }

    fn set_fill(&self, (r, g, b): (f32, f32, f32)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    /// 現在行のベースラインにテキストを置く
    fn text_at(&self, text: &str, size: f32, x_mm: f32, color: (f32, f32, f32)) {
        self.set_fill(color);
        let baseline = self.y - size * PT_TO_MM;
        self.layer.use_text(text, size, Mm(x_mm), Mm(baseline), self.font);
    }

    fn rect(&self, x_mm: f32, top_mm: f32, width_mm: f32, height_mm: f32, color: (f32, f32, f32)) {
        self.set_fill(color);
        let rect = Rect::new(
            Mm(x_mm),
            Mm(top_mm - height_mm),
            Mm(x_mm + width_mm),
            Mm(top_mm),
        );
        self.layer.add_rect(rect);
    }

    /// 左上を (x_mm, top_mm) に合わせて画像を配置
    fn image(&self, placed: &PlacedImage, x_mm: f32, top_mm: f32) {
        Image::from_dynamic_image(&placed.image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x_mm)),
                translate_y: Some(Mm(top_mm - placed.height_mm)),
                scale_x: Some(placed.scale),
                scale_y: Some(placed.scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    fn rule(&mut self) {
        self.ensure_space(SECTION_GAP_MM);
        let y = self.y - SECTION_GAP_MM / 2.0;
        let (r, g, b) = RULE_COLOR;
        self.layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), Mm(y)), false),
                (Point::new(Mm(A4_WIDTH_MM - MARGIN_MM), Mm(y)), false),
            ],
            is_closed: false,
        });
        self.advance(SECTION_GAP_MM);
    }

    fn heading(&mut self, text: &str) {
        let height = line_height_mm(HEADING_SIZE);
        // 見出しだけがページ末尾に残らないよう本文1行分も確保
        self.ensure_space(height + line_height_mm(BODY_SIZE));
        self.text_at(text, HEADING_SIZE, MARGIN_MM, TEXT_COLOR);
        self.advance(height);
    }

    /// 折り返し済みの段落を描画（行ごとに改ページ判定）
    fn paragraph(&mut self, text: &str, size: f32, x_mm: f32, width_mm: f32, color: (f32, f32, f32)) {
        let height = line_height_mm(size);
        for line in wrap_text(text, chars_per_line(width_mm, size)) {
            self.ensure_space(height);
            if !line.is_empty() {
                self.text_at(&line, size, x_mm, color);
            }
            self.advance(height);
        }
    }

    /// 背景付きの段落（背景はページ内に収まる行ごとに描く）
    fn panel(&mut self, text: &str, size: f32, background: (f32, f32, f32)) {
        const PADDING_MM: f32 = 2.5;
        let height = line_height_mm(size);
        let inner_width = USABLE_WIDTH_MM - PADDING_MM * 2.0;

        self.ensure_space(height + PADDING_MM * 2.0);
        self.rect(MARGIN_MM, self.y, USABLE_WIDTH_MM, PADDING_MM, background);
        self.advance(PADDING_MM);

        for line in wrap_text(text, chars_per_line(inner_width, size)) {
            self.ensure_space(height + PADDING_MM);
            self.rect(MARGIN_MM, self.y, USABLE_WIDTH_MM, height, background);
            if !line.is_empty() {
                self.text_at(&line, size, MARGIN_MM + PADDING_MM, TEXT_COLOR);
            }
            self.advance(height);
        }

        self.rect(MARGIN_MM, self.y, USABLE_WIDTH_MM, PADDING_MM, background);
        self.advance(PADDING_MM);
    }

    fn gap(&mut self) {
        self.advance(SECTION_GAP_MM);
    }
}

/// レポートPDFを生成
///
/// # Arguments
/// * `content` - レポート内容
/// * `images` - `content.images` と同じ順の画像データ（None・デコード失敗時は参照先を文字で表示）
/// * `output_path` - 出力先PDFファイル
/// * `font_path` - キリル文字対応のTTFフォント
///
/// # Returns
/// 生成したページ数
pub fn generate_pdf(
    content: &ReportContent,
    images: &[Option<Vec<u8>>],
    output_path: &Path,
    font_path: &Path,
) -> Result<usize> {
    let (doc, page1, layer1) = PdfDocument::new(
        content.title,
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        LAYER_NAME,
    );

    let file = File::open(font_path).map_err(|e| {
        XrayScanError::PdfGeneration(format!("フォント読み込みエラー: {}: {}", font_path.display(), e))
    })?;
    let font = doc
        .add_external_font(file)
        .map_err(|e| XrayScanError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?;

    let placed: Vec<Option<PlacedImage>> = (0..content.images.len())
        .map(|i| images.get(i).and_then(|bytes| bytes.as_deref()).and_then(place_image))
        .collect();

    let layer = doc.get_page(page1).get_layer(layer1);
    let mut writer = PageWriter::new(&doc, layer, &font);

    draw_report(&mut writer, content, &placed);
    let pages = writer.pages;

    let file = File::create(output_path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| XrayScanError::PdfGeneration(format!("PDF保存エラー: {:?}", e)))?;

    tracing::info!(path = %output_path.display(), pages, "PDFレポートを保存");
    Ok(pages)
}

fn draw_report(w: &mut PageWriter<'_>, content: &ReportContent, placed: &[Option<PlacedImage>]) {
    // ヘッダー: タイトル + 日時
    let title_height = line_height_mm(TITLE_SIZE);
    w.text_at(content.title, TITLE_SIZE, MARGIN_MM, TITLE_COLOR);
    let date_x = A4_WIDTH_MM - MARGIN_MM - text_width_mm(&content.date, BODY_SIZE);
    w.text_at(&content.date, BODY_SIZE, date_x.max(MARGIN_MM), MUTED_COLOR);
    w.advance(title_height);
    w.rule();

    // 患者情報
    w.heading(HEADING_PATIENT);
    w.panel(&content.patient_name, BODY_SIZE, PANEL_COLOR);
    w.gap();

    // 画像（2列: キャプション + 画像。画像がなければ参照先を文字で）
    let caption_height = line_height_mm(BODY_SIZE);
    let source_lines: Vec<Vec<String>> = content
        .images
        .iter()
        .map(|image| wrap_text(&image.source, chars_per_line(COLUMN_WIDTH_MM, SMALL_SIZE)))
        .collect();
    let body_height = placed
        .iter()
        .zip(&source_lines)
        .map(|(placed, lines)| match placed {
            Some(placed) => placed.height_mm,
            None => lines.len() as f32 * line_height_mm(SMALL_SIZE),
        })
        .fold(0.0_f32, f32::max);
    w.ensure_space(caption_height + body_height);

    let top = w.y;
    for (column, (image, lines)) in content.images.iter().zip(&source_lines).enumerate() {
        let x = MARGIN_MM + column as f32 * (COLUMN_WIDTH_MM + COLUMN_GAP_MM);
        w.y = top;
        w.text_at(image.caption, BODY_SIZE, x, TEXT_COLOR);
        w.advance(caption_height);
        match placed.get(column).and_then(Option::as_ref) {
            Some(placed) => {
                // 列内で中央寄せ
                let offset = (COLUMN_WIDTH_MM - placed.width_mm) / 2.0;
                w.image(placed, x + offset.max(0.0), w.y);
            }
            None => {
                for line in lines {
                    w.text_at(line, SMALL_SIZE, x, MUTED_COLOR);
                    w.advance(line_height_mm(SMALL_SIZE));
                }
            }
        }
    }
    w.y = top - caption_height - body_height;
    w.gap();

    // 所見
    w.heading(HEADING_CONCLUSION);
    let background = if content.has_abnormality { ABNORMAL_PANEL_COLOR } else { NORMAL_PANEL_COLOR };
    w.panel(&content.conclusion, BODY_SIZE, background);
    w.gap();

    // 確信度バー
    w.heading(HEADING_CONFIDENCE);
    let bar_row = line_height_mm(BODY_SIZE);
    w.ensure_space(bar_row);
    let bar_top = w.y - (bar_row - BAR_HEIGHT_MM) / 2.0;
    w.rect(MARGIN_MM, bar_top, BAR_WIDTH_MM, BAR_HEIGHT_MM, RULE_COLOR);
    let filled = BAR_WIDTH_MM * content.confidence_ratio();
    if filled > 0.0 {
        let color = if content.has_abnormality { ABNORMAL_BAR_COLOR } else { NORMAL_BAR_COLOR };
        w.rect(MARGIN_MM, bar_top, filled, BAR_HEIGHT_MM, color);
    }
    w.text_at(&content.confidence_label(), BODY_SIZE, MARGIN_MM + BAR_WIDTH_MM + 3.0, TEXT_COLOR);
    w.advance(bar_row);
    w.gap();

    // パラメータ（2列グリッド）
    w.heading(HEADING_METRICS);
    let cell_height = line_height_mm(BODY_SIZE) * 2.0 + 2.0;
    for row in content.metric_rows() {
        w.ensure_space(cell_height);
        let top = w.y;
        for (column, metric) in row.iter().enumerate() {
            let x = MARGIN_MM + column as f32 * (COLUMN_WIDTH_MM + COLUMN_GAP_MM);
            w.rect(x, top, COLUMN_WIDTH_MM, cell_height - 1.0, PANEL_COLOR);
            w.y = top - 0.5;
            let label_width = chars_per_line(COLUMN_WIDTH_MM - 4.0, BODY_SIZE);
            let label: String = metric.label.chars().take(label_width).collect();
            w.text_at(&label, BODY_SIZE, x + 2.0, TEXT_COLOR);
            w.advance(line_height_mm(BODY_SIZE));
            w.text_at(&metric.value, BODY_SIZE, x + 2.0, MUTED_COLOR);
        }
        w.y = top - cell_height;
    }

    // フッター
    w.rule();
    w.paragraph(content.footer, SMALL_SIZE, MARGIN_MM, USABLE_WIDTH_MM, MUTED_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fonts::discover_system_font;
    use std::io::Cursor;
    use tempfile::tempdir;
    use xray_scan_common::{fallback_result, AnalysisResult, DataPoint};

    fn content_for(result: &AnalysisResult) -> ReportContent {
        ReportContent::build(result, Some("Test Patient"), "17.10.2026 14:05", "http://localhost", "scan.png")
    }

    fn system_font() -> Option<std::path::PathBuf> {
        let font = discover_system_font();
        if font.is_none() {
            eprintln!("Cyrillic TTF not found; skipping PDF rendering test");
        }
        font
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(image_crate::RgbImage::from_pixel(
            width,
            height,
            image_crate::Rgb([90, 90, 90]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image_crate::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    /// PDF内の画像XObjectの数
    fn count_images(path: &Path) -> usize {
        let doc = ::lopdf::Document::load(path).unwrap();
        doc.objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream.dict.get(b"Subtype").and_then(|v| v.as_name_str()).ok() == Some("Image")
            })
            .count()
    }

    #[test]
    fn test_generate_single_page_report() {
        let Some(font) = system_font() else { return };
        let dir = tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("report.pdf");

        let pages = generate_pdf(&content_for(&fallback_result()), &[], &output, &font).unwrap();
        assert_eq!(pages, 1);

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(count_images(&output), 0);
    }

    #[test]
    fn test_images_are_embedded() {
        let Some(font) = system_font() else { return };
        let dir = tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("images.pdf");
        let images = vec![Some(png_bytes(60, 80)), Some(png_bytes(80, 60))];

        let pages = generate_pdf(&content_for(&fallback_result()), &images, &output, &font).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(count_images(&output), 2);
    }

    #[test]
    fn test_undecodable_image_falls_back_to_caption() {
        let Some(font) = system_font() else { return };
        let dir = tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("broken.pdf");
        let images = vec![Some(b"not an image".to_vec()), Some(png_bytes(40, 40))];

        generate_pdf(&content_for(&fallback_result()), &images, &output, &font).unwrap();
        assert_eq!(count_images(&output), 1);
    }

    #[test]
    fn test_long_report_is_paginated() {
        let Some(font) = system_font() else { return };
        let dir = tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("long.pdf");

        let result = AnalysisResult {
            conclusion: "Заключение: ".to_string() + &"очень длинный текст ".repeat(400),
            confidence: 73,
            has_abnormality: true,
            data_points: (0..40).map(|i| DataPoint::new(format!("Параметр {}", i), i)).collect(),
            ..Default::default()
        };

        let pages = generate_pdf(&content_for(&result), &[], &output, &font).unwrap();
        assert!(pages > 1, "pages = {}", pages);
        assert!(output.exists());
    }

    #[test]
    fn test_missing_font_is_pdf_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("report.pdf");
        let font = dir.path().join("missing.ttf");

        let err = generate_pdf(&content_for(&fallback_result()), &[], &output, &font).unwrap_err();
        assert!(matches!(err, XrayScanError::PdfGeneration(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_place_image_rejects_garbage() {
        assert!(place_image(b"garbage").is_none());
        let placed = place_image(&png_bytes(300, 600)).unwrap();
        assert!((placed.height_mm - IMAGE_MAX_HEIGHT_MM).abs() < 0.01);
        assert!(placed.width_mm <= COLUMN_WIDTH_MM);
    }
}
