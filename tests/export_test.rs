//! PDFレポート出力の統合テスト

use chrono::Local;
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use xray_scan::export::fonts::discover_system_font;
use xray_scan::export::{generate_pdf_report, PdfReportOptions};
use xray_scan_common::{fallback_result, AnalysisResult, DataPoint};

fn pathology_result() -> AnalysisResult {
    AnalysisResult {
        conclusion: "Заключение: признаки пневмонии в нижней доле правого легкого".to_string(),
        details: "Инфильтрация".to_string(),
        confidence: 81,
        data_points: vec![
            DataPoint::new("Пневмония", 81),
            DataPoint::new("Норма", 12),
            DataPoint::new("Туберкулез", 7),
        ],
        has_abnormality: true,
        heatmap_url: Some("/static/heatmap_1.png".to_string()),
        original_url: Some("/static/original_1.png".to_string()),
    }
}

/// 画像URLなしの解析結果（ネットワークに触れない）
fn pathology_without_images() -> AnalysisResult {
    AnalysisResult {
        heatmap_url: None,
        original_url: None,
        ..pathology_result()
    }
}

fn system_font() -> Option<PathBuf> {
    let font = discover_system_font();
    if font.is_none() {
        eprintln!("Cyrillic TTF not found; skipping PDF rendering test");
    }
    font
}

fn options<'a>(result: &'a AnalysisResult, font: &Path) -> PdfReportOptions<'a> {
    PdfReportOptions {
        result,
        local_image: None,
        base_url: "http://localhost:8000".to_string(),
        patient_name: Some("Test Patient".to_string()),
        timestamp: Local::now(),
        font_path: Some(font.to_path_buf()),
    }
}

fn http() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([120, 120, 120]),
    ));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// 同じグリフを共有する文字（ToUnicodeでは1文字にしか戻らない）をASCIIに寄せる
fn fold(ch: char) -> char {
    match ch {
        '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
        '\u{00AD}' | '\u{2010}' | '\u{2011}' | '\u{2212}' => '-',
        other => other,
    }
}

/// PDFのテキストを抽出
///
/// 埋め込みTTFのテキストはグリフIDで書かれるため、ToUnicode CMap の
/// `<gid> <unicode>` 対応表で文字に戻す。Tj 1回につき1行。
fn extract_text(path: &Path) -> String {
    let doc = Document::load(path).expect("PDFを読み込めない");

    let mut glyphs = HashMap::<u16, char>::new();
    for object in doc.objects.values() {
        let Ok(stream) = object.as_stream() else { continue };
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let text = String::from_utf8_lossy(&data);
        if !text.contains("beginbfchar") {
            continue;
        }
        for line in text.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [gid, unicode] = parts.as_slice() else { continue };
            let hex = |s: &str| s.trim_start_matches('<').trim_end_matches('>').to_string();
            let (Ok(gid), Ok(code)) = (
                u16::from_str_radix(&hex(gid), 16),
                u32::from_str_radix(&hex(unicode), 16),
            ) else {
                continue;
            };
            if let Some(ch) = char::from_u32(code) {
                glyphs.insert(gid, fold(ch));
            }
        }
    }

    let mut out = String::new();
    for page_id in doc.get_pages().values() {
        let content = doc.get_page_content(*page_id).unwrap();
        let content = Content::decode(&content).unwrap();
        for operation in content.operations.iter().filter(|op| op.operator == "Tj") {
            for operand in &operation.operands {
                if let Object::String(bytes, _) = operand {
                    for pair in bytes.chunks_exact(2) {
                        let gid = u16::from_be_bytes([pair[0], pair[1]]);
                        if let Some(ch) = glyphs.get(&gid) {
                            out.push(*ch);
                        }
                    }
                }
            }
            out.push('\n');
        }
    }
    out
}

/// PDF内の画像XObjectの数
fn count_images(path: &Path) -> usize {
    let doc = Document::load(path).expect("PDFを読み込めない");
    doc.objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| {
            stream.dict.get(b"Subtype").and_then(|v| v.as_name_str()).ok() == Some("Image")
        })
        .count()
}

/// 画像を返すローカルHTTPスタブ。受け取ったリクエスト行を記録する
async fn spawn_image_stub(body: Vec<u8>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = requests.clone();
    let body = Arc::new(body);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let captured = captured.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                if let Some(line) = request.lines().next() {
                    captured.lock().unwrap().push(line.to_string());
                }

                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), requests)
}

/// 接続を拒否するURL
async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_pdf_report_contains_report_text() {
    let Some(font) = system_font() else { return };
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("report.pdf");
    let result = pathology_without_images();

    let path = generate_pdf_report(&options(&result, &font), &http(), &output)
        .await
        .expect("PDF生成に失敗");
    assert_eq!(path, output);

    let text = extract_text(&path);
    assert!(text.contains("Aura X-Ray Scan"), "text = {}", text);
    assert!(text.contains("Данные пациента"), "text = {}", text);
    assert!(text.contains("Test Patient"), "text = {}", text);
    assert!(
        text.contains("Заключение: признаки пневмонии в нижней доле правого легкого"),
        "text = {}",
        text
    );
    assert!(text.contains("Параметры анализа"), "text = {}", text);
    assert!(text.contains("Пневмония"), "text = {}", text);
    assert!(text.contains("Туберкулез"), "text = {}", text);
    assert!(text.contains("81%"), "text = {}", text);
}

#[tokio::test]
async fn test_pdf_report_for_fallback_result() {
    let Some(font) = system_font() else { return };
    let dir = tempdir().expect("Failed to create temp dir");
    let result = fallback_result();
    let mut options = options(&result, &font);
    options.patient_name = None;

    let path = generate_pdf_report(&options, &http(), dir.path())
        .await
        .expect("PDF生成に失敗");
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));

    let text = extract_text(&path);
    assert!(text.contains("Не указан"), "text = {}", text);
    assert!(text.contains("Чистые легкие"), "text = {}", text);
    assert!(text.contains("94%"), "text = {}", text);
    assert!(text.contains("AuraX-Ray Scan v1.0"), "text = {}", text);
}

#[tokio::test]
async fn test_api_images_are_fetched_and_embedded() {
    let Some(font) = system_font() else { return };
    let dir = tempdir().expect("Failed to create temp dir");
    let (base_url, requests) = spawn_image_stub(png_bytes(120, 160)).await;
    let result = pathology_result();
    let mut options = options(&result, &font);
    options.base_url = base_url;

    let path = generate_pdf_report(&options, &http(), &dir.path().join("images.pdf"))
        .await
        .expect("PDF生成に失敗");

    assert_eq!(count_images(&path), 2);
    let requests = requests.lock().unwrap().clone();
    assert!(requests.contains(&"GET /static/original_1.png HTTP/1.1".to_string()), "{:?}", requests);
    assert!(requests.contains(&"GET /static/heatmap_1.png HTTP/1.1".to_string()), "{:?}", requests);
}

#[tokio::test]
async fn test_unreachable_api_images_fall_back_to_local_image() {
    let Some(font) = system_font() else { return };
    let dir = tempdir().expect("Failed to create temp dir");
    let local = dir.path().join("chest.png");
    std::fs::write(&local, png_bytes(100, 100)).unwrap();

    let result = pathology_result();
    let mut options = options(&result, &font);
    options.base_url = refused_url().await;
    options.local_image = Some(local);

    let path = generate_pdf_report(&options, &http(), &dir.path().join("local.pdf"))
        .await
        .expect("PDF生成に失敗");
    assert_eq!(count_images(&path), 2);
}

#[tokio::test]
async fn test_missing_image_keeps_text_reference() {
    let Some(font) = system_font() else { return };
    let dir = tempdir().expect("Failed to create temp dir");
    let result = fallback_result();
    let mut options = options(&result, &font);
    options.local_image = Some(dir.path().join("missing.png"));

    let path = generate_pdf_report(&options, &http(), &dir.path().join("noimage.pdf"))
        .await
        .expect("PDF生成に失敗");

    assert_eq!(count_images(&path), 0);
    let text = extract_text(&path);
    assert!(text.contains("Оригинальный снимок"), "text = {}", text);
    assert!(text.contains("missing.png"), "text = {}", text);
}

#[tokio::test]
async fn test_pdf_report_creates_missing_directory() {
    let Some(font) = system_font() else { return };
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("reports").join("2026").join("scan.pdf");
    let result = fallback_result();

    let path = generate_pdf_report(&options(&result, &font), &http(), &output)
        .await
        .expect("PDF生成に失敗");
    assert!(path.exists());
}

/// 保存した解析結果JSON（出所ラベル付き）から読み戻せること
#[test]
fn test_saved_result_json_is_readable() {
    let result = pathology_result();
    let mut json = serde_json::to_value(&result).unwrap();
    json["source"] = serde_json::Value::String("api".to_string());

    let restored: AnalysisResult = serde_json::from_value(json).unwrap();
    assert_eq!(restored, result);
}
