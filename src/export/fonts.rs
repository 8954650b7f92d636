//! PDF用フォントの解決
//!
//! レポートはロシア語で書かれるため、キリル文字を含むTTFが必要。
//! 設定済みのフォントがなければOS標準の場所から探す。

use crate::error::{Result, XrayScanError};
use std::path::{Path, PathBuf};

/// OS標準のフォント候補（キリル文字対応、優先順）
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    // macOS
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// ユーザーフォントディレクトリで探すファイル名
const USER_FONT_FILES: &[&str] = &[
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
    "NotoSans-Regular.ttf",
    "Arial.ttf",
    "arial.ttf",
];

/// 探索対象のフォントパス一覧（ユーザーフォント → システムフォント）
pub fn font_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::font_dir() {
        candidates.extend(USER_FONT_FILES.iter().map(|name| dir.join(name)));
    }
    candidates.extend(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));
    candidates
}

/// 候補のうち最初に存在するファイル
pub fn find_font(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// システムにあるキリル文字対応フォントを探す
pub fn discover_system_font() -> Option<PathBuf> {
    find_font(&font_candidates())
}

/// 使用するフォントを決定
///
/// 設定済みならそれを使う。なければ候補から探し、見つからなければエラー
/// （キリル文字が消えたPDFは出力しない）。
pub fn resolve_font(configured: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    match find_font(candidates) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "システムフォントを使用");
            Ok(path)
        }
        None => Err(XrayScanError::PdfGeneration(
            "キリル文字対応のフォントが見つかりません。`xray-scan config --set-font <TTF>` で指定してください"
                .to_string(),
        )),
    }
}
