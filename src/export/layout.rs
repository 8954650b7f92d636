//! レポートのレイアウト設定
//!
//! mm基準。テキスト幅はフォントメトリクスを使わず文字数から概算する。

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白（mm）
pub const MARGIN_MM: f32 = 15.0;

pub const USABLE_WIDTH_MM: f32 = A4_WIDTH_MM - MARGIN_MM * 2.0; // 180mm

/// 2列配置（画像・パラメータ欄）
pub const COLUMN_GAP_MM: f32 = 6.0;
pub const COLUMN_WIDTH_MM: f32 = (USABLE_WIDTH_MM - COLUMN_GAP_MM) / 2.0; // 87mm

/// 画像枠（列幅 × 最大高さ）
pub const IMAGE_MAX_HEIGHT_MM: f32 = 80.0;
/// 画像の基準解像度（この解像度での実寸から縮小率を決める）
pub const IMAGE_DPI: f32 = 300.0;

/// 確信度バー
pub const BAR_WIDTH_MM: f32 = USABLE_WIDTH_MM * 0.8;
pub const BAR_HEIGHT_MM: f32 = 3.5;

/// フォントサイズ（pt）
pub const TITLE_SIZE: f32 = 22.0;
pub const HEADING_SIZE: f32 = 14.0;
pub const BODY_SIZE: f32 = 11.0;
pub const SMALL_SIZE: f32 = 8.0;

/// 行送り係数（フォントサイズ比）
pub const LINE_SPACING: f32 = 1.35;

/// セクション間の余白（mm）
pub const SECTION_GAP_MM: f32 = 6.0;

/// pt → mm (1pt = 25.4/72 mm)
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// 平均文字幅（フォントサイズ比）
const AVG_CHAR_WIDTH: f32 = 0.5;

/// 背景色・バー色（RGB 0.0-1.0）
pub const TITLE_COLOR: (f32, f32, f32) = (0.263, 0.220, 0.792); // #4338ca
pub const TEXT_COLOR: (f32, f32, f32) = (0.2, 0.2, 0.2);
pub const MUTED_COLOR: (f32, f32, f32) = (0.4, 0.4, 0.4);
pub const RULE_COLOR: (f32, f32, f32) = (0.867, 0.867, 0.867);
pub const PANEL_COLOR: (f32, f32, f32) = (0.969, 0.969, 0.969);
pub const ABNORMAL_PANEL_COLOR: (f32, f32, f32) = (1.0, 0.941, 0.941); // #fff0f0
pub const NORMAL_PANEL_COLOR: (f32, f32, f32) = (0.941, 1.0, 0.941); // #f0fff0
pub const ABNORMAL_BAR_COLOR: (f32, f32, f32) = (0.937, 0.267, 0.267); // #ef4444
pub const NORMAL_BAR_COLOR: (f32, f32, f32) = (0.133, 0.773, 0.369); // #22c55e

/// 1行の高さ（mm）
#[inline]
pub fn line_height_mm(font_size: f32) -> f32 {
    font_size * LINE_SPACING * PT_TO_MM
}

/// 文字列の概算幅（mm）
#[inline]
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_CHAR_WIDTH * PT_TO_MM
}

/// 指定幅に収まる概算文字数
#[inline]
pub fn chars_per_line(width_mm: f32, font_size: f32) -> usize {
    let per_char = font_size * AVG_CHAR_WIDTH * PT_TO_MM;
    ((width_mm / per_char).floor() as usize).max(1)
}

/// 画像を枠に収める（縦横比維持、拡大もする）
///
/// # Returns
/// (幅mm, 高さmm, IMAGE_DPI基準の拡大率)
pub fn fit_image_mm(width_px: u32, height_px: u32, max_width_mm: f32, max_height_mm: f32) -> (f32, f32, f32) {
    let natural_w = width_px.max(1) as f32 * 25.4 / IMAGE_DPI;
    let natural_h = height_px.max(1) as f32 * 25.4 / IMAGE_DPI;
    let scale = (max_width_mm / natural_w).min(max_height_mm / natural_h);
    (natural_w * scale, natural_h * scale, scale)
}

/// 単語単位で折り返す
///
/// 改行は段落区切りとして保持する。1単語が行幅を超える場合は文字単位で分割。
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        lines.push(current);
    }

    // 末尾の空行は出力しない
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
