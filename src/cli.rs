use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xray-scan")]
#[command(about = "胸部X線画像AI解析・PDFレポート生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// X線画像を解析APIに送信して結果を表示
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 解析結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDFレポートも出力（パス省略時はカレントディレクトリ）
        #[arg(long, num_args = 0..=1, default_missing_value = ".")]
        pdf: Option<PathBuf>,

        /// 患者名（PDFレポート用）
        #[arg(short, long)]
        patient: Option<String>,

        /// 個人データ処理への同意を確認なしで記録
        #[arg(long)]
        accept_consent: bool,
    },

    /// 保存済みの解析結果JSONからPDFレポートを生成
    Export {
        /// 解析結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 患者名
        #[arg(short, long)]
        patient: Option<String>,

        /// 元画像ファイル（APIに画像URLがない場合に使用）
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// 解析APIの疎通確認
    Check,

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// APIのベースURLをデフォルトに戻す
        #[arg(long)]
        reset_api_url: bool,

        /// PDF用のTTFフォントを設定
        #[arg(long)]
        set_font: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// 個人データ処理への同意を管理
    Consent {
        /// 同意する
        #[arg(long, conflicts_with_all = ["reject", "reset"])]
        accept: bool,

        /// 拒否する
        #[arg(long, conflicts_with = "reset")]
        reject: bool,

        /// 未回答に戻す
        #[arg(long)]
        reset: bool,

        /// 状態を表示
        #[arg(long)]
        show: bool,
    },
}

impl Commands {
    /// analyze が結果（JSON/PDF）をファイルに保存するか
    pub fn saves_analysis(&self) -> bool {
        matches!(self, Commands::Analyze { output, pdf, .. } if output.is_some() || pdf.is_some())
    }
}
