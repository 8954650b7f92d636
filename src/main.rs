use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use xray_scan::{cli, client, config, consent, error, export, logging, upload};
use xray_scan_common::AnalysisResult;
use cli::{Cli, Commands};
use config::ConfigStore;
use consent::{ConsentState, ConsentStore};
use error::{Result, XrayScanError};

const CONSENT_TEXT: &str = "\
Настоящим я даю согласие на обработку моих персональных данных владельцу сервиса AuraX-Ray Scan.
Цель обработки: анализ медицинских изображений и предоставление результатов анализа.
Перечень данных: загруженные рентгеновские изображения, результаты анализа, метаданные изображений.
Анализ изображений осуществляется на сервере, сервер не осуществляет хранение данных.";

/// 解析結果JSON（出所ラベル付き）
#[derive(Serialize)]
struct SavedAnalysis<'a> {
    source: &'static str,
    #[serde(flatten)]
    result: &'a AnalysisResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let store = ConfigStore::open_default()?;
    let saves_analysis = cli.command.saves_analysis();

    match cli.command {
        Commands::Analyze { image, output, pdf, patient, accept_consent } => {
            println!("🩻 xray-scan - X線画像解析\n");

            // 1. 同意確認
            let consent = ConsentStore::open_default()?;
            ensure_consent(&consent, accept_consent)?;

            // 2. 画像読み込み
            println!("[1/3] 画像を読み込み中...");
            let upload = upload::ImageUpload::from_path(&image)?;
            println!("✔ {} ({} bytes, {})\n", upload.file_name, upload.len(), upload.mime_type);

            // 3. 解析
            println!("[2/3] AI解析中...");
            let client = client::XrayClient::new(store.clone())?;
            let spinner = spinner("解析サーバーの応答を待っています...");
            let outcome = client.submit_for_analysis(&upload).await;
            spinner.finish_and_clear();

            if let Some(reason) = outcome.failure_reason() {
                println!("⚠ APIを利用できません（{}）。ローカルのテストデータを表示します\n", reason);
            } else {
                println!("✔ 解析完了\n");
            }
            print_result(outcome.result());

            // 4. 保存
            if saves_analysis {
                println!("\n[3/3] 結果を保存中...");
            }
            if let Some(output) = output {
                let saved = SavedAnalysis {
                    source: outcome.source_label(),
                    result: outcome.result(),
                };
                let json = serde_json::to_string_pretty(&saved)?;
                std::fs::write(&output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            if let Some(pdf_output) = pdf {
                let path =
                    export_report(&client, outcome.result(), &pdf_output, patient, Some(&image)).await?;
                println!("✔ PDF出力: {}", path.display());
            }

            println!("\n✅ 完了");
        }

        Commands::Export { input, output, patient, image } => {
            println!("📄 xray-scan - PDFレポート\n");

            let content = std::fs::read_to_string(&input)?;
            let result: AnalysisResult = serde_json::from_str(&content)?;

            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            println!("- PDFを生成中...");
            let client = client::XrayClient::new(store.clone())?;
            let path = export_report(&client, &result, &output_dir, patient, image.as_deref()).await?;
            println!("✔ PDF出力: {}", path.display());

            println!("\n✅ エクスポート完了");
        }

        Commands::Check => {
            let client = client::XrayClient::new(store.clone())?;
            let url = client.api_config().health_url();
            println!("- 疎通確認中: {}", url);

            if client.check_availability().await {
                println!("✔ API доступен");
            } else {
                println!("✖ API недоступен. Будут использованы локальные данные.");
            }
        }

        Commands::Config { set_api_url, reset_api_url, set_font, show } => {
            if let Some(url) = set_api_url {
                store.set_api_url(&url)?;
                println!("✔ APIのURLを設定しました");

                // 保存後に疎通確認
                let client = client::XrayClient::new(store.clone())?;
                if client.check_availability().await {
                    println!("✔ API доступен");
                } else {
                    println!("✖ API недоступен. Будут использованы локальные данные.");
                }
            }

            if reset_api_url {
                store.reset_api_url()?;
                println!("✔ APIのURLをデフォルトに戻しました");
            }

            if let Some(font) = set_font {
                store.set_font_path(&font)?;
                println!("✔ フォントを設定しました");
            }

            if show {
                let config = store.load()?;
                println!("設定:");
                println!("  ファイル: {}", store.path().display());
                println!("  API URL: {}", store.effective_base_url());
                if std::env::var(config::API_URL_ENV).is_ok() {
                    println!("    ({} で上書き中)", config::API_URL_ENV);
                }
                let font = match (&config.font_path, export::fonts::discover_system_font()) {
                    (Some(path), _) => path.display().to_string(),
                    (None, Some(found)) => format!("{}（自動検出）", found.display()),
                    (None, None) => "未検出（--set-font で指定してください）".to_string(),
                };
                println!("  フォント: {}", font);
            }
        }

        Commands::Consent { accept, reject, reset, show } => {
            let consent = ConsentStore::open_default()?;

            if accept {
                consent.accept()?;
                println!("✔ Согласие принято");
            }
            if reject {
                consent.reject()?;
                println!("✔ Согласие отклонено");
            }
            if reset {
                match consent.reset()? {
                    true => println!("✔ 同意状態をリセットしました"),
                    false => println!("同意状態は未回答です"),
                }
            }
            if show || !(accept || reject || reset) {
                println!("同意状態: {}", consent.state());
            }
        }
    }

    Ok(())
}

/// 同意状態を確認し、未回答なら対話的に確認する
fn ensure_consent(store: &ConsentStore, accept_flag: bool) -> Result<()> {
    if accept_flag {
        return store.accept();
    }

    match store.state() {
        ConsentState::Accepted => Ok(()),
        ConsentState::Rejected => Err(XrayScanError::ConsentRejected),
        ConsentState::Unset => {
            println!("Согласие на обработку персональных данных\n");
            println!("{}\n", CONSENT_TEXT);

            let accepted = Confirm::new()
                .with_prompt("Принимаю условия")
                .default(false)
                .interact()
                .map_err(|e| XrayScanError::Config(format!("入力エラー: {}", e)))?;

            store.record(accepted)?;
            if accepted {
                Ok(())
            } else {
                Err(XrayScanError::ConsentRejected)
            }
        }
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_result(result: &AnalysisResult) {
    let status = if result.has_abnormality { "⚠ 異常所見あり" } else { "✔ 異常所見なし" };
    println!("{}", status);
    println!("{}", result.conclusion.trim());
    println!("確信度: {}%", result.confidence);

    if !result.data_points.is_empty() {
        println!("パラメータ:");
        for point in &result.data_points {
            println!("  {:<30} {:>3}%", point.label, point.percent);
        }
    }
    if !result.details.is_empty() {
        println!("詳細: {}", result.details);
    }
    if let Some(heatmap) = result.heatmap_path() {
        println!("ヒートマップ: {}", heatmap);
    }
}

async fn export_report(
    client: &client::XrayClient<ConfigStore>,
    result: &AnalysisResult,
    output: &Path,
    patient_name: Option<String>,
    local_image: Option<&Path>,
) -> Result<PathBuf> {
    let store = client.source();
    let config = store.load()?;
    let options = export::PdfReportOptions {
        result,
        local_image: local_image.map(Path::to_path_buf),
        base_url: store.effective_base_url(),
        patient_name,
        timestamp: chrono::Local::now(),
        font_path: config.font_path,
    };
    export::generate_pdf_report(&options, client.http_client(), output).await
}
