//! ログ初期化
//!
//! tracing のサブスクライバを stderr に設定する。
//! `RUST_LOG` があればそれを優先し、なければ `--verbose` の有無で既定レベルを決める。

use crate::error::{XrayScanError, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "warn,xray_scan=debug,xray_scan_common=debug";

/// 既定のフィルタ文字列
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| XrayScanError::Logging(e.to_string()))
}
