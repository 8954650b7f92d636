use xray_scan_common::AnalysisResult;

/// 解析失敗の分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 接続・DNS・送受信エラー
    Transport(String),
    Timeout,
    HttpStatus(u16),
    MalformedJson(String),
    /// レスポンスに details が1件もない
    EmptyDetails,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Transport(msg) => write!(f, "通信エラー: {}", msg),
            FailureReason::Timeout => write!(f, "タイムアウト"),
            FailureReason::HttpStatus(code) => write!(f, "HTTPステータス {}", code),
            FailureReason::MalformedJson(msg) => write!(f, "不正なJSON: {}", msg),
            FailureReason::EmptyDetails => write!(f, "details が空"),
        }
    }
}

/// 解析結果の出所
///
/// 外部には同じ AnalysisResult として見せるが、表示側が
/// フォールバックであることを明示できるよう区別して保持する。
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// APIの解析結果
    Analyzed(AnalysisResult),
    /// ローカルの固定結果
    Fallback {
        result: AnalysisResult,
        reason: FailureReason,
    },
}

impl AnalysisOutcome {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            AnalysisOutcome::Analyzed(result) => result,
            AnalysisOutcome::Fallback { result, .. } => result,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            AnalysisOutcome::Analyzed(result) => result,
            AnalysisOutcome::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisOutcome::Fallback { .. })
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            AnalysisOutcome::Analyzed(_) => None,
            AnalysisOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    /// JSON出力用の出所ラベル
    pub fn source_label(&self) -> &'static str {
        if self.is_fallback() {
            "fallback"
        } else {
            "api"
        }
    }
}
