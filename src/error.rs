// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// ルート定義の読み込み・解析で発生するエラー
///
/// 平坦化そのものは失敗しないため、ここに並ぶのは入力側 (JSON / ソースファイル / ディレクトリ探索) のエラーのみ。
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SWC がソースを構文解析できなかった
    #[error("parse error in {}: {message}", .file.display())]
    Parse { file: PathBuf, message: String },

    /// component / components / redirect のうち 2 つ以上が指定されている
    #[error("route '{path}' defines more than one of component, components, redirect ({})", .fields.join(", "))]
    ConflictingRenderSpec {
        path: String,
        fields: Vec<&'static str>,
    },

    #[error("{}: {source}", .file.display())]
    InFile {
        file: PathBuf,
        #[source]
        source: Box<RouteError>,
    },
}

impl RouteError {
    /// エラーに発生元ファイルの情報を付与する
    pub fn in_file(self, file: impl Into<PathBuf>) -> Self {
        match self {
            // Parse は既にファイル名を持っている
            err @ RouteError::Parse { .. } => err,
            err @ RouteError::InFile { .. } => err,
            other => RouteError::InFile {
                file: file.into(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
