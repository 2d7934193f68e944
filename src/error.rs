//! エラーと警告

use thiserror::Error;

use crate::display::{ColorSpace, SurfaceFormat};

/// 表示パイプラインのエラー
#[derive(Debug, Error)]
pub enum PatternError {
    /// デバイス・ピクセルプログラムの準備に失敗（致命的）
    #[error("初期化に失敗しました: {0}")]
    Initialization(String),

    /// モード切替・リサイズでサーフェスを確保できなかった
    #[error("{format} のサーフェス ({width}x{height}) を作成できません: {reason}")]
    SurfaceCreation {
        format: SurfaceFormat,
        width: u32,
        height: u32,
        reason: String,
    },

    /// 描画・表示の失敗（そのフレームは表示されない）
    #[error("フレームの表示に失敗しました: {0}")]
    Present(String),

    #[error("ディスプレイパイプラインが初期化されていません")]
    NotInitialized,

    #[error("スナップショットの保存に失敗しました: {0}")]
    Snapshot(#[from] image::ImageError),
}

/// 致命的ではない警告（描画は続行する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayWarning {
    /// 接続先ディスプレイが期待する HDR 色空間を宣言していない
    UnsupportedDisplay {
        expected: ColorSpace,
        advertised: Option<ColorSpace>,
    },
}

impl std::fmt::Display for DisplayWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayWarning::UnsupportedDisplay {
                expected,
                advertised,
            } => {
                write!(f, "ディスプレイが {expected} を宣言していません (")?;
                match advertised {
                    Some(cs) => write!(f, "現在: {cs}")?,
                    None => write!(f, "現在: 不明")?,
                }
                write!(
                    f,
                    ")。テストパターンは描画されますが、物理的な輝度は正しくない可能性があります"
                )
            }
        }
    }
}
