//! HDR 輝度テストバー
//!
//! 縦に並んだバーを開始輝度から終了輝度まで線形に変化させ、各バーに
//! 輝度ラベルを重ねて描画する。出力は HDR10 (PQ / BT.2020, 10bit) と
//! scRGB (リニア / BT.709, FP16) を切り替えられる。

pub mod cli;
pub mod common;
pub mod display;
pub mod error;
pub mod snapshot;

pub use error::{DisplayWarning, PatternError};
