//! 共通定数

/// フォントの拡大率（グリフ 1 ドット = 4x4 ピクセル）
pub const FONT_SCALE: i32 = 4;
/// グリフの幅（ドット）
pub const GLYPH_WIDTH: i32 = 3;
/// グリフの高さ（ドット）
pub const GLYPH_HEIGHT: i32 = 5;
/// グリフ間のスペース（ドット）
pub const GLYPH_SPACING: i32 = 1;
/// 小数部の桁数（常にこの桁数で表示）
pub const FRACTION_DIGITS: i32 = 5;

/// ラベルの左端 X 座標
pub const LABEL_X: i32 = 10;
/// ラベル背景の幅を決める文字数（多めに確保）
pub const LABEL_CHAR_BUDGET: i32 = 12;
/// ラベル背景の右側余白
pub const LABEL_PADDING: i32 = 20;

/// バー上下端の区切り線の太さ（ピクセル）
pub const SEP_PX: f32 = 2.0;

/// PQ の正規化に使う最大輝度 (cd/m²)
pub const PQ_MAX_NITS: f32 = 10000.0;
/// scRGB で 1.0 に相当する輝度 (cd/m²)
pub const SCRGB_REFERENCE_NITS: f32 = 80.0;

/// 入力として受け付ける輝度の範囲
pub const MIN_NITS: f32 = 0.0;
pub const MAX_NITS: f32 = PQ_MAX_NITS;

/// 入力として受け付けるバー本数の範囲
pub const MIN_BARS: i32 = 2;
pub const MAX_BARS: i32 = 100;

/// 初期値
pub const DEFAULT_START_NITS: f32 = 0.005;
pub const DEFAULT_END_NITS: f32 = 0.00248;
pub const DEFAULT_NUM_BARS: i32 = 20;
pub const DEFAULT_LABEL_NITS: f32 = 5.0;

/// ウィンドウの初期サイズ
pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 800;
