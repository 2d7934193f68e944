//! 描画・表示を担当するバックエンドの境界

use super::surface::{ColorSpace, SurfaceDescriptor};
use crate::common::config::FrameParams;
use crate::error::PatternError;

/// 表示バックエンド
///
/// 状態遷移の判断は `DisplayPipeline` が行い、バックエンドは
/// 言われた資源の作成・破棄と描画だけを行う。
pub trait PresentBackend {
    /// デバイスとピクセルプログラムを準備し、パラメータブロックを確保する
    fn initialize(&mut self) -> Result<(), PatternError>;

    /// 描画先クライアント領域のサイズ
    fn client_size(&self) -> (u32, u32);

    /// 接続先ディスプレイが宣言している色空間（分からなければ `None`）
    fn output_color_space(&self) -> Option<ColorSpace>;

    /// 記述どおりのサーフェスを作る（既存のものは置き換える）
    fn create_surface(&mut self, desc: &SurfaceDescriptor) -> Result<(), PatternError>;

    /// 既存サーフェスのサイズだけを変える
    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), PatternError>;

    /// 現在のバックバッファに対するビューを作る
    fn create_view(&mut self) -> Result<(), PatternError>;

    fn release_view(&mut self);

    fn release_surface(&mut self);

    /// パラメータを書き込み、黒でクリアして全画面三角形を描画し、表示する
    fn draw(&mut self, params: &FrameParams) -> Result<(), PatternError>;

    /// デバイス側の資源をすべて解放する
    fn shutdown(&mut self);
}
