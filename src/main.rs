//! HDR 輝度テストバー (CPU 版)
//!
//! ピクセルプログラムを Rayon で並列実行し、minifb のウィンドウに
//! エンコード後の値をプレビュー表示する。`--snapshot` を指定すると
//! ウィンドウを開かずに 1 フレームだけ描画して保存する。
//!
//! 操作方法:
//!   - M キー: HDR10 (PQ) / scRGB の切替
//!   - ↑ / ↓ キー: バーの本数を増減
//!   - S キー: 現在のフレームを画像として保存
//!   - Q / Escape キー: 終了

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::warn;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use pq_bars::cli::PatternArgs;
use pq_bars::common::config::TestPatternConfig;
use pq_bars::common::constants::{MAX_BARS, MIN_BARS};
use pq_bars::display::{DisplayPipeline, SoftwareBackend};
use pq_bars::snapshot::{save_framebuffer, snapshot_filename};

#[derive(Parser)]
#[command(name = "pq-bars", version, about = "HDR 輝度テストバー (CPU 版)")]
struct Cli {
    #[command(flatten)]
    pattern: PatternArgs,

    /// ウィンドウを開かずに 1 フレーム描画して保存する
    /// (HDR10 は .png、scRGB は .exr。拡張子が合わなければ付け替える)
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

/// ビューアの状態
struct ViewerState {
    config: TestPatternConfig,
    pipeline: DisplayPipeline<SoftwareBackend>,
    needs_redraw: bool,
    save_counter: u32,
}

impl ViewerState {
    fn new(args: &PatternArgs) -> anyhow::Result<Self> {
        let (width, height) = (args.width.max(1), args.height.max(1));
        let mut pipeline = DisplayPipeline::new(SoftwareBackend::new(width, height), args.mode);
        pipeline
            .initialize()
            .context("表示パイプラインの初期化に失敗しました")?;
        if let Some(warning) = pipeline.warning() {
            println!("⚠️  {}", warning);
        }
        Ok(Self {
            config: args.config(width, height),
            pipeline,
            needs_redraw: true,
            save_counter: 0,
        })
    }

    fn toggle_mode(&mut self) {
        let next = self.config.output_mode.toggled();
        match self.pipeline.set_mode(next) {
            Ok(()) => {
                self.config = self.config.with_mode(next);
                println!("モード切替: {}", next);
            }
            Err(err) => warn!("モードを切り替えられません: {}", err),
        }
        self.needs_redraw = true;
    }

    fn change_bars(&mut self, delta: i32) {
        let bars = (self.config.num_bars + delta).clamp(MIN_BARS, MAX_BARS);
        if bars != self.config.num_bars {
            self.config.num_bars = bars;
            self.needs_redraw = true;
            println!("バーの本数: {}", bars);
        }
    }

    /// ウィンドウサイズの変化をパイプラインに伝える
    fn sync_size(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        let (width, height) = (width.max(1), height.max(1));
        if self.pipeline.client_size() == (width, height) {
            return Ok(());
        }
        self.pipeline.backend_mut().set_client_size(width, height);
        self.pipeline.resize(width, height)?;
        self.config = self.config.with_viewport(width, height);
        self.needs_redraw = true;
        Ok(())
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let start = Instant::now();
        self.pipeline.render_frame(&self.config)?;
        self.needs_redraw = false;
        println!(
            "再描画: {:.2?} [{}] {} 本 {:.5} → {:.5} nits",
            start.elapsed(),
            self.config.output_mode,
            self.config.num_bars,
            self.config.start_nits,
            self.config.end_nits
        );
        Ok(())
    }

    fn save_image(&mut self) -> anyhow::Result<()> {
        let Some(frame) = self.pipeline.backend().front_buffer() else {
            println!("保存するフレームがありません");
            return Ok(());
        };
        self.save_counter += 1;
        let filename = snapshot_filename(self.save_counter, self.config.output_mode);
        let written = save_framebuffer(frame, Path::new(&filename))?;
        println!("画像を保存しました: {}", written.display());
        Ok(())
    }

    fn title(&self) -> String {
        format!(
            "HDR 輝度テストバー [{}] {} 本",
            self.config.output_mode, self.config.num_bars
        )
    }
}

/// 1 フレームだけ描画して保存する
fn render_snapshot(args: &PatternArgs, path: &Path) -> anyhow::Result<()> {
    let mut state = ViewerState::new(args)?;
    state.render()?;
    let frame = state
        .pipeline
        .backend()
        .front_buffer()
        .context("フレームが描画されていません")?;
    let written = save_framebuffer(frame, path)
        .with_context(|| format!("{} に保存できません", path.display()))?;
    println!("画像を保存しました: {}", written.display());
    state.pipeline.shutdown();
    Ok(())
}

fn run_viewer(args: &PatternArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  HDR 輝度テストバー (CPU 版)                                 ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  HDR10: PQ (ST.2084) / BT.2020 / 10bit                       ║");
    println!("║  scRGB: リニア / BT.709 / FP16 (1.0 = 80 nits)               ║");
    println!("║  プレビューはエンコード後の値をそのまま 8bit 表示します      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("操作方法:");
    println!("  - M キー: HDR10 / scRGB の切替");
    println!("  - ↑ / ↓ キー: バーの本数を増減");
    println!("  - S キー: 現在のフレームを画像として保存");
    println!("  - Q / Escape キー: 終了");
    println!();

    let mut state = ViewerState::new(args)?;
    let (width, height) = state.pipeline.client_size();

    let mut window = Window::new(
        &state.title(),
        width as usize,
        height as usize,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .context("ウィンドウの作成に失敗しました")?;

    window.set_target_fps(60);

    let mut preview: Vec<u32> = Vec::new();

    while window.is_open() && !window.is_key_down(Key::Escape) && !window.is_key_down(Key::Q) {
        if window.is_key_pressed(Key::M, KeyRepeat::No) {
            state.toggle_mode();
        }
        if window.is_key_pressed(Key::Up, KeyRepeat::Yes) {
            state.change_bars(1);
        }
        if window.is_key_pressed(Key::Down, KeyRepeat::Yes) {
            state.change_bars(-1);
        }
        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            state.save_image()?;
        }

        let (w, h) = window.get_size();
        state.sync_size(w as u32, h as u32)?;

        if state.needs_redraw {
            state.render()?;
            if let Some(frame) = state.pipeline.backend().front_buffer() {
                preview = frame.to_preview_u32();
            }
            window.set_title(&state.title());
        }

        match state.pipeline.backend().front_buffer() {
            Some(frame) => window
                .update_with_buffer(&preview, frame.width as usize, frame.height as usize)
                .context("バッファの更新に失敗しました")?,
            None => window.update(),
        }
    }

    state.pipeline.shutdown();
    println!("終了しました");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.snapshot {
        Some(path) => render_snapshot(&cli.pattern, path),
        None => run_viewer(&cli.pattern),
    }
}
