//! HDR 輝度テストバー (GPU 版)
//!
//! winit のウィンドウに wgpu で描画する。HDR10 は 10bit、scRGB は FP16 の
//! スワップチェーンを使う。
//!
//! 操作方法:
//!   - M キー: HDR10 (PQ) / scRGB の切替
//!   - ↑ / ↓ キー: バーの本数を増減
//!   - F11 キー: ボーダーレス全画面の切替
//!   - Escape キー: 全画面なら解除、ウィンドウなら終了
//!   - Q キー: 終了

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, warn};
use pq_bars::cli::PatternArgs;
use pq_bars::common::config::TestPatternConfig;
use pq_bars::common::constants::{MAX_BARS, MIN_BARS};
use pq_bars::display::{DisplayPipeline, WgpuBackend};
use pq_bars::PatternError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowBuilder},
};

#[derive(Parser)]
#[command(name = "pq-bars-gpu", version, about = "HDR 輝度テストバー (GPU 版)")]
struct Cli {
    #[command(flatten)]
    pattern: PatternArgs,
}

fn title(config: &TestPatternConfig) -> String {
    format!(
        "HDR 輝度テストバー GPU [{}] {} 本",
        config.output_mode, config.num_bars
    )
}

/// キー入力に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    LeaveFullscreen,
    ToggleFullscreen,
    ToggleMode,
    MoreBars,
    FewerBars,
}

fn key_action(key: KeyCode, repeat: bool, fullscreen: bool) -> Option<KeyAction> {
    match key {
        // 押しっぱなしで全画面解除から終了まで進まないようにする
        KeyCode::Escape if repeat => None,
        KeyCode::Escape if fullscreen => Some(KeyAction::LeaveFullscreen),
        KeyCode::Escape | KeyCode::KeyQ => Some(KeyAction::Quit),
        KeyCode::KeyM if !repeat => Some(KeyAction::ToggleMode),
        KeyCode::ArrowUp => Some(KeyAction::MoreBars),
        KeyCode::ArrowDown => Some(KeyAction::FewerBars),
        KeyCode::F11 if !repeat => Some(KeyAction::ToggleFullscreen),
        _ => None,
    }
}

fn toggle_fullscreen(window: &Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
    } else {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let args = cli.pattern;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  HDR 輝度テストバー (GPU 版)                                 ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  HDR10: PQ (ST.2084) / BT.2020 / R10G10B10A2                 ║");
    println!("║  scRGB: リニア / BT.709 / R16G16B16A16 FLOAT                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("操作方法:");
    println!("  - M キー: HDR10 / scRGB の切替");
    println!("  - ↑ / ↓ キー: バーの本数を増減");
    println!("  - F11 キー: 全画面の切替");
    println!("  - Escape キー: 全画面を解除 (ウィンドウ表示中は終了)");
    println!("  - Q キー: 終了");
    println!();

    let event_loop = EventLoop::new().context("イベントループを作成できません")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("HDR 輝度テストバー GPU")
            .with_inner_size(PhysicalSize::new(args.width.max(1), args.height.max(1)))
            .with_resizable(true)
            .build(&event_loop)
            .context("ウィンドウの作成に失敗しました")?,
    );

    let mut pipeline = DisplayPipeline::new(WgpuBackend::new(window.clone()), args.mode);
    pipeline
        .initialize()
        .context("表示パイプラインの初期化に失敗しました")?;
    if let Some(warning) = pipeline.warning() {
        println!("⚠️  {}", warning);
    }
    if let Some(name) = pipeline.backend().adapter_name() {
        println!("GPU: {}", name);
    }

    let (width, height) = pipeline.client_size();
    let mut config = args.config(width, height);
    window.set_title(&title(&config));

    event_loop.set_control_flow(ControlFlow::Wait);

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => {
                // 次の描画より前にビューを作り直す
                let (w, h) = (size.width.max(1), size.height.max(1));
                if let Err(err) = pipeline.resize(w, h) {
                    warn!("リサイズに失敗しました: {}", err);
                }
                config = config.with_viewport(w, h);
                window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                let Some(action) = key_action(key, repeat, window.fullscreen().is_some()) else {
                    return;
                };
                match action {
                    KeyAction::Quit => elwt.exit(),
                    KeyAction::LeaveFullscreen => window.set_fullscreen(None),
                    KeyAction::ToggleFullscreen => toggle_fullscreen(&window),
                    KeyAction::ToggleMode => {
                        let next = config.output_mode.toggled();
                        match pipeline.set_mode(next) {
                            Ok(()) => {
                                config = config.with_mode(next);
                                println!("モード切替: {}", next);
                            }
                            Err(err) => warn!("モードを切り替えられません: {}", err),
                        }
                    }
                    KeyAction::MoreBars => {
                        config.num_bars = (config.num_bars + 1).clamp(MIN_BARS, MAX_BARS);
                    }
                    KeyAction::FewerBars => {
                        config.num_bars = (config.num_bars - 1).clamp(MIN_BARS, MAX_BARS);
                    }
                }
                window.set_title(&title(&config));
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => match pipeline.render_frame(&config) {
                Ok(()) => {}
                Err(err @ PatternError::Present(_)) => warn!("{}", err),
                Err(err) => {
                    error!("{}", err);
                    elwt.exit();
                }
            },
            _ => {}
        },
        Event::LoopExiting => {
            pipeline.shutdown();
            println!("終了しました");
        }
        _ => {}
    })?;

    Ok(())
}
