//! 表示パイプラインの状態管理
//!
//! `Uninitialized` と `Ready` の 2 状態。`Ready` のときはモードに合った
//! サーフェスと、現在のサイズに対して有効なビュー（またはビュー無効の印）を持つ。

use log::{debug, info, warn};

use super::backend::PresentBackend;
use super::surface::{ColorSpace, SurfaceDescriptor};
use crate::common::colors::OutputMode;
use crate::common::config::TestPatternConfig;
use crate::error::{DisplayWarning, PatternError};

/// 作成済みのサーフェス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSurface {
    pub descriptor: SurfaceDescriptor,
    /// ビューが現在のサイズ・モードに対して有効か
    pub view_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready(ActiveSurface),
}

/// 表示パイプライン
pub struct DisplayPipeline<B: PresentBackend> {
    backend: B,
    state: PipelineState,
    device_ready: bool,
    default_mode: OutputMode,
    warning: Option<DisplayWarning>,
    frames_rendered: u64,
}

impl<B: PresentBackend> DisplayPipeline<B> {
    pub fn new(backend: B, default_mode: OutputMode) -> Self {
        Self {
            backend,
            state: PipelineState::Uninitialized,
            device_ready: false,
            default_mode,
            warning: None,
            frames_rendered: 0,
        }
    }

    /// デバイスとプログラムを準備し、初期モードのサーフェスを作って `Ready` にする
    pub fn initialize(&mut self) -> Result<(), PatternError> {
        if self.device_ready && self.is_ready() {
            return Ok(());
        }

        if !self.device_ready {
            self.backend.initialize()?;
            self.device_ready = true;
        }

        let (width, height) = self.backend.client_size();
        let desc = SurfaceDescriptor::for_mode(self.default_mode, width, height);
        if let Err(err) = self.build_surface(&desc) {
            self.backend.shutdown();
            self.device_ready = false;
            return Err(PatternError::Initialization(err.to_string()));
        }
        info!(
            "表示パイプライン初期化: {} / {} / {} ({}x{})",
            desc.mode, desc.format, desc.color_space, desc.width, desc.height
        );

        self.check_hdr_support();
        Ok(())
    }

    /// モード切替。同じモードで `Ready` なら何もしない
    ///
    /// 失敗した場合は直前のサーフェスに戻せれば戻し、戻せなければ
    /// `Uninitialized` になる。いずれの場合もエラーを返す。
    pub fn set_mode(&mut self, mode: OutputMode) -> Result<(), PatternError> {
        if !self.device_ready {
            return Err(PatternError::NotInitialized);
        }

        let previous = match self.state {
            PipelineState::Ready(active) if active.descriptor.mode == mode => return Ok(()),
            PipelineState::Ready(active) => Some(active.descriptor),
            PipelineState::Uninitialized => None,
        };

        self.teardown_surface();

        let (width, height) = self.backend.client_size();
        let desc = SurfaceDescriptor::for_mode(mode, width, height);
        match self.build_surface(&desc) {
            Ok(()) => {
                info!(
                    "モード切替: {} / {} / {} ({}x{})",
                    desc.mode, desc.format, desc.color_space, desc.width, desc.height
                );
                Ok(())
            }
            Err(err) => {
                warn!("{} へのモード切替に失敗: {}", mode, err);
                if let Some(prev) = previous {
                    match self.build_surface(&prev) {
                        Ok(()) => info!("{} のサーフェスに戻しました", prev.mode),
                        Err(restore_err) => {
                            warn!("直前のサーフェスにも戻せません: {}", restore_err)
                        }
                    }
                }
                Err(err)
            }
        }
    }

    /// クライアント領域のリサイズ。ビューだけを作り直し、フォーマットは変えない
    ///
    /// サーフェスがまだ無ければ何もしない。サイズは 1x1 以上に切り上げる。
    /// 失敗するとビューは無効のまま残り、以降のフレームは描画されない。
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PatternError> {
        let PipelineState::Ready(active) = self.state else {
            return Ok(());
        };
        let (width, height) = (width.max(1), height.max(1));

        self.backend.release_view();
        self.state = PipelineState::Ready(ActiveSurface {
            view_valid: false,
            ..active
        });

        let descriptor = active.descriptor.resized(width, height);
        self.backend
            .resize_surface(width, height)
            .map_err(|err| resize_error(&descriptor, err))?;
        self.state = PipelineState::Ready(ActiveSurface {
            descriptor,
            view_valid: false,
        });

        self.backend
            .create_view()
            .map_err(|err| resize_error(&descriptor, err))?;
        self.state = PipelineState::Ready(ActiveSurface {
            descriptor,
            view_valid: true,
        });
        debug!("リサイズ: {}x{}", width, height);
        Ok(())
    }

    /// 1 フレーム描画して表示する。有効なビューが無ければ何もしない
    ///
    /// エンコードは常にサーフェスのモードで行う。
    pub fn render_frame(&mut self, config: &TestPatternConfig) -> Result<(), PatternError> {
        let active = match self.state {
            PipelineState::Ready(active) if active.view_valid => active,
            _ => {
                debug!("有効なビューが無いためフレームをスキップ");
                return Ok(());
            }
        };

        let mut params = config.to_params();
        if config.output_mode != active.descriptor.mode {
            debug!(
                "設定のモード ({}) とサーフェスのモード ({}) が異なるため、サーフェス側で描画",
                config.output_mode, active.descriptor.mode
            );
            params.output_mode = active.descriptor.mode.as_i32();
        }

        self.backend.draw(&params)?;
        self.frames_rendered += 1;
        Ok(())
    }

    /// すべての資源を解放して `Uninitialized` に戻る
    pub fn shutdown(&mut self) {
        self.teardown_surface();
        if self.device_ready {
            self.backend.shutdown();
            self.device_ready = false;
        }
        info!("表示パイプライン終了 ({} フレーム)", self.frames_rendered);
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PipelineState::Ready(_))
    }

    /// 現在のサーフェスのモード
    pub fn mode(&self) -> Option<OutputMode> {
        self.surface().map(|desc| desc.mode)
    }

    pub fn surface(&self) -> Option<&SurfaceDescriptor> {
        match &self.state {
            PipelineState::Ready(active) => Some(&active.descriptor),
            PipelineState::Uninitialized => None,
        }
    }

    pub fn has_view(&self) -> bool {
        matches!(self.state, PipelineState::Ready(active) if active.view_valid)
    }

    /// 初期化時に検出した警告
    pub fn warning(&self) -> Option<DisplayWarning> {
        self.warning
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn client_size(&self) -> (u32, u32) {
        self.backend.client_size()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn build_surface(&mut self, desc: &SurfaceDescriptor) -> Result<(), PatternError> {
        self.backend.create_surface(desc)?;
        if let Err(err) = self.backend.create_view() {
            self.backend.release_surface();
            return Err(err);
        }
        self.state = PipelineState::Ready(ActiveSurface {
            descriptor: *desc,
            view_valid: true,
        });
        Ok(())
    }

    fn teardown_surface(&mut self) {
        if self.is_ready() {
            self.backend.release_view();
            self.backend.release_surface();
        }
        self.state = PipelineState::Uninitialized;
    }

    fn check_hdr_support(&mut self) {
        let expected = ColorSpace::RgbFullPqBt2020;
        let advertised = self.backend.output_color_space();
        if advertised == Some(expected) {
            self.warning = None;
            return;
        }
        let warning = DisplayWarning::UnsupportedDisplay {
            expected,
            advertised,
        };
        warn!("{}", warning);
        self.warning = Some(warning);
    }
}

fn resize_error(desc: &SurfaceDescriptor, err: PatternError) -> PatternError {
    match err {
        err @ PatternError::SurfaceCreation { .. } => err,
        other => PatternError::SurfaceCreation {
            format: desc.format,
            width: desc.width,
            height: desc.height,
            reason: other.to_string(),
        },
    }
}
