//! GPU 版バックエンド (wgpu + winit)
//!
//! HDR10 は `Rgb10a2Unorm`、scRGB は `Rgba16Float` のスワップチェーンを使う。
//! wgpu にはスワップチェーンの色空間を指定する API が無いため、
//! 出力色空間は常に「不明」として報告する。

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use winit::window::Window;

use super::backend::PresentBackend;
use super::surface::{ColorSpace, SurfaceDescriptor, SurfaceFormat};
use crate::common::config::FrameParams;
use crate::error::PatternError;

/// ピクセルプログラム
pub const SHADER_SOURCE: &str = include_str!("../shaders/pq_bars.wgsl");

/// GPU コンテキスト
struct GpuContext {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    shader: wgpu::ShaderModule,
    params_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline_layout: wgpu::PipelineLayout,
    /// フォーマットごとにキャッシュしたレンダーパイプライン
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    config: Option<wgpu::SurfaceConfiguration>,
    view_ready: bool,
}

impl GpuContext {
    fn new(window: Arc<Window>) -> Result<Self, PatternError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| PatternError::Initialization(format!("サーフェスを作成できません: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| PatternError::Initialization("GPU アダプタが見つかりません".to_string()))?;

        let info = adapter.get_info();
        info!("GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("PQ Bars Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| PatternError::Initialization(format!("GPU デバイスの取得に失敗しました: {e}")))?;

        // シェーダーをロード（コンパイルエラーは初期化失敗）
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("PQ Bars Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(PatternError::Initialization(format!(
                "シェーダーのコンパイルに失敗しました: {err}"
            )));
        }

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Params Buffer"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // バインドグループレイアウト
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        Ok(Self {
            _instance: instance,
            surface,
            adapter,
            device,
            queue,
            shader,
            params_buffer,
            bind_group,
            pipeline_layout,
            pipelines: HashMap::new(),
            config: None,
            view_ready: false,
        })
    }

    /// フォーマット用のレンダーパイプラインを用意（作成済みなら再利用）
    fn ensure_pipeline(&mut self, format: wgpu::TextureFormat) -> Result<(), String> {
        if self.pipelines.contains_key(&format) {
            return Ok(());
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("PQ Bars Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(err.to_string());
        }

        debug!("レンダーパイプライン作成: {:?}", format);
        self.pipelines.insert(format, pipeline);
        Ok(())
    }

    /// サーフェスを設定し、検証エラーがあれば返す
    fn configure(&self, config: &wgpu::SurfaceConfiguration) -> Result<(), String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.surface.configure(&self.device, config);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(()),
        }
    }
}

/// GPU 版バックエンド
pub struct WgpuBackend {
    window: Arc<Window>,
    gpu: Option<GpuContext>,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window, gpu: None }
    }

    pub fn adapter_name(&self) -> Option<String> {
        self.gpu.as_ref().map(|gpu| gpu.adapter.get_info().name)
    }

    fn surface_error(desc: &SurfaceDescriptor, reason: String) -> PatternError {
        PatternError::SurfaceCreation {
            format: desc.format,
            width: desc.width,
            height: desc.height,
            reason,
        }
    }
}

impl PresentBackend for WgpuBackend {
    fn initialize(&mut self) -> Result<(), PatternError> {
        if self.gpu.is_none() {
            self.gpu = Some(GpuContext::new(self.window.clone())?);
        }
        Ok(())
    }

    fn client_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn output_color_space(&self) -> Option<ColorSpace> {
        None
    }

    fn create_surface(&mut self, desc: &SurfaceDescriptor) -> Result<(), PatternError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(Self::surface_error(desc, "GPU が初期化されていません".to_string()));
        };

        gpu.view_ready = false;
        gpu.config = None;

        let format = desc.format.to_wgpu();
        let caps = gpu.surface.get_capabilities(&gpu.adapter);
        if !caps.formats.contains(&format) {
            return Err(Self::surface_error(
                desc,
                format!("サーフェスが対応していません (対応フォーマット: {:?})", caps.formats),
            ));
        }

        let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: desc.width,
            height: desc.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        gpu.configure(&config)
            .map_err(|reason| Self::surface_error(desc, reason))?;
        gpu.ensure_pipeline(format)
            .map_err(|reason| Self::surface_error(desc, reason))?;
        gpu.config = Some(config);

        warn!(
            "wgpu ではスワップチェーンの色空間 ({}) を指定できません。ドライバ既定の色空間で出力されます",
            desc.color_space
        );
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), PatternError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(PatternError::NotInitialized);
        };
        let Some(config) = gpu.config.as_mut() else {
            return Err(PatternError::Present("サーフェスがありません".to_string()));
        };
        config.width = width;
        config.height = height;
        let config = config.clone();
        gpu.configure(&config)
            .map_err(|reason| PatternError::SurfaceCreation {
                format: SurfaceFormat::from_wgpu(config.format),
                width,
                height,
                reason,
            })
    }

    fn create_view(&mut self) -> Result<(), PatternError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(PatternError::NotInitialized);
        };
        if gpu.config.is_none() {
            return Err(PatternError::Present("サーフェスがありません".to_string()));
        }
        gpu.view_ready = true;
        Ok(())
    }

    fn release_view(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.view_ready = false;
        }
    }

    fn release_surface(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.view_ready = false;
            gpu.config = None;
        }
    }

    fn draw(&mut self, params: &FrameParams) -> Result<(), PatternError> {
        let Some(gpu) = self.gpu.as_ref() else {
            return Err(PatternError::NotInitialized);
        };
        let (Some(config), true) = (gpu.config.as_ref(), gpu.view_ready) else {
            return Err(PatternError::Present("ビューがありません".to_string()));
        };
        let Some(pipeline) = gpu.pipelines.get(&config.format) else {
            return Err(PatternError::Present(format!(
                "{:?} のパイプラインがありません",
                config.format
            )));
        };

        // パラメータを GPU に送信
        gpu.queue
            .write_buffer(&gpu.params_buffer, 0, bytemuck::bytes_of(params));

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                // 設定し直して、このフレームは表示しない
                warn!("サーフェスが古くなったため再設定します");
                gpu.surface.configure(&gpu.device, config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("フレーム取得がタイムアウトしました");
                return Ok(());
            }
            Err(e) => return Err(PatternError::Present(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("PQ Bars Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &gpu.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn shutdown(&mut self) {
        self.gpu = None;
    }
}
