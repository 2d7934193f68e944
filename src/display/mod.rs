pub mod backend;
pub mod pipeline;
pub mod software;
pub mod surface;
pub mod wgpu_backend;

pub use backend::PresentBackend;
pub use pipeline::{ActiveSurface, DisplayPipeline, PipelineState};
pub use software::{Framebuffer, SoftwareBackend};
pub use surface::{ColorSpace, SurfaceDescriptor, SurfaceFormat};
pub use wgpu_backend::WgpuBackend;
