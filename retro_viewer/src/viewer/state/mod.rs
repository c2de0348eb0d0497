//! Window-side state for the viewer. Owns the wgpu device/surface and the
//! GPU copies of the scene, and wraps the [`SceneRuntime`] that the event
//! loop in `main.rs` feeds with input. Submodules cover lifecycle slices:
//! `init` for setup, `layout` for resize handling, `input` for scroll and
//! orbit routing, and `render` for per-frame updates and draw passes.

use std::{sync::Arc, time::Instant};

use anyhow::Result;
use glam::Mat4;
use retro_scene::{PartSurface, SceneLighting};
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    window::Window,
};

use crate::runtime::SceneRuntime;

mod init;
mod input;
mod layout;
mod render;

/// Colour target the scene is drawn into before the composite pass, plus its
/// depth buffer. Both follow the window size.
struct SceneTarget {
    _color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

/// Vertex/index buffers and uniforms for one model part.
struct PartBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    transform: Mat4,
    surface: PartSurface,
}

struct ScreenResources {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

struct CompositeResources {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    encode_srgb: bool,
}

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    runtime: SceneRuntime,
    target: SceneTarget,
    background_pipeline: wgpu::RenderPipeline,
    background_buffer: wgpu::Buffer,
    background_bind_group: wgpu::BindGroup,
    phong_pipeline: wgpu::RenderPipeline,
    screen_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    parts: Vec<PartBuffers>,
    screen: ScreenResources,
    composite: CompositeResources,
    lighting: SceneLighting,
    last_frame: Instant,
    base_title: String,
    title_shown: bool,
}

impl ViewerState {
    pub async fn new(window: Arc<Window>, runtime: SceneRuntime, base_title: String) -> Result<Self> {
        init::new(window, runtime, base_title).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    pub fn update(&mut self) {
        render::update(self);
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        input::handle_key_event(self, event);
    }

    pub fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        input::handle_mouse_wheel(self, delta);
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        input::handle_mouse_button(self, button, state);
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        input::cursor_moved(self, x, y);
    }

    pub fn cursor_left(&mut self) {
        input::cursor_left(self);
    }
}
