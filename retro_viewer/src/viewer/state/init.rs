use std::{borrow::Cow, sync::Arc, time::Instant};

use anyhow::{Context, Result};
use bytemuck::cast_slice;
use glam::Mat4;
use log::{debug, info};
use retro_scene::{ComputerModel, MeshVertex, PartSurface, SceneLighting};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use super::super::shaders::{
    BACKGROUND_SHADER_SOURCE, BackgroundUniforms, COMPOSITE_SHADER_SOURCE, CameraUniforms,
    CompositeUniforms, MESH_SHADER_SOURCE, PartUniforms,
};
use super::{CompositeResources, PartBuffers, SceneTarget, ScreenResources, ViewerState};
use crate::runtime::SceneRuntime;
use crate::texture::write_rgba;

const SCENE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const SCENE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SCREEN_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Bundles the wgpu objects tied to the viewer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

/// Bind group layouts shared between the mesh pipelines.
struct MeshLayouts {
    camera: wgpu::BindGroupLayout,
    part: wgpu::BindGroupLayout,
    screen: wgpu::BindGroupLayout,
}

/// Bootstraps wgpu, uploads the model parts and the first screen frame, and
/// builds the three pipelines (background, lit meshes, composite) so that a
/// frame only has to refresh uniforms and record passes.
pub(super) async fn new(
    window: Arc<Window>,
    runtime: SceneRuntime,
    base_title: String,
) -> Result<ViewerState> {
    let size = window.inner_size();
    let wgpu = bootstrap_wgpu(window.clone()).await?;
    let device = &wgpu.device;

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu.surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu.present_mode,
        alpha_mode: wgpu.alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    };

    let target = create_scene_target(device, size);
    let layouts = create_mesh_layouts(device);

    let lighting = SceneLighting::default();
    let camera_uniforms = CameraUniforms::new(runtime.view_projection(), runtime.eye(), &lighting);
    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("camera-uniform-buffer"),
        contents: cast_slice(&[camera_uniforms]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera-bind-group"),
        layout: &layouts.camera,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: camera_buffer.as_entire_binding(),
        }],
    });

    let model = ComputerModel::build(runtime.config().keyboard);
    let parts = upload_parts(device, &layouts.part, &model, runtime.model_transform());
    info!(
        "uploaded {} model parts ({} keys)",
        parts.len(),
        model.key_count()
    );

    let screen = create_screen_resources(device, &wgpu.queue, &layouts.screen, &runtime)?;
    let (phong_pipeline, screen_pipeline) = create_mesh_pipelines(device, &layouts);
    let (background_pipeline, background_buffer, background_bind_group) =
        create_background_resources(device);
    let composite = create_composite_resources(device, wgpu.surface_format, &target, size);

    let state = ViewerState {
        window,
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        config,
        size,
        runtime,
        target,
        background_pipeline,
        background_buffer,
        background_bind_group,
        phong_pipeline,
        screen_pipeline,
        camera_buffer,
        camera_bind_group,
        parts,
        screen,
        composite,
        lighting,
        last_frame: Instant::now(),
        base_title,
        title_shown: false,
    };

    state.surface.configure(&state.device, &state.config);
    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("retro-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| surface_caps.formats.first().copied())
        .context("surface reports no texture formats")?;
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);
    debug!(
        "surface format {:?}, present mode {:?}, alpha {:?}",
        surface_format, present_mode, alpha_mode
    );

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

pub(super) fn create_scene_target(device: &wgpu::Device, size: PhysicalSize<u32>) -> SceneTarget {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scene-color"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scene-depth"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
    SceneTarget {
        _color: color,
        color_view,
        _depth: depth,
        depth_view,
    }
}

fn uniform_layout_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn texture_layout_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

fn linear_clamp_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn create_mesh_layouts(device: &wgpu::Device) -> MeshLayouts {
    let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera-layout"),
        entries: &[uniform_layout_entry(
            0,
            stages,
            std::mem::size_of::<CameraUniforms>(),
        )],
    });
    let part = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("part-layout"),
        entries: &[uniform_layout_entry(
            0,
            stages,
            std::mem::size_of::<PartUniforms>(),
        )],
    });
    let screen = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("screen-texture-layout"),
        entries: &texture_layout_entries(),
    });
    MeshLayouts {
        camera,
        part,
        screen,
    }
}

fn upload_parts(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    model: &ComputerModel,
    root: Mat4,
) -> Vec<PartBuffers> {
    model
        .parts()
        .iter()
        .map(|part| {
            let material = match &part.surface {
                PartSurface::Phong(material) => Some(material),
                PartSurface::ScreenTexture => None,
            };
            let uniforms = PartUniforms::new(root * part.transform, material);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(part.name),
                contents: cast_slice(&part.mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(part.name),
                contents: cast_slice(&part.mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(part.name),
                contents: cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(part.name),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
            debug!(
                "part {}: {} vertices, {} triangles",
                part.name,
                part.mesh.vertices.len(),
                part.mesh.triangle_count()
            );
            PartBuffers {
                vertex_buffer,
                index_buffer,
                index_count: part.mesh.indices.len() as u32,
                uniform_buffer,
                bind_group,
                transform: part.transform,
                surface: part.surface,
            }
        })
        .collect()
}

fn create_screen_resources(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    runtime: &SceneRuntime,
) -> Result<ScreenResources> {
    let canvas = runtime.screen();
    let (width, height) = (canvas.width(), canvas.height());
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("boot-screen-texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCREEN_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_rgba(queue, &texture, width, height, canvas.as_raw())
        .context("uploading initial boot screen")?;

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = linear_clamp_sampler(device, "boot-screen-sampler");
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("boot-screen-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    Ok(ScreenResources {
        texture,
        bind_group,
        width,
        height,
    })
}

fn create_mesh_pipelines(
    device: &wgpu::Device,
    layouts: &MeshLayouts,
) -> (wgpu::RenderPipeline, wgpu::RenderPipeline) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mesh-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(MESH_SHADER_SOURCE)),
    });
    let phong_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("phong-pipeline-layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.part],
        push_constant_ranges: &[],
    });
    let screen_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("screen-pipeline-layout"),
        bind_group_layouts: &[&layouts.camera, &layouts.part, &layouts.screen],
        push_constant_ranges: &[],
    });

    let build = |label: &str, layout: &wgpu::PipelineLayout, fragment_entry: &str| {
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
        };
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[vertex_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: fragment_entry,
                targets: &[Some(wgpu::ColorTargetState {
                    format: SCENE_COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SCENE_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    };

    (
        build("phong-pipeline", &phong_layout, "fs_phong"),
        build("screen-pipeline", &screen_layout, "fs_screen"),
    )
}

fn create_background_resources(
    device: &wgpu::Device,
) -> (wgpu::RenderPipeline, wgpu::Buffer, wgpu::BindGroup) {
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("background-layout"),
        entries: &[uniform_layout_entry(
            0,
            wgpu::ShaderStages::FRAGMENT,
            std::mem::size_of::<BackgroundUniforms>(),
        )],
    });
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("background-uniform-buffer"),
        contents: cast_slice(&[BackgroundUniforms { params: [0.0; 4] }]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("background-bind-group"),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("background-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(BACKGROUND_SHADER_SOURCE)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("background-pipeline-layout"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("background-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: SCENE_COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        // The backdrop sits behind everything and never writes depth.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: SCENE_DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });
    (pipeline, buffer, bind_group)
}

fn create_composite_resources(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    target: &SceneTarget,
    size: PhysicalSize<u32>,
) -> CompositeResources {
    let texture_entries = texture_layout_entries();
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("composite-layout"),
        entries: &[
            texture_entries[0],
            texture_entries[1],
            uniform_layout_entry(
                2,
                wgpu::ShaderStages::FRAGMENT,
                std::mem::size_of::<CompositeUniforms>(),
            ),
        ],
    });
    let encode_srgb = !surface_format.is_srgb();
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("composite-uniform-buffer"),
        contents: cast_slice(&[CompositeUniforms::new(
            (size.width, size.height),
            0.0,
            1.0,
            encode_srgb,
        )]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let sampler = linear_clamp_sampler(device, "composite-sampler");
    let bind_group = create_composite_bind_group(
        device,
        &bind_group_layout,
        &target.color_view,
        &sampler,
        &uniform_buffer,
    );

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("composite-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(COMPOSITE_SHADER_SOURCE)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("composite-pipeline-layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("composite-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    CompositeResources {
        pipeline,
        bind_group_layout,
        bind_group,
        sampler,
        uniform_buffer,
        encode_srgb,
    }
}

pub(super) fn create_composite_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    scene_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    uniform_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("composite-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(scene_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
        ],
    })
}
