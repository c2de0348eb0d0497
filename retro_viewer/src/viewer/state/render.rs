use std::time::Instant;

use bytemuck::cast_slice;
use log::{info, warn};
use retro_scene::PartSurface;
use wgpu::SurfaceError;

use super::super::shaders::{BackgroundUniforms, CameraUniforms, CompositeUniforms, PartUniforms};
use super::ViewerState;
use crate::texture::write_rgba;

/// Page colour behind the scene once it fades out, in linear space.
const PAGE_BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.006,
    g: 0.006,
    b: 0.006,
    a: 1.0,
};

/// Advances the scene by the wall-clock time since the previous frame and
/// pushes whatever changed to the GPU.
pub(super) fn update(state: &mut ViewerState) {
    let now = Instant::now();
    let delta = now.duration_since(state.last_frame);
    state.last_frame = now;

    let (tick, dirty) = state.runtime.tick(delta);
    if dirty {
        let canvas = state.runtime.screen();
        if let Err(err) = write_rgba(
            &state.queue,
            &state.screen.texture,
            state.screen.width,
            state.screen.height,
            canvas.as_raw(),
        ) {
            warn!("boot screen upload failed: {err:#}");
        }
    }

    if !state.title_shown && state.runtime.title_revealed() {
        state.window.set_title(&state.base_title);
        state.title_shown = true;
        info!("site title revealed after {} ms", tick.now_ms);
    }

    let background = BackgroundUniforms {
        params: [tick.shader_time, 0.0, 0.0, 0.0],
    };
    state
        .queue
        .write_buffer(&state.background_buffer, 0, cast_slice(&[background]));

    let camera = CameraUniforms::new(
        state.runtime.view_projection(),
        state.runtime.eye(),
        &state.lighting,
    );
    state
        .queue
        .write_buffer(&state.camera_buffer, 0, cast_slice(&[camera]));

    let root = state.runtime.model_transform();
    for part in &state.parts {
        let material = match &part.surface {
            PartSurface::Phong(material) => Some(material),
            PartSurface::ScreenTexture => None,
        };
        let uniforms = PartUniforms::new(root * part.transform, material);
        state
            .queue
            .write_buffer(&part.uniform_buffer, 0, cast_slice(&[uniforms]));
    }

    let effect = state.runtime.effect();
    let sigma = effect.blur_px * state.window.scale_factor() as f32;
    let composite = CompositeUniforms::new(
        (state.size.width, state.size.height),
        sigma,
        effect.opacity,
        state.composite.encode_srgb,
    );
    state
        .queue
        .write_buffer(&state.composite.uniform_buffer, 0, cast_slice(&[composite]));
}

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("retro-viewer-encoder"),
        });

    let visible = state.runtime.effect().visible;
    if visible {
        draw_scene(state, &mut encoder);
    }
    draw_composite(state, &view, &mut encoder, visible);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

/// Backdrop and model into the offscreen target.
fn draw_scene(state: &ViewerState, encoder: &mut wgpu::CommandEncoder) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("scene-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &state.target.color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &state.target.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    rpass.set_pipeline(&state.background_pipeline);
    rpass.set_bind_group(0, &state.background_bind_group, &[]);
    rpass.draw(0..3, 0..1);

    rpass.set_bind_group(0, &state.camera_bind_group, &[]);
    for part in &state.parts {
        match part.surface {
            PartSurface::Phong(_) => rpass.set_pipeline(&state.phong_pipeline),
            PartSurface::ScreenTexture => {
                rpass.set_pipeline(&state.screen_pipeline);
                rpass.set_bind_group(2, &state.screen.bind_group, &[]);
            }
        }
        rpass.set_bind_group(1, &part.bind_group, &[]);
        rpass.set_vertex_buffer(0, part.vertex_buffer.slice(..));
        rpass.set_index_buffer(part.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..part.index_count, 0, 0..1);
    }
}

/// Presents the offscreen scene over the page colour with the current blur
/// and opacity; only clears while the scene is hidden.
fn draw_composite(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
    visible: bool,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("composite-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(PAGE_BACKGROUND),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    if !visible {
        return;
    }
    rpass.set_pipeline(&state.composite.pipeline);
    rpass.set_bind_group(0, &state.composite.bind_group, &[]);
    rpass.draw(0..3, 0..1);
}
