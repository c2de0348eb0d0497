use log::warn;
use retro_scene::ViewportSize;
use winit::dpi::PhysicalSize;

use super::ViewerState;
use super::init::{create_composite_bind_group, create_scene_target};

pub(super) fn resize(state: &mut ViewerState, new_size: PhysicalSize<u32>) {
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    state.size = new_size;
    state.config.width = new_size.width;
    state.config.height = new_size.height;
    state.surface.configure(&state.device, &state.config);
    rebuild_scene_target(state);

    let viewport = logical_viewport(state);
    if let Err(err) = state.runtime.resize(viewport) {
        warn!(
            "scene resize to {:.0}x{:.0} failed: {err:#}",
            viewport.width, viewport.height
        );
    }
}

/// Window size in CSS-style logical pixels, which is what the zoom stages and
/// the page layout are measured in.
fn logical_viewport(state: &ViewerState) -> ViewportSize {
    ViewportSize::from_physical(
        state.size.width,
        state.size.height,
        state.window.scale_factor(),
    )
}

fn rebuild_scene_target(state: &mut ViewerState) {
    state.target = create_scene_target(&state.device, state.size);
    state.composite.bind_group = create_composite_bind_group(
        &state.device,
        &state.composite.bind_group_layout,
        &state.target.color_view,
        &state.composite.sampler,
        &state.composite.uniform_buffer,
    );
}
