use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{Key, NamedKey},
};

use super::ViewerState;

pub(super) fn handle_key_event(state: &mut ViewerState, event: &KeyEvent) {
    if event.state != ElementState::Pressed {
        return;
    }
    let runtime = &mut state.runtime;
    match &event.logical_key {
        Key::Named(NamedKey::ArrowDown) => runtime.scroll_line(1.0),
        Key::Named(NamedKey::ArrowUp) => runtime.scroll_line(-1.0),
        Key::Named(NamedKey::PageDown) | Key::Named(NamedKey::Space) => runtime.scroll_page(1.0),
        Key::Named(NamedKey::PageUp) => runtime.scroll_page(-1.0),
        Key::Named(NamedKey::Home) => runtime.scroll_to(0.0),
        Key::Named(NamedKey::End) => runtime.scroll_to_end(),
        _ => {}
    }
}

/// Wheel up scrolls the page back towards the top.
pub(super) fn handle_mouse_wheel(state: &mut ViewerState, delta: MouseScrollDelta) {
    match delta {
        MouseScrollDelta::LineDelta(_, lines) => state.runtime.scroll_line(-lines),
        MouseScrollDelta::PixelDelta(position) => {
            let scale = state.window.scale_factor();
            state.runtime.scroll_by((-position.y / scale) as f32);
        }
    }
}

pub(super) fn handle_mouse_button(
    state: &mut ViewerState,
    button: MouseButton,
    button_state: ElementState,
) {
    if button == MouseButton::Left {
        state
            .runtime
            .set_dragging(button_state == ElementState::Pressed);
    }
}

/// Physical cursor position from winit, converted to logical pixels.
pub(super) fn cursor_moved(state: &mut ViewerState, x: f64, y: f64) {
    let scale = state.window.scale_factor();
    state
        .runtime
        .pointer_moved((x / scale) as f32, (y / scale) as f32);
}

pub(super) fn cursor_left(state: &mut ViewerState) {
    state.runtime.pointer_left();
}
