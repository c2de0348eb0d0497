mod cli;
mod headless;
mod page;
mod runtime;
mod texture;
mod viewer;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use pollster::FutureExt;
use retro_scene::ViewportSize;
use wgpu::SurfaceError;
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use cli::Args;
use runtime::SceneRuntime;
use viewer::ViewerState;

const SITE_TITLE: &str = "Retro Desk Portfolio";

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();
    args.validate()?;

    let config = cli::scene_config(&args)?;
    let glyphs = cli::glyph_source(&args)?;
    println!(
        "Scene configured: screen {}x{} at {:.0}px ({}), keyboard {}",
        config.screen.width,
        config.screen.height,
        config.screen.font_size,
        glyphs.label(),
        if config.keyboard { "on" } else { "off" }
    );

    if args.headless {
        let viewport = ViewportSize::new(args.width as f32, args.height as f32);
        let page = cli::page_model(&args, viewport.height);
        let runtime = SceneRuntime::new(config, glyphs, viewport, page)?;
        return headless::run(&args, runtime);
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("{SITE_TITLE} - booting"))
            .with_inner_size(LogicalSize::new(args.width, args.height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let size = window.inner_size();
    let viewport = ViewportSize::from_physical(size.width, size.height, window.scale_factor());
    let page = cli::page_model(&args, viewport.height);
    let runtime = SceneRuntime::new(config, glyphs, viewport, page)?;
    let mut state = ViewerState::new(window, runtime, SITE_TITLE.to_string()).block_on()?;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => target.exit(),
                        WindowEvent::KeyboardInput { event, .. } => state.handle_key_event(&event),
                        WindowEvent::MouseWheel { delta, .. } => state.handle_mouse_wheel(delta),
                        WindowEvent::MouseInput {
                            state: button_state,
                            button,
                            ..
                        } => state.handle_mouse_button(button, button_state),
                        WindowEvent::CursorMoved { position, .. } => {
                            state.cursor_moved(position.x, position.y)
                        }
                        WindowEvent::CursorLeft { .. } => state.cursor_left(),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(SurfaceError::Lost) => state.resize(state.size()),
                                Err(SurfaceError::OutOfMemory) => target.exit(),
                                Err(err) => warn!("render error: {err:?}"),
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}
