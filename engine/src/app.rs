use std::error::Error;

use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use winit::dpi::PhysicalSize;
use winit::event::Event;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::SurfaceSize;

pub struct AppConfig {
    pub title: String,
    pub desired_size: PhysicalSize<u32>,
    pub clamp_to_monitor: bool,
    pub vsync: Option<bool>,
}

pub struct AppContext {
    pub window: Window,
    pub renderer: PixelsRenderer2d,
    pub surface_size: SurfaceSize,
}

/// An application driven directly by winit events.
///
/// The handler sees every raw event, which is what a gesture-sampling app
/// needs: pointer positions arrive per `CursorMoved`, not once per frame.
pub trait AppHandler {
    fn init(&mut self, _ctx: &mut AppContext) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn handle_event(
        &mut self,
        event: Event<()>,
        control_flow: &mut ControlFlow,
        ctx: &mut AppContext,
    );
}

pub fn run_app<H: AppHandler + 'static>(
    config: AppConfig,
    mut handler: H,
) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new();
    let monitor_size = if config.clamp_to_monitor {
        event_loop.primary_monitor().map(|m| m.size())
    } else {
        None
    };
    let initial_size = if let Some(monitor) = monitor_size {
        PhysicalSize::new(
            config.desired_size.width.min(monitor.width),
            config.desired_size.height.min(monitor.height),
        )
    } else {
        config.desired_size
    };
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(initial_size)
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_size = SurfaceSize::new(window_size.width, window_size.height);

    let pixels = build_pixels(&window, surface_size, config.vsync)?;
    let renderer = PixelsRenderer2d::new_auto(pixels, surface_size)?;

    let mut ctx = AppContext {
        window,
        renderer,
        surface_size,
    };
    handler.init(&mut ctx)?;

    event_loop.run(move |event, _, control_flow| {
        handler.handle_event(event, control_flow, &mut ctx);
    });

    #[allow(unreachable_code)]
    Ok(())
}

fn build_pixels(
    window: &Window,
    size: SurfaceSize,
    vsync: Option<bool>,
) -> Result<Pixels, pixels::Error> {
    let surface_texture = SurfaceTexture::new(size.width, size.height, window);
    let mut builder = PixelsBuilder::new(size.width, size.height, surface_texture);
    if let Some(vsync) = vsync {
        builder = builder.enable_vsync(vsync);
    }
    builder.build()
}
