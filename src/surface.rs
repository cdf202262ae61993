use std::fmt;
use std::os::raw::c_void;
use std::str::FromStr;

use log::{error, info, warn};
use sdl2::messagebox::{show_simple_message_box, MessageBoxFlag};
use sdl2::video::{GLContext, GLProfile, Window};
use sdl2::{Sdl, VideoSubsystem};

use crate::render_gl::recording::RecordingContext;
use crate::render_gl::{GlContext, GraphicsContext};

/// Something that can be drawn on and can tell the user when drawing failed.
pub trait RenderSurface {
    type Context: GraphicsContext;

    /// Drawable size in pixels.
    fn client_size(&self) -> (u32, u32);

    fn acquire_context(&mut self) -> Result<Self::Context, String>;

    fn present(&mut self);

    fn report(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVersion {
    pub major: u8,
    pub minor: u8,
}

impl FromStr for GlVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, '.');
        let major = parts.next().unwrap_or_default();
        let minor = parts.next().unwrap_or("0");
        match (major.parse(), minor.parse()) {
            (Ok(major), Ok(minor)) => Ok(GlVersion { major, minor }),
            _ => Err(format!("expected <major>.<minor>, got `{}`", s)),
        }
    }
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Requested with the compatibility profile so unversioned GLSL compiles.
    pub gl_version: GlVersion,
    pub samples: u8,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "glquad".to_string(),
            width: 640,
            height: 480,
            gl_version: GlVersion { major: 2, minor: 1 },
            samples: 4,
        }
    }
}

struct SdlState {
    // dropped before the window it belongs to
    _gl_context: GLContext,
    window: Window,
    _video: VideoSubsystem,
    sdl: Sdl,
}

/// A window with an OpenGL context, created on first acquisition.
pub struct SdlSurface {
    config: SurfaceConfig,
    state: Option<SdlState>,
}

impl SdlSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Blocks until the window is closed or Escape is pressed.
    pub fn wait_for_close(&mut self) -> Result<(), String> {
        let state = match &self.state {
            Some(state) => state,
            None => return Ok(()),
        };

        let mut event_pump = state.sdl.event_pump()?;
        loop {
            use sdl2::event::Event;
            use sdl2::keyboard::Keycode;
            match event_pump.wait_event() {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break,
                _ => {}
            }
        }
        Ok(())
    }
}

impl RenderSurface for SdlSurface {
    type Context = GlContext;

    fn client_size(&self) -> (u32, u32) {
        match &self.state {
            Some(state) => state.window.drawable_size(),
            None => (self.config.width, self.config.height),
        }
    }

    fn acquire_context(&mut self) -> Result<GlContext, String> {
        let sdl = sdl2::init()?;
        let video = sdl.video()?;

        {
            let gl_attr = video.gl_attr();
            gl_attr.set_context_profile(GLProfile::Compatibility);
            gl_attr.set_context_version(self.config.gl_version.major, self.config.gl_version.minor);
            gl_attr.set_depth_size(24);
            if self.config.samples > 0 {
                gl_attr.set_multisample_buffers(1);
                gl_attr.set_multisample_samples(self.config.samples);
            }
        }

        let window = video
            .window(&self.config.title, self.config.width, self.config.height)
            .opengl()
            .resizable()
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let gl_context = window.gl_create_context()?;
        let context = GlContext::load_with(|s| video.gl_get_proc_address(s) as *const c_void);
        let (major, minor) = video.gl_attr().context_version();
        info!("OK: init OpenGL: version={}.{}", major, minor);

        self.state = Some(SdlState {
            _gl_context: gl_context,
            window,
            _video: video,
            sdl,
        });
        Ok(context)
    }

    fn present(&mut self) {
        if let Some(state) = &self.state {
            state.window.gl_swap_window();
        }
    }

    fn report(&mut self, message: &str) {
        error!("{}", message);
        let window = self.state.as_ref().map(|state| &state.window);
        if let Err(e) =
            show_simple_message_box(MessageBoxFlag::ERROR, &self.config.title, message, window)
        {
            warn!("could not show message box: {}", e);
        }
    }
}

pub struct HeadlessSurface {
    width: u32,
    height: u32,
    available: bool,
    recorder: RecordingContext,
    reports: Vec<String>,
    presented: usize,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            available: true,
            recorder: RecordingContext::new(),
            reports: vec![],
            presented: 0,
        }
    }

    pub fn unavailable(width: u32, height: u32) -> Self {
        Self {
            available: false,
            ..Self::new(width, height)
        }
    }

    /// Shares state with every context this surface hands out.
    pub fn recorder(&self) -> &RecordingContext {
        &self.recorder
    }

    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl RenderSurface for HeadlessSurface {
    type Context = RecordingContext;

    fn client_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn acquire_context(&mut self) -> Result<RecordingContext, String> {
        if self.available {
            Ok(self.recorder.clone())
        } else {
            Err("headless surface has no context".to_string())
        }
    }

    fn present(&mut self) {
        self.presented += 1;
    }

    fn report(&mut self, message: &str) {
        error!("{}", message);
        self.reports.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gl_version() {
        assert_eq!("3.3".parse::<GlVersion>(), Ok(GlVersion { major: 3, minor: 3 }));
        assert_eq!("4".parse::<GlVersion>(), Ok(GlVersion { major: 4, minor: 0 }));
        assert!("x.1".parse::<GlVersion>().is_err());
        assert_eq!(GlVersion { major: 2, minor: 1 }.to_string(), "2.1");
    }

    #[test]
    fn unavailable_headless_surface_refuses_context() {
        let mut surface = HeadlessSurface::unavailable(10, 10);
        assert!(surface.acquire_context().is_err());
    }

    #[test]
    fn headless_context_shares_the_recorder() {
        use crate::render_gl::ClearMask;

        let mut surface = HeadlessSurface::new(10, 10);
        let mut gl = surface.acquire_context().unwrap();
        gl.clear(ClearMask::COLOR_DEPTH);
        assert_eq!(surface.recorder().calls().len(), 1);
    }

    #[test]
    fn sdl_surface_reports_configured_size_before_acquisition() {
        let surface = SdlSurface::new(SurfaceConfig {
            width: 320,
            height: 200,
            ..SurfaceConfig::default()
        });
        assert_eq!(surface.client_size(), (320, 200));
    }
}
