//! The zoom/pan/fade animation engine.
//!
//! A small continuous-time state machine driven by variable frame deltas: it
//! owns zoom level, pan position, opacity and the per-image display timer,
//! and emits one [`FrameState`] per tick. Everything here is pure state
//! arithmetic; window lifecycle, input and image decoding live elsewhere and
//! drive this engine through [`ZoomPanFadeEngine::advance`] and
//! [`ZoomPanFadeEngine::reset`].

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

use crate::config::AnimationOptions;

/// Size of the output surface in pixels. Supplied externally and may change
/// between frames (monitor resize); a zero dimension makes frames no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    const fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Source-pixel dimensions of the image currently on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageExtent {
    pub width: u32,
    pub height: u32,
}

impl ImageExtent {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Stage of the display/fade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Showing,
    FadingOut,
    FadingIn,
}

/// Uniform scale followed by a translate, mapping image-pixel coordinates to
/// viewport coordinates. The translate is applied in the scaled space, so the
/// visible window is exactly `[position, position + viewport/scale]` in image
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2D {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine2D {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    fn from_zoom_pan(zoom: f32, position: Vec2) -> Self {
        Self {
            scale: zoom,
            tx: -position.x * zoom,
            ty: -position.y * zoom,
        }
    }

    /// Map an image-pixel coordinate into viewport coordinates.
    #[must_use]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.tx, y * self.scale + self.ty)
    }
}

/// Per-tick output consumed by rendering.
#[derive(Debug, Clone, Copy)]
pub struct FrameState {
    pub transform: Affine2D,
    pub opacity: f32,
    /// Set on exactly one tick per cycle, when the fade-out bottoms at zero.
    /// The caller should swap in the next image and call `reset` with its
    /// extent before the next `advance`.
    pub advance_image: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Vec2 {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
struct AnimationState {
    zoom: f32,
    zoom_velocity: f32,
    position: Vec2,
    pan_velocity: Vec2,
    opacity: f32,
    phase: Phase,
    remaining_display_ms: f32,
}

/// The animation engine. Owns all mutable animation state; mutated only by
/// `advance` and `reset`, so a single driver thread is the whole concurrency
/// story.
///
/// Randomness is injected so tests can seed it deterministically.
pub struct ZoomPanFadeEngine<R: Rng = StdRng> {
    opts: AnimationOptions,
    rng: R,
    state: AnimationState,
    extent: Option<ImageExtent>,
    viewport: Viewport,
    last_transform: Affine2D,
}

impl ZoomPanFadeEngine<StdRng> {
    #[must_use]
    pub fn new(opts: AnimationOptions) -> Self {
        Self::with_rng(opts, StdRng::from_os_rng())
    }
}

impl<R: Rng> ZoomPanFadeEngine<R> {
    pub fn with_rng(opts: AnimationOptions, rng: R) -> Self {
        let state = AnimationState {
            zoom: opts.zoom_out_limit,
            zoom_velocity: 0.0,
            position: Vec2::default(),
            pan_velocity: Vec2::default(),
            opacity: 0.0,
            phase: Phase::Showing,
            remaining_display_ms: opts.dwell_ms as f32,
        };
        Self {
            opts,
            rng,
            state,
            extent: None,
            viewport: Viewport::new(0, 0),
            last_transform: Affine2D::IDENTITY,
        }
    }

    /// Bind a new image to the engine and re-seed the animation.
    ///
    /// Zoom returns to the floor, zoom direction and pan velocity are
    /// re-randomized, and the initial crop is drawn uniformly from the range
    /// that keeps the scaled image covering the viewport. A zero-sized extent
    /// is undisplayable: the engine idles at opacity 0 until the next reset.
    ///
    /// When called mid fade-in (the normal image-swap moment) the fade phase
    /// and current opacity are preserved so the incoming image ramps up from
    /// the level the outgoing one left, instead of popping to full.
    pub fn reset(&mut self, extent: ImageExtent, viewport: Viewport) {
        self.viewport = viewport;
        if extent.width == 0 || extent.height == 0 {
            warn!(
                width = extent.width,
                height = extent.height,
                "undisplayable image extent; engine idling"
            );
            self.extent = None;
            self.state.opacity = 0.0;
            return;
        }
        self.extent = Some(extent);

        let zoom = self.opts.zoom_out_limit;
        self.state.zoom = zoom;
        self.state.zoom_velocity = self.random_sign() * self.opts.zoom_speed;
        self.state.pan_velocity = Vec2 {
            x: self.random_sign() * self.random_pan_magnitude(),
            y: self.random_sign() * self.random_pan_magnitude(),
        };

        let max_x = (extent.width as f32 * zoom - viewport.width as f32).max(0.0);
        let max_y = (extent.height as f32 * zoom - viewport.height as f32).max(0.0);
        self.state.position = Vec2 {
            x: self.rng.random_range(0.0..=max_x),
            y: self.rng.random_range(0.0..=max_y),
        };

        self.state.remaining_display_ms = self.opts.dwell_ms as f32;
        if self.state.phase != Phase::FadingIn {
            self.state.phase = Phase::Showing;
            self.state.opacity = 1.0;
        }
    }

    /// Inform the engine that the output surface changed size.
    pub const fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// The single per-frame update. `dt_secs` must be non-negative; a zero
    /// delta is a legal no-op frame.
    pub fn advance(&mut self, dt_secs: f32) -> FrameState {
        let dt = if dt_secs.is_finite() {
            dt_secs.max(0.0)
        } else {
            0.0
        };

        let Some(extent) = self.extent else {
            // Safe idle state: no image bound (empty sequence or degenerate
            // extent). Repeat the last transform, fully transparent.
            return FrameState {
                transform: self.last_transform,
                opacity: 0.0,
                advance_image: false,
            };
        };
        if self.viewport.is_degenerate() {
            return FrameState {
                transform: self.last_transform,
                opacity: self.state.opacity,
                advance_image: false,
            };
        }

        // 1. Zoom integration. Hard clamp at the limits, not just a sign
        // reversal: a large dt spike must not drift past a bound before the
        // next reversal check.
        self.state.zoom += self.state.zoom_velocity * dt;
        if self.state.zoom > self.opts.zoom_in_limit {
            self.state.zoom = self.opts.zoom_in_limit;
            self.state.zoom_velocity = -self.state.zoom_velocity.abs();
        } else if self.state.zoom < self.opts.zoom_out_limit {
            self.state.zoom = self.opts.zoom_out_limit;
            self.state.zoom_velocity = self.state.zoom_velocity.abs();
        }

        // 2. Pan integration.
        self.state.position.x += self.state.pan_velocity.x * dt;
        self.state.position.y += self.state.pan_velocity.y * dt;

        // 3. Per-axis bounds. Each axis bounces independently; simultaneous
        // bounces are legal.
        let max_x = extent.width as f32 * self.state.zoom - self.viewport.width as f32;
        let max_y = extent.height as f32 * self.state.zoom - self.viewport.height as f32;
        bounce_axis(
            &mut self.state.position.x,
            &mut self.state.pan_velocity.x,
            max_x,
            self.opts.pan_speed,
            self.opts.pan_speed_jitter,
            &mut self.rng,
        );
        bounce_axis(
            &mut self.state.position.y,
            &mut self.state.pan_velocity.y,
            max_y,
            self.opts.pan_speed,
            self.opts.pan_speed_jitter,
            &mut self.rng,
        );

        // 4. Display countdown, active only while showing.
        if self.state.phase == Phase::Showing {
            self.state.remaining_display_ms -= dt * 1000.0;
            if self.state.remaining_display_ms <= 0.0 {
                self.state.phase = Phase::FadingOut;
            }
        }

        // 5. Fade update. One rate for both legs, derived from fade-ms, so
        // fade speed tracks the same dt as zoom and pan.
        let rate = self.opts.fade_rate_per_sec();
        let mut advance_image = false;
        match self.state.phase {
            Phase::Showing => {
                self.state.opacity = self.state.opacity.min(1.0);
            }
            Phase::FadingOut => {
                self.state.opacity -= rate * dt;
                if self.state.opacity <= 0.0 {
                    self.state.opacity = 0.0;
                    advance_image = true;
                    self.state.phase = Phase::FadingIn;
                }
            }
            Phase::FadingIn => {
                self.state.opacity += rate * dt;
                if self.state.opacity >= 1.0 {
                    self.state.opacity = 1.0;
                    self.state.phase = Phase::Showing;
                    self.state.remaining_display_ms = self.opts.dwell_ms as f32;
                }
            }
        }

        let transform = Affine2D::from_zoom_pan(self.state.zoom, self.state.position);
        self.last_transform = transform;
        FrameState {
            transform,
            opacity: self.state.opacity,
            advance_image,
        }
    }

    /// Whether the engine currently has no displayable image bound.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.extent.is_none()
    }

    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.state.zoom
    }

    #[must_use]
    pub const fn zoom_velocity(&self) -> f32 {
        self.state.zoom_velocity
    }

    #[must_use]
    pub const fn position(&self) -> (f32, f32) {
        (self.state.position.x, self.state.position.y)
    }

    #[must_use]
    pub const fn pan_velocity(&self) -> (f32, f32) {
        (self.state.pan_velocity.x, self.state.pan_velocity.y)
    }

    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.state.opacity
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub const fn remaining_display_ms(&self) -> f32 {
        self.state.remaining_display_ms
    }

    fn random_sign(&mut self) -> f32 {
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }

    fn random_pan_magnitude(&mut self) -> f32 {
        let [lo, hi] = self.opts.pan_speed_jitter;
        self.opts.pan_speed * self.rng.random_range(lo..=hi)
    }
}

/// Clamp one pan axis into `[0, max_visible]` and bounce on overshoot.
///
/// When the scaled image does not cover the viewport on this axis
/// (`max_visible < 0`) the position pins to the origin and the velocity is
/// left alone: there is nothing to bounce against.
fn bounce_axis<R: Rng>(
    pos: &mut f32,
    vel: &mut f32,
    max_visible: f32,
    base_speed: f32,
    jitter: [f32; 2],
    rng: &mut R,
) {
    if max_visible < 0.0 {
        *pos = 0.0;
        return;
    }
    let raw = *pos;
    *pos = raw.clamp(0.0, max_visible);
    if raw < 0.0 {
        *vel = base_speed * rng.random_range(jitter[0]..=jitter[1]);
    } else if raw > max_visible {
        *vel = -(base_speed * rng.random_range(jitter[0]..=jitter[1]));
    }
}
