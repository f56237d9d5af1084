//! Radar frame playback.
//!
//! Keeps one tile layer per frame, all stacked in a single overlay group, and
//! makes exactly one of them visible at a time. `frames`, `loaded`, `pending`
//! and `layers` always have the same length.

use std::time::Duration;

use nimbus_core::RadarConfig;

use crate::frame::{Frame, TileSource};
use crate::surface::{GroupId, LayerId, MapSurface, PlaybackTimer};

const FRAME_Z_BASE: i32 = 400;
const STATIC_Z: i32 = 450;
const GROUP_NAME: &str = "Radar";

/// Playback tuning.
#[derive(Debug, Clone)]
pub struct SequencerOptions {
    /// Opacity of the visible layer
    pub opacity: f32,
    pub step: Duration,
    /// Floor applied to `step`
    pub min_step: Duration,
    /// Start the timer as soon as frames are available
    pub autoplay: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            opacity: 0.7,
            step: Duration::from_millis(800),
            min_step: Duration::from_millis(200),
            autoplay: true,
        }
    }
}

impl From<&RadarConfig> for SequencerOptions {
    fn from(config: &RadarConfig) -> Self {
        Self {
            opacity: config.opacity,
            step: Duration::from_millis(config.step_ms),
            min_step: Duration::from_millis(config.min_step_ms),
            autoplay: config.autoplay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarMode {
    /// Nothing on the map
    Empty,
    /// One layer per frame with playback
    Animated,
    /// Single "latest" layer, no playback controls
    Static,
}

pub struct RadarSequencer<S: MapSurface, T: PlaybackTimer> {
    surface: S,
    timer: T,
    tiles: TileSource,
    options: SequencerOptions,
    mode: RadarMode,
    group: Option<GroupId>,
    static_layer: Option<LayerId>,
    frames: Vec<Frame>,
    layers: Vec<LayerId>,
    loaded: Vec<bool>,
    pending: Vec<u32>,
    current: usize,
    playing: bool,
}

impl<S: MapSurface, T: PlaybackTimer> RadarSequencer<S, T> {
    pub fn new(surface: S, timer: T, tiles: TileSource, mut options: SequencerOptions) -> Self {
        options.step = options.step.max(options.min_step);
        let playing = options.autoplay;
        Self {
            surface,
            timer,
            tiles,
            options,
            mode: RadarMode::Empty,
            group: None,
            static_layer: None,
            frames: Vec::new(),
            layers: Vec::new(),
            loaded: Vec::new(),
            pending: Vec::new(),
            current: 0,
            playing,
        }
    }

    /// Replace the frame set. An empty listing falls back to a static layer.
    pub fn initialize(&mut self, frames: Vec<Frame>) {
        self.clear_layers();

        let group = self.surface.add_overlay_group(GROUP_NAME);
        self.group = Some(group);

        if frames.is_empty() {
            tracing::info!("No radar frames available, showing latest tile layer");
            let url = self.tiles.fallback_url();
            let layer =
                self.surface
                    .add_tile_layer(group, &url, self.options.opacity, STATIC_Z);
            self.static_layer = Some(layer);
            self.mode = RadarMode::Static;
            self.timer.stop();
            return;
        }

        for (i, frame) in frames.iter().enumerate() {
            let url = self.tiles.url_for_path(&frame.path);
            let z = FRAME_Z_BASE + i32::try_from(i).unwrap_or(i32::MAX - FRAME_Z_BASE);
            let layer = self.surface.add_tile_layer(group, &url, 0.0, z);
            self.layers.push(layer);
            self.loaded.push(false);
            self.pending.push(0);
        }
        self.frames = frames;
        self.mode = RadarMode::Animated;

        tracing::debug!("Radar initialized with {} frames", self.frames.len());

        let last = self.frames.len() - 1;
        self.show_frame(last as i64);

        if self.playing {
            self.timer.start(self.options.step);
        }
    }

    /// Show the frame at `index` clamped into range and make it current.
    /// Returns the index actually shown.
    pub fn show_frame(&mut self, index: i64) -> Option<usize> {
        let len = self.layers.len();
        if len == 0 {
            return None;
        }
        let clamped = index.clamp(0, len as i64 - 1) as usize;

        for (i, layer) in self.layers.iter().enumerate() {
            let opacity = if i == clamped { self.options.opacity } else { 0.0 };
            self.surface.set_opacity(*layer, opacity);
        }
        self.surface.bring_to_front(self.layers[clamped]);
        self.current = clamped;
        Some(clamped)
    }

    /// Manual override. Autoplay continues from wherever this lands.
    pub fn scrub(&mut self, index: i64) -> Option<usize> {
        let shown = self.show_frame(index);
        tracing::trace!("Radar scrubbed to {:?}", shown);
        shown
    }

    /// Step to the next frame, skipping frames whose tiles are still loading.
    /// If nothing is loaded the plain next frame is used so playback never stalls.
    pub fn advance(&mut self) -> Option<usize> {
        let len = self.layers.len();
        if len == 0 {
            return None;
        }
        let next = (self.current + 1) % len;
        let target = (0..len)
            .map(|offset| (next + offset) % len)
            .find(|&i| self.loaded[i])
            .unwrap_or(next);
        self.show_frame(target as i64)
    }

    /// Timer callback.
    pub fn on_tick(&mut self) -> Option<usize> {
        if !self.playing || self.mode != RadarMode::Animated {
            return None;
        }
        self.advance()
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        if playing && self.mode == RadarMode::Animated {
            self.timer.start(self.options.step);
        } else {
            self.timer.stop();
        }
    }

    pub fn toggle_playing(&mut self) -> bool {
        self.set_playing(!self.playing);
        self.playing
    }

    /// Change the frame interval. Values below the floor are raised to it.
    pub fn set_step(&mut self, step: Duration) {
        self.options.step = step.max(self.options.min_step);
        if self.timer.is_running() {
            self.timer.start(self.options.step);
        }
    }

    /// A layer started fetching a tile.
    pub fn on_tile_loading(&mut self, index: usize) {
        if let Some(pending) = self.pending.get_mut(index) {
            *pending += 1;
        }
    }

    /// A layer finished a tile; the frame counts as loaded once nothing is pending.
    pub fn on_tile_loaded(&mut self, index: usize) {
        if let Some(pending) = self.pending.get_mut(index) {
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                self.loaded[index] = true;
            }
        }
    }

    /// Stop playback and remove everything this sequencer put on the map.
    pub fn teardown(&mut self) {
        self.timer.stop();
        self.clear_layers();
        tracing::debug!("Radar torn down");
    }

    fn clear_layers(&mut self) {
        for layer in self.layers.drain(..) {
            self.surface.remove_layer(layer);
        }
        if let Some(layer) = self.static_layer.take() {
            self.surface.remove_layer(layer);
        }
        if let Some(group) = self.group.take() {
            self.surface.remove_group(group);
        }
        self.frames.clear();
        self.loaded.clear();
        self.pending.clear();
        self.current = 0;
        self.mode = RadarMode::Empty;
    }

    pub fn mode(&self) -> RadarMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether play/pause and the scrubber should be offered.
    pub fn has_controls(&self) -> bool {
        self.mode == RadarMode::Animated
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.layers.is_empty()).then_some(self.current)
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.loaded.get(index).copied().unwrap_or(false)
    }

    pub fn step(&self) -> Duration {
        self.options.step
    }

    /// Label for the scrubber, "Radar" when no timed frame is showing.
    pub fn frame_label(&self, timezone: &str) -> String {
        self.current_frame()
            .map(|f| f.label(timezone))
            .unwrap_or_else(|| "Radar".to_string())
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
