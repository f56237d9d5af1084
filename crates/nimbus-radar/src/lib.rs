//! Radar overlay playback for Nimbus
//!
//! Sequences precipitation radar frames on a map surface: one tile layer per
//! frame, a single visible layer at a time, and a timer that advances while
//! skipping frames whose tiles have not finished loading.

pub mod frame;
pub mod sequencer;
pub mod surface;
pub mod ticker;

pub use frame::{Frame, TileSource};
pub use sequencer::{RadarMode, RadarSequencer, SequencerOptions};
pub use surface::{GroupId, LayerId, MapSurface, PlaybackTimer};
pub use ticker::{IntervalTicker, Tick};
