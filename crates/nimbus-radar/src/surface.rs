//! Seams between the sequencer and the host map widget / timer.

use std::time::Duration;

/// Handle to a tile layer owned by the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Handle to a toggleable overlay group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u64);

/// The map operations the sequencer needs.
///
/// Implementations must tolerate calls on layers the widget already dropped.
pub trait MapSurface {
    fn add_overlay_group(&mut self, name: &str) -> GroupId;

    fn add_tile_layer(&mut self, group: GroupId, url: &str, opacity: f32, z_index: i32)
        -> LayerId;

    fn set_opacity(&mut self, layer: LayerId, opacity: f32);

    fn bring_to_front(&mut self, layer: LayerId);

    fn remove_layer(&mut self, layer: LayerId);

    fn remove_group(&mut self, group: GroupId);
}

/// A repeating timer. Each firing should end up in `RadarSequencer::on_tick`.
pub trait PlaybackTimer {
    fn start(&mut self, interval: Duration);

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}
