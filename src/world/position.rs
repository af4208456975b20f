use serde::{Deserialize, Serialize};

/// World placement of a spawned object: map coordinates plus facing in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub orientation: f32,
}

/// Offset expressed in the local frame of an anchor object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionDelta {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    #[serde(default)]
    pub d_orientation: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32, orientation: f32) -> Self {
        Self {
            x,
            y,
            z,
            orientation: normalize_orientation(orientation),
        }
    }

    /// Places `delta` relative to this position, rotating it by this position's orientation.
    pub fn offset(self, delta: PositionDelta) -> Self {
        let (sin, cos) = self.orientation.sin_cos();
        Self {
            x: self.x + delta.dx * cos - delta.dy * sin,
            y: self.y + delta.dx * sin + delta.dy * cos,
            z: self.z + delta.dz,
            orientation: normalize_orientation(self.orientation + delta.d_orientation),
        }
    }
}

fn normalize_orientation(orientation: f32) -> f32 {
    let full = std::f32::consts::TAU;
    let wrapped = orientation % full;
    if wrapped < 0.0 {
        wrapped + full
    } else {
        wrapped
    }
}
