use serde::{Deserialize, Serialize};

/// Size of the drawable area in logical pixels plus the device pixel ratio.
///
/// The backing buffer is `floor(logical * pixel_ratio)` in each dimension,
/// unless the viewport was built from a known surface size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    #[serde(skip)]
    physical: Option<(u32, u32)>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            pixel_ratio: 1.0,
            physical: None,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
            physical: None,
        }
    }

    /// Build from a physical surface size and the window's scale factor.
    ///
    /// The surface size is kept as-is so fractional scale factors do not
    /// lose a device pixel on the way back.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let ratio = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            width: (width as f64 / ratio) as f32,
            height: (height as f64 / ratio) as f32,
            pixel_ratio: ratio as f32,
            physical: Some((width, height)),
        }
    }

    /// Width over height. A zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    /// Backing buffer size in device pixels, never smaller than 1x1.
    pub fn physical_size(&self) -> (u32, u32) {
        if let Some((w, h)) = self.physical {
            return (w.max(1), h.max(1));
        }
        let w = (self.width * self.pixel_ratio).floor() as u32;
        let h = (self.height * self.pixel_ratio).floor() as u32;
        (w.max(1), h.max(1))
    }
}
