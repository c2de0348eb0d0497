/// Window width (logical px) below which the compact presets apply.
pub const COMPACT_WIDTH_THRESHOLD: f32 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportClass {
    Compact,
    Standard,
}

impl ViewportClass {
    pub fn classify(width: f32, threshold: f32) -> Self {
        if width < threshold {
            ViewportClass::Compact
        } else {
            ViewportClass::Standard
        }
    }

    pub fn is_compact(self) -> bool {
        matches!(self, ViewportClass::Compact)
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewportClass::Compact => "compact",
            ViewportClass::Standard => "standard",
        }
    }
}

/// Viewport dimensions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Converts a physical window size using the window's scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self::new(
            (width as f64 / scale) as f32,
            (height as f64 / scale) as f32,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}
