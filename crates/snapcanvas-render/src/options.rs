use serde::{Deserialize, Serialize};
use snapcanvas_core::{CropWindow, Rgba};

use crate::error::{ExportError, Result};

/// Settings for a pixel export.
///
/// Field names follow the camelCase option bag, so
/// `{"multiplier": 2, "fixedLength": 200}` loads directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Uniform scale factor; 0 means 1.
    pub multiplier: f64,
    /// Crop window in unscaled pixels.
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Apply the surface's device pixel ratio on top of `multiplier`.
    pub enable_retina_scaling: bool,
    /// Single-object export: ignore the object's own scale, rotation and skew.
    pub without_transform: bool,
    /// Single-object export: normalize the longer side to this many pixels.
    pub fixed_length: Option<f64>,
    /// Single-object export: stroke width used for this export only.
    pub fixed_stroke_width: Option<f64>,
    /// Single-object export: scratch surface fill (white when unset).
    pub background_color: Option<Rgba>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            left: None,
            top: None,
            width: None,
            height: None,
            enable_retina_scaling: false,
            without_transform: false,
            fixed_length: None,
            fixed_stroke_width: None,
            background_color: None,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_crop(mut self, crop: CropWindow) -> Self {
        self.left = crop.left;
        self.top = crop.top;
        self.width = crop.width;
        self.height = crop.height;
        self
    }

    pub fn with_retina_scaling(mut self, enabled: bool) -> Self {
        self.enable_retina_scaling = enabled;
        self
    }

    pub fn without_transform(mut self) -> Self {
        self.without_transform = true;
        self
    }

    pub fn with_fixed_length(mut self, length: f64) -> Self {
        self.fixed_length = Some(length);
        self
    }

    pub fn with_fixed_stroke_width(mut self, width: f64) -> Self {
        self.fixed_stroke_width = Some(width);
        self
    }

    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn multiplier(&self) -> f64 {
        if self.multiplier == 0.0 {
            1.0
        } else {
            self.multiplier
        }
    }

    pub fn crop(&self) -> CropWindow {
        CropWindow {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }

    pub fn background(&self) -> Rgba {
        self.background_color.unwrap_or(Rgba::WHITE)
    }

    /// Reject option combinations that cannot produce an export.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ExportError::InvalidOptions(msg));

        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return invalid(format!("multiplier must be positive, got {}", self.multiplier));
        }
        validate_crop(&self.crop())?;
        if let Some(length) = self.fixed_length {
            if !length.is_finite() || length <= 0.0 {
                return invalid(format!("fixedLength must be positive, got {length}"));
            }
        }
        if let Some(width) = self.fixed_stroke_width {
            if !width.is_finite() || width < 0.0 {
                return invalid(format!("fixedStrokeWidth must not be negative, got {width}"));
            }
        }
        Ok(())
    }
}

/// Crop offsets must be finite; crop extents must also be non-negative.
pub(crate) fn validate_crop(crop: &CropWindow) -> Result<()> {
    for (name, value) in [("left", crop.left), ("top", crop.top)] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(ExportError::InvalidOptions(format!(
                    "crop {name} must be finite, got {v}"
                )));
            }
        }
    }
    for (name, value) in [("width", crop.width), ("height", crop.height)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(ExportError::InvalidOptions(format!(
                    "crop {name} must not be negative, got {v}"
                )));
            }
        }
    }
    Ok(())
}
