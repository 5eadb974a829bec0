//! Resolved per-feature styling handed to the adapter.

use serde::{Deserialize, Serialize};

/// Style of one feature, resolved by its owning mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureStyle {
    pub point_color: String,
    pub point_width: f64,
    pub point_outline_color: String,
    pub point_outline_width: f64,
    pub line_string_color: String,
    pub line_string_width: f64,
    pub polygon_fill_color: String,
    pub polygon_fill_opacity: f64,
    pub polygon_outline_color: String,
    pub polygon_outline_width: f64,
    /// Draw order; higher values are drawn above lower ones.
    pub z_index: i32,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            point_color: "#3f97e0".to_string(),
            point_width: 6.0,
            point_outline_color: "#ffffff".to_string(),
            point_outline_width: 0.0,
            line_string_color: "#3f97e0".to_string(),
            line_string_width: 4.0,
            polygon_fill_color: "#3f97e0".to_string(),
            polygon_fill_opacity: 0.3,
            polygon_outline_color: "#3f97e0".to_string(),
            polygon_outline_width: 4.0,
            z_index: 0,
        }
    }
}

/// Fill, outline and marker colours a drawing mode applies to its shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeStyles {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub outline_color: String,
    pub outline_width: f64,
    pub line_color: String,
    pub line_width: f64,
    pub point_color: String,
    pub point_width: f64,
    /// Closing-point marker colour.
    pub closing_point_color: String,
    pub closing_point_width: f64,
    pub closing_point_outline_color: String,
    pub closing_point_outline_width: f64,
}

impl Default for ShapeStyles {
    fn default() -> Self {
        let base = FeatureStyle::default();
        Self {
            fill_color: base.polygon_fill_color,
            fill_opacity: base.polygon_fill_opacity,
            outline_color: base.polygon_outline_color,
            outline_width: base.polygon_outline_width,
            line_color: base.line_string_color,
            line_width: base.line_string_width,
            point_color: base.point_color,
            point_width: base.point_width,
            closing_point_color: "#ffffff".to_string(),
            closing_point_width: 6.0,
            closing_point_outline_color: "#3f97e0".to_string(),
            closing_point_outline_width: 2.0,
        }
    }
}

impl ShapeStyles {
    /// Style for a shape owned by the mode.
    #[must_use]
    pub fn shape(&self) -> FeatureStyle {
        FeatureStyle {
            point_color: self.point_color.clone(),
            point_width: self.point_width,
            line_string_color: self.line_color.clone(),
            line_string_width: self.line_width,
            polygon_fill_color: self.fill_color.clone(),
            polygon_fill_opacity: self.fill_opacity,
            polygon_outline_color: self.outline_color.clone(),
            polygon_outline_width: self.outline_width,
            ..FeatureStyle::default()
        }
    }

    /// Style for the mode's closing-point markers, drawn above shapes.
    #[must_use]
    pub fn closing_point(&self) -> FeatureStyle {
        FeatureStyle {
            point_color: self.closing_point_color.clone(),
            point_width: self.closing_point_width,
            point_outline_color: self.closing_point_outline_color.clone(),
            point_outline_width: self.closing_point_outline_width,
            z_index: 30,
            ..FeatureStyle::default()
        }
    }
}
