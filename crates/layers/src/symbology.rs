use foundation::color::RgbHex;

use crate::registry::GeometryKind;

/// Circle marker radius (px) for point features.
pub const POINT_RADIUS: f32 = 6.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fill {
    pub color: RgbHex,
    pub opacity: f32,
}

/// Stroke and optional fill for a rendered geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathStyle {
    pub color: RgbHex,
    pub weight: f32,
    pub opacity: f32,
    pub fill: Option<Fill>,
}

impl PathStyle {
    pub const fn new(color: RgbHex, weight: f32, opacity: f32, fill: Option<Fill>) -> Self {
        Self {
            color,
            weight,
            opacity,
            fill,
        }
    }

    /// Base style for a layer of the given geometry kind.
    pub fn for_layer(kind: GeometryKind, color: RgbHex) -> Self {
        match kind {
            GeometryKind::Line => Self::new(color, 2.5, 0.9, None),
            GeometryKind::Point => Self::new(
                color,
                2.0,
                1.0,
                Some(Fill {
                    color,
                    opacity: 0.8,
                }),
            ),
            GeometryKind::Polygon => Self::new(
                color,
                2.0,
                0.9,
                Some(Fill {
                    color,
                    opacity: 0.15,
                }),
            ),
        }
    }

    /// Style used when a point is drawn as a circle marker on top of this base.
    pub fn circle_marker(&self) -> Self {
        let fill_color = self.fill.map_or(self.color, |f| f.color);
        Self {
            weight: 2.0,
            fill: Some(Fill {
                color: fill_color,
                opacity: 0.7,
            }),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: RgbHex = RgbHex::new(0xef, 0x44, 0x44);

    #[test]
    fn line_has_no_fill() {
        let s = PathStyle::for_layer(GeometryKind::Line, RED);
        assert_eq!(s.weight, 2.5);
        assert_eq!(s.opacity, 0.9);
        assert!(s.fill.is_none());
    }

    #[test]
    fn polygon_fill_is_faint() {
        let s = PathStyle::for_layer(GeometryKind::Polygon, RED);
        assert_eq!(s.fill.unwrap().opacity, 0.15);
    }

    #[test]
    fn circle_marker_overrides_fill_opacity() {
        let base = PathStyle::for_layer(GeometryKind::Point, RED);
        assert_eq!(base.fill.unwrap().opacity, 0.8);
        let m = base.circle_marker();
        assert_eq!(m.fill, Some(Fill { color: RED, opacity: 0.7 }));
        assert_eq!(m.opacity, 1.0);
    }

    #[test]
    fn circle_marker_on_line_layer_fills_with_stroke_color() {
        let m = PathStyle::for_layer(GeometryKind::Line, RED).circle_marker();
        assert_eq!(m.fill.unwrap().color, RED);
        assert_eq!(m.weight, 2.0);
    }
}
