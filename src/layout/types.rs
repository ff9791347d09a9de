use crate::fonts::FontWeight;

/// Map layers in the order they are painted, bottom first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapLayer {
    MarineWater,
    LandCover,
    Buildings,
    Roads,
    Railways,
    Parks,
    InlandWater,
}

impl MapLayer {
    pub const ALL: [MapLayer; 7] = [
        MapLayer::MarineWater,
        MapLayer::LandCover,
        MapLayer::Buildings,
        MapLayer::Roads,
        MapLayer::Railways,
        MapLayer::Parks,
        MapLayer::InlandWater,
    ];

    /// Group id used in the SVG output.
    pub fn id(self) -> &'static str {
        match self {
            MapLayer::MarineWater => "marine-water",
            MapLayer::LandCover => "land-cover",
            MapLayer::Buildings => "buildings",
            MapLayer::Roads => "roads",
            MapLayer::Railways => "railways",
            MapLayer::Parks => "parks",
            MapLayer::InlandWater => "inland-water",
        }
    }
}

/// A drawable in canvas coordinates (points, y down).
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled polygon; the first ring is the exterior, the rest are holes.
    Area {
        rings: Vec<Vec<(f32, f32)>>,
        fill: String,
    },
    Line {
        points: Vec<(f32, f32)>,
        stroke: String,
        width: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerLayout {
    pub layer: MapLayer,
    pub shapes: Vec<Shape>,
}

/// Which edge of a gradient band is fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueEdge {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientBand {
    pub id: &'static str,
    pub y: f32,
    pub height: f32,
    pub color: String,
    pub opaque: OpaqueEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub text: String,
    pub size: f32,
    pub weight: FontWeight,
    pub anchor: TextAnchor,
    pub fill: String,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub stroke: String,
    pub width: f32,
}

/// Everything the SVG writer needs, already positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterLayout {
    /// Canvas size in points.
    pub width: f32,
    pub height: f32,
    /// Physical size in inches.
    pub width_in: f32,
    pub height_in: f32,
    pub background: String,
    pub font_family: String,
    pub layers: Vec<LayerLayout>,
    pub gradients: Vec<GradientBand>,
    pub divider: Rule,
    pub texts: Vec<TextItem>,
}

impl PosterLayout {
    pub fn layer(&self, layer: MapLayer) -> Option<&LayerLayout> {
        self.layers.iter().find(|l| l.layer == layer)
    }
}
