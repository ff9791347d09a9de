//! Projects map data onto the poster canvas and positions the typography.

mod text;
pub(crate) mod types;

pub use text::{city_font_size, city_title, format_coordinates, is_latin_script};
pub use types::*;

use crate::crop::{CropBox, crop_box};
use crate::error::{PosterError, Result};
use crate::fonts::{FontBundle, FontWeight};
use crate::model::{Feature, FeatureCollection, Geometry, LatLon, MapData, PosterSpec};
use crate::projection::LocalProjection;
use crate::roads::RoadClass;
use crate::theme::Theme;
use text::{ATTRIBUTION_PT, COORDS_PT, COUNTRY_PT, fit_title};
use tracing::debug;

pub const POINTS_PER_INCH: f32 = 72.0;
/// Poster side length at which typography is drawn at its base size.
const REFERENCE_SIDE_IN: f32 = 12.0;
const RAILWAY_WIDTH: f32 = 1.8;
const ATTRIBUTION_TEXT: &str = "© OpenStreetMap contributors";
const MARINE_VALUES: [&str; 4] = ["sea", "ocean", "bay", "strait"];

/// Maps projected meters onto canvas points, y flipped.
struct Canvas {
    projection: LocalProjection,
    crop: CropBox,
    scale: f64,
}

impl Canvas {
    fn to_canvas(&self, point: LatLon) -> (f32, f32) {
        let (x, y) = self.projection.project(point);
        (
            ((x - self.crop.min_x) * self.scale) as f32,
            ((self.crop.max_y - y) * self.scale) as f32,
        )
    }

    fn ring(&self, points: &[LatLon]) -> Vec<(f32, f32)> {
        points.iter().map(|p| self.to_canvas(*p)).collect()
    }

    fn visible(&self, points: &[LatLon]) -> bool {
        let projected: Vec<(f64, f64)> = points
            .iter()
            .map(|p| self.projection.project(*p))
            .collect();
        CropBox::around(&projected).is_some_and(|bounds| bounds.intersects(&self.crop))
    }

    fn area(&self, feature: &Feature, fill: &str) -> Option<Shape> {
        let Geometry::Polygon { exterior, holes } = &feature.geometry else {
            return None;
        };
        if exterior.len() < 3 || !self.visible(exterior) {
            return None;
        }
        let mut rings = Vec::with_capacity(holes.len() + 1);
        rings.push(self.ring(exterior));
        rings.extend(holes.iter().filter(|h| h.len() >= 3).map(|h| self.ring(h)));
        Some(Shape::Area {
            rings,
            fill: fill.to_string(),
        })
    }

    fn line(&self, feature: &Feature, stroke: &str, width: f32) -> Option<Shape> {
        let Geometry::LineString { points } = &feature.geometry else {
            return None;
        };
        if points.len() < 2 || !self.visible(points) {
            return None;
        }
        Some(Shape::Line {
            points: self.ring(points),
            stroke: stroke.to_string(),
            width,
        })
    }

    fn areas<'a>(&self, features: impl IntoIterator<Item = &'a Feature>, fill: &str) -> Vec<Shape> {
        features
            .into_iter()
            .filter_map(|feature| self.area(feature, fill))
            .collect()
    }
}

fn is_marine(feature: &Feature) -> bool {
    ["natural", "water", "place"]
        .iter()
        .filter_map(|key| feature.tag(key))
        .any(|value| MARINE_VALUES.contains(&value))
}

fn road_shapes(canvas: &Canvas, streets: &FeatureCollection, theme: &Theme) -> Vec<Shape> {
    let mut classified: Vec<(RoadClass, &Feature)> = streets
        .lines()
        .map(|feature| (RoadClass::from_osm_value(feature.tag("highway")), feature))
        .collect();
    // Major roads paint over minor ones.
    classified.sort_by(|a, b| a.0.width().total_cmp(&b.0.width()));
    classified
        .into_iter()
        .filter_map(|(class, feature)| canvas.line(feature, class.color(theme), class.width()))
        .collect()
}

/// Lays out one poster. Output depends only on the inputs, so identical
/// inputs give identical layouts.
pub fn compute_layout(
    spec: &PosterSpec,
    theme: &Theme,
    data: &MapData,
    fonts: &FontBundle,
) -> Result<PosterLayout> {
    if !(spec.width > 0.0 && spec.height > 0.0) {
        return Err(PosterError::Render(format!(
            "poster size must be positive, got {}x{} in",
            spec.width, spec.height
        )));
    }
    if spec.radius_m == 0 {
        return Err(PosterError::Render("distance must be positive".to_string()));
    }

    let width = spec.width * POINTS_PER_INCH;
    let height = spec.height * POINTS_PER_INCH;
    let crop = crop_box(spec.radius_m as f64, spec.aspect());
    let canvas = Canvas {
        projection: LocalProjection::new(spec.location.point)?,
        scale: width as f64 / crop.width(),
        crop,
    };

    let marine = if data.coastline.is_empty() {
        Vec::new()
    } else {
        canvas.areas(data.maritime.polygons(), &theme.water)
    };
    let inland = canvas.areas(
        data.water.polygons().filter(|feature| !is_marine(feature)),
        &theme.water,
    );
    let railways = data
        .railways
        .lines()
        .filter_map(|feature| canvas.line(feature, &theme.road_primary, RAILWAY_WIDTH))
        .collect();

    let layers = vec![
        LayerLayout {
            layer: MapLayer::MarineWater,
            shapes: marine,
        },
        LayerLayout {
            layer: MapLayer::LandCover,
            shapes: canvas.areas(data.land_cover.polygons(), &theme.bg),
        },
        LayerLayout {
            layer: MapLayer::Buildings,
            shapes: canvas.areas(data.buildings.polygons(), theme.buildings_color()),
        },
        LayerLayout {
            layer: MapLayer::Roads,
            shapes: road_shapes(&canvas, &data.streets, theme),
        },
        LayerLayout {
            layer: MapLayer::Railways,
            shapes: railways,
        },
        LayerLayout {
            layer: MapLayer::Parks,
            shapes: canvas.areas(data.parks.polygons(), &theme.parks),
        },
        LayerLayout {
            layer: MapLayer::InlandWater,
            shapes: inland,
        },
    ];
    for layer in &layers {
        debug!(
            layer = layer.layer.id(),
            shapes = layer.shapes.len(),
            "layer laid out"
        );
    }

    let fade = spec.gradient_height.clamp(0.0, 0.5) * height;
    let gradients = if fade > 0.0 {
        vec![
            GradientBand {
                id: "fade-bottom",
                y: height - fade,
                height: fade,
                color: theme.gradient_color.clone(),
                opaque: OpaqueEdge::Bottom,
            },
            GradientBand {
                id: "fade-top",
                y: 0.0,
                height: fade,
                color: theme.gradient_color.clone(),
                opaque: OpaqueEdge::Top,
            },
        ]
    } else {
        Vec::new()
    };

    let scale = spec.width.min(spec.height) / REFERENCE_SIDE_IN;
    let (texts, divider) = typography(spec, theme, fonts, width, height, scale);

    Ok(PosterLayout {
        width,
        height,
        width_in: spec.width,
        height_in: spec.height,
        background: theme.bg.clone(),
        font_family: fonts.css_family(),
        layers,
        gradients,
        divider,
        texts,
    })
}

fn typography(
    spec: &PosterSpec,
    theme: &Theme,
    fonts: &FontBundle,
    width: f32,
    height: f32,
    scale: f32,
) -> (Vec<TextItem>, Rule) {
    let from_bottom = |fraction: f32| height * (1.0 - fraction);
    let centered = |text: String, y: f32, size: f32, weight: FontWeight, opacity: f32| TextItem {
        x: width / 2.0,
        y,
        text,
        size,
        weight,
        anchor: TextAnchor::Middle,
        fill: theme.text.clone(),
        opacity,
    };

    let city = &spec.location.city;
    let title = city_title(city);
    let title_size = fit_title(&title, city_font_size(city, scale), width, scale, fonts);

    let texts = vec![
        centered(title, from_bottom(0.14), title_size, FontWeight::Bold, 1.0),
        centered(
            spec.location.country.to_uppercase(),
            from_bottom(0.10),
            COUNTRY_PT * scale,
            FontWeight::Light,
            1.0,
        ),
        centered(
            format_coordinates(spec.location.point),
            from_bottom(0.07),
            COORDS_PT * scale,
            FontWeight::Regular,
            0.7,
        ),
        TextItem {
            x: width * 0.98,
            y: from_bottom(0.02),
            text: ATTRIBUTION_TEXT.to_string(),
            size: ATTRIBUTION_PT,
            weight: FontWeight::Light,
            anchor: TextAnchor::End,
            fill: theme.text.clone(),
            opacity: 0.5,
        },
    ];
    let divider = Rule {
        x1: width * 0.4,
        x2: width * 0.6,
        y: from_bottom(0.125),
        stroke: theme.text.clone(),
        width: scale,
    };
    (texts, divider)
}
