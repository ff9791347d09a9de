use std::cell::Cell;
use std::path::{Path, PathBuf};

use maptoposter::config::Config;
use maptoposter::fonts::FontBundle;
use maptoposter::layout::{MapLayer, Shape, compute_layout};
use maptoposter::model::{FeatureCollection, LatLon, Location, PosterSpec};
use maptoposter::osm::{FeatureLayer, FeatureSource, parse_response};
use maptoposter::render::OutputFormat;
use maptoposter::theme::{Theme, ThemeStore};
use maptoposter::{Result, Session};

const CENTER: LatLon = LatLon {
    lat: 45.0,
    lon: 7.0,
};

/// Serves Overpass responses recorded under `tests/fixtures/osm`.
#[derive(Default)]
struct FixtureSource {
    calls: Cell<usize>,
}

impl FixtureSource {
    fn load(&self, name: &str) -> Result<FeatureCollection> {
        self.calls.set(self.calls.get() + 1);
        let path = fixture_dir().join(format!("{name}.json"));
        match std::fs::read_to_string(&path) {
            Ok(body) => parse_response(&body),
            Err(_) => Ok(FeatureCollection::default()),
        }
    }
}

impl FeatureSource for FixtureSource {
    fn street_network(&self, _: LatLon, _: u32) -> Result<FeatureCollection> {
        self.load("streets")
    }

    fn features(&self, _: LatLon, _: u32, layer: FeatureLayer) -> Result<FeatureCollection> {
        self.load(layer.name())
    }
}

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("osm")
}

fn session(root: &Path) -> Session {
    let mut config = Config::default();
    config.paths.themes_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("themes");
    config.paths.cache_dir = root.join("cache");
    config.paths.posters_dir = root.join("posters");
    Session::with_fonts(config, FontBundle::fallback())
}

fn spec(city: &str, theme: &str) -> PosterSpec {
    PosterSpec {
        location: Location {
            point: CENTER,
            city: city.to_string(),
            country: "Italia".to_string(),
        },
        radius_m: 1000,
        width: 12.0,
        height: 16.0,
        theme: theme.to_string(),
        format: OutputFormat::Svg,
        gradient_height: 0.25,
    }
}

#[test]
fn warm_cache_renders_identical_svg() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    let source = FixtureSource::default();
    let spec = spec("Torino", "terracotta");

    let first = dir.path().join("first.svg");
    session.generate(&source, &spec, &first).unwrap();
    // Streets plus seven layers; maritime is fetched because of the coastline.
    assert_eq!(source.calls.get(), 8);

    let second = dir.path().join("second.svg");
    session.generate(&source, &spec, &second).unwrap();
    assert_eq!(
        source.calls.get(),
        8,
        "second run must be served from the cache"
    );

    let a = std::fs::read(&first).unwrap();
    let b = std::fs::read(&second).unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn layers_are_painted_in_depth_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    let output = dir.path().join("poster.svg");
    session
        .generate(&FixtureSource::default(), &spec("Torino", "noir"), &output)
        .unwrap();
    let svg = std::fs::read_to_string(&output).unwrap();

    let rect = "<rect width=\"100%\" height=\"100%\" fill=\"#000000\"/>";
    let background = svg.find(rect).unwrap();
    let mut last = background;
    for layer in MapLayer::ALL {
        let at = svg
            .find(&format!("<g id=\"{}\">", layer.id()))
            .unwrap_or_else(|| panic!("missing layer {}", layer.id()));
        assert!(at > last, "{} out of order", layer.id());
        last = at;
    }
    let fade = svg.find("fill=\"url(#fade-bottom)\"").unwrap();
    let typography = svg.find("<g id=\"typography\"").unwrap();
    assert!(last < fade && fade < typography);
    assert!(svg.contains("T  O  R  I  N  O"));
    assert!(svg.contains("ITALIA"));
    assert!(svg.contains("45.0000° N / 7.0000° E"));
    assert!(svg.contains("© OpenStreetMap contributors"));
}

#[test]
fn fixture_layers_land_in_the_right_groups() {
    let dir = tempfile::tempdir().unwrap();
    let session = session(dir.path());
    let source = FixtureSource::default();
    let data = session.fetch(&source, CENTER, 1000).unwrap();
    let theme = Theme::terracotta();
    let spec = spec("Torino", "terracotta");
    let layout = compute_layout(&spec, &theme, &data, session.fonts()).unwrap();

    let count = |layer: MapLayer| layout.layer(layer).unwrap().shapes.len();
    // The far-away residential street is culled.
    assert_eq!(count(MapLayer::Roads), 6);
    assert_eq!(count(MapLayer::Railways), 1);
    assert_eq!(count(MapLayer::Buildings), 1);
    assert_eq!(count(MapLayer::LandCover), 1);
    // Park nodes are not areas.
    assert_eq!(count(MapLayer::Parks), 1);
    // The lake and the multipolygon; the bay belongs to the sea.
    assert_eq!(count(MapLayer::InlandWater), 2);
    assert_eq!(count(MapLayer::MarineWater), 1);

    let holed = layout
        .layer(MapLayer::InlandWater)
        .unwrap()
        .shapes
        .iter()
        .any(|shape| matches!(shape, Shape::Area { rings, .. } if rings.len() == 2));
    assert!(holed, "multipolygon inner ring should become a hole");

    let widest = layout
        .layer(MapLayer::Roads)
        .unwrap()
        .shapes
        .last()
        .cloned()
        .unwrap();
    match widest {
        Shape::Line { stroke, width, .. } => {
            assert_eq!(width, 1.2);
            assert_eq!(stroke, theme.road_motorway);
        }
        other => panic!("unexpected road shape {other:?}"),
    }
}

#[test]
fn non_latin_titles_are_kept_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    let source = FixtureSource::default();
    let data = session.fetch(&source, CENTER, 1000).unwrap();

    let output = dir.path().join("tokyo.svg");
    let tokyo = spec("東京", "midnight_blue");
    session.render(&tokyo, &data, &output).unwrap();
    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.contains(">東京</text>"));

    let output = dir.path().join("roma.svg");
    let roma = spec("Roma", "midnight_blue");
    session.render(&roma, &data, &output).unwrap();
    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.contains(">R  O  M  A</text>"));
}

#[test]
fn every_bundled_theme_renders_from_one_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    let source = FixtureSource::default();
    let data = session.fetch(&source, CENTER, 1000).unwrap();
    let calls = source.calls.get();

    let themes = session.themes().available().unwrap();
    assert!(themes.contains(&"terracotta".to_string()));
    assert!(themes.len() >= 2);

    let mut backgrounds = Vec::new();
    for name in &themes {
        let output = dir.path().join(format!("{name}.svg"));
        let torino = spec("Torino", name);
        session.render(&torino, &data, &output).unwrap();
        let svg = std::fs::read_to_string(&output).unwrap();
        let theme = ThemeStore::new(session.themes().dir()).load(name).unwrap();
        let background = format!("fill=\"{}\"/>", theme.bg);
        assert!(svg.contains(&background), "{name}: background missing");
        backgrounds.push(theme.bg);
    }
    assert_eq!(source.calls.get(), calls);
    backgrounds.sort();
    backgrounds.dedup();
    assert!(backgrounds.len() > 1);
}

#[test]
fn missing_theme_falls_back_to_terracotta() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    let source = FixtureSource::default();
    let data = session.fetch(&source, CENTER, 1000).unwrap();
    let output = dir.path().join("fallback.svg");
    let fallback = spec("Torino", "no_such_theme");
    session.render(&fallback, &data, &output).unwrap();
    let svg = std::fs::read_to_string(&output).unwrap();
    assert!(svg.contains(&Theme::terracotta().bg));
}
