use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use maptoposter::fonts::FontBundle;
use maptoposter::layout::compute_layout;
use maptoposter::model::{
    Feature, FeatureCollection, Geometry, LatLon, Location, MapData, PosterSpec,
};
use maptoposter::render::{OutputFormat, render_svg};
use maptoposter::theme::Theme;
use std::collections::BTreeMap;
use std::hint::black_box;

const CENTER: LatLon = LatLon {
    lat: 52.52,
    lon: 13.405,
};
const HIGHWAYS: [&str; 6] = [
    "motorway",
    "primary",
    "secondary",
    "tertiary",
    "residential",
    "service",
];

/// `n` x `n` street grid spanning about 4 km, plus one block polygon per cell.
fn grid(n: usize) -> MapData {
    let step = 0.036 / n as f64;
    let origin = LatLon::new(CENTER.lat - 0.018, CENTER.lon - 0.018);
    let mut streets = Vec::new();
    let mut buildings = Vec::new();
    let mut id = 0i64;
    for i in 0..=n {
        let offset = i as f64 * step;
        let highway = HIGHWAYS[i % HIGHWAYS.len()].to_string();
        let tags = BTreeMap::from([("highway".to_string(), highway)]);
        for points in [
            (0..=n)
                .map(|j| LatLon::new(origin.lat + offset, origin.lon + j as f64 * step))
                .collect::<Vec<_>>(),
            (0..=n)
                .map(|j| LatLon::new(origin.lat + j as f64 * step, origin.lon + offset))
                .collect::<Vec<_>>(),
        ] {
            id += 1;
            streets.push(Feature {
                id,
                geometry: Geometry::LineString { points },
                tags: tags.clone(),
            });
        }
    }
    for i in 0..n {
        for j in 0..n {
            let lat = origin.lat + (i as f64 + 0.2) * step;
            let lon = origin.lon + (j as f64 + 0.2) * step;
            let size = step * 0.6;
            id += 1;
            buildings.push(Feature {
                id,
                geometry: Geometry::Polygon {
                    exterior: vec![
                        LatLon::new(lat, lon),
                        LatLon::new(lat, lon + size),
                        LatLon::new(lat + size, lon + size),
                        LatLon::new(lat + size, lon),
                        LatLon::new(lat, lon),
                    ],
                    holes: Vec::new(),
                },
                tags: BTreeMap::from([("building".to_string(), "yes".to_string())]),
            });
        }
    }
    MapData {
        streets: FeatureCollection::new(streets),
        buildings: FeatureCollection::new(buildings),
        ..Default::default()
    }
}

fn spec() -> PosterSpec {
    PosterSpec {
        location: Location {
            point: CENTER,
            city: "Berlin".to_string(),
            country: "Germany".to_string(),
        },
        radius_m: 2000,
        width: 12.0,
        height: 16.0,
        theme: "terracotta".to_string(),
        format: OutputFormat::Svg,
        gradient_height: 0.25,
    }
}

fn bench_render(c: &mut Criterion) {
    let theme = Theme::terracotta();
    let fonts = FontBundle::fallback();
    let spec = spec();
    let mut group = c.benchmark_group("poster");
    for n in [16usize, 64, 160] {
        let data = grid(n);
        group.bench_with_input(BenchmarkId::new("layout", n), &data, |b, data| {
            b.iter(|| compute_layout(black_box(&spec), &theme, black_box(data), &fonts).unwrap())
        });
        let layout = compute_layout(&spec, &theme, &data, &fonts).unwrap();
        group.bench_with_input(BenchmarkId::new("svg", n), &layout, |b, layout| {
            b.iter(|| render_svg(black_box(layout)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
