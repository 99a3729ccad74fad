use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec2;
use tui_choropleth::braille::BrailleCanvas;
use tui_choropleth::data::{Region, RegionCollection, Shape};
use tui_choropleth::map::geometry::fill_polygon;
use tui_choropleth::map::projection::Projection;
use tui_choropleth::region::merge::merge_districts;

/// Synthetic municipality dataset at roughly the real dataset's size:
/// ~230 squares, a share of them district fragments of merge cities
fn municipalities() -> RegionCollection {
    let cities = ["수원시", "성남시", "청주시", "전주시", "창원시", "고양시"];
    let mut regions = Vec::new();
    for i in 0..230 {
        let lon = 126.0 + (i % 20) as f64 * 0.2;
        let lat = 34.0 + (i / 20) as f64 * 0.3;
        let name = if i < 30 {
            format!("{} {}구", cities[i % cities.len()], i)
        } else {
            format!("지역{i}군")
        };
        regions.push(Region {
            name,
            name_eng: None,
            code: Some(10000 + i as u32),
            base_year: Some("2018".to_string()),
            shape: Shape::Polygon(vec![vec![
                (lon, lat),
                (lon + 0.18, lat),
                (lon + 0.18, lat + 0.28),
                (lon, lat + 0.28),
                (lon, lat),
            ]]),
        });
    }
    RegionCollection::new(regions)
}

fn bench_merge(c: &mut Criterion) {
    let collection = municipalities();
    c.bench_function("merge_districts_230", |b| {
        b.iter(|| merge_districts(black_box(collection.clone())))
    });
}

fn bench_projection_fit(c: &mut Criterion) {
    let collection = municipalities();
    c.bench_function("projection_fit_230", |b| {
        b.iter(|| Projection::fit(black_box(&collection), 400.0, 200.0))
    });
}

fn bench_fill(c: &mut Criterion) {
    // 64-vertex ring spanning most of a 200x50 char canvas
    let ring: Vec<DVec2> = (0..64)
        .map(|i| {
            let a = i as f64 / 64.0 * std::f64::consts::TAU;
            DVec2::new(200.0 + 180.0 * a.cos(), 100.0 + 90.0 * a.sin())
        })
        .collect();
    c.bench_function("fill_polygon_64", |b| {
        b.iter(|| {
            let mut canvas = BrailleCanvas::new(200, 50);
            fill_polygon(&mut canvas, black_box(std::slice::from_ref(&ring)));
            canvas
        })
    });
}

criterion_group!(benches, bench_merge, bench_projection_fit, bench_fill);
criterion_main!(benches);
