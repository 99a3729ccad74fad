use crate::map::DetailLevel;
use anyhow::{anyhow, Context, Result};
use geojson::{Feature, GeoJson, Value};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// A linear ring of (longitude, latitude) pairs
pub type Ring = Vec<(f64, f64)>;

/// Region geometry: exactly the two variants the datasets contain
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Shape {
    /// Visit each polygon (a slice of rings, exterior first)
    pub fn for_each_polygon<F: FnMut(&[Ring])>(&self, mut f: F) {
        match self {
            Shape::Polygon(rings) => f(rings),
            Shape::MultiPolygon(polys) => {
                for rings in polys {
                    f(rings);
                }
            }
        }
    }

    /// Clone out the polygon list (a Polygon contributes itself as one entry)
    pub fn to_polygons(&self) -> Vec<Vec<Ring>> {
        match self {
            Shape::Polygon(rings) => vec![rings.clone()],
            Shape::MultiPolygon(polys) => polys.clone(),
        }
    }

    /// Iterate every coordinate in every ring
    pub fn for_each_coord<F: FnMut(f64, f64)>(&self, mut f: F) {
        self.for_each_polygon(|rings| {
            for ring in rings {
                for &(lon, lat) in ring {
                    f(lon, lat);
                }
            }
        });
    }
}

/// One administrative region as loaded (or synthesized by the merger)
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Local-language name (한글)
    pub name: String,
    /// Transliterated name, when the dataset provides one
    pub name_eng: Option<String>,
    /// Administrative code; only meaningful at the province level
    pub code: Option<u32>,
    /// Dataset base-year tag
    pub base_year: Option<String>,
    pub shape: Shape,
}

impl Region {
    /// Geographic bounding box (min_lon, min_lat, max_lon, max_lat)
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        let mut bounds = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        self.shape.for_each_coord(|lon, lat| {
            bounds.0 = bounds.0.min(lon);
            bounds.1 = bounds.1.min(lat);
            bounds.2 = bounds.2.max(lon);
            bounds.3 = bounds.3.max(lat);
        });
        bounds
    }
}

/// The active feature collection; replaced wholesale on every level switch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionCollection {
    pub regions: Vec<Region>,
}

impl RegionCollection {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }
}

/// Loads one of the two fixed GeoJSON datasets from a data directory
pub struct GeometryLoader {
    data_dir: PathBuf,
}

impl GeometryLoader {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Fetch the dataset for the given detail level
    pub fn load(&self, level: DetailLevel) -> Result<RegionCollection> {
        let path = self.data_dir.join(dataset_file(level));
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let collection = parse_collection(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        log::info!(
            "loaded {} regions from {}",
            collection.len(),
            path.display()
        );
        Ok(collection)
    }
}

fn dataset_file(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::Province => "skorea-provinces-2018-geo.json",
        DetailLevel::Municipality => "skorea-municipalities-2018-geo.json",
    }
}

/// Parse a GeoJSON document into a region collection.
/// Features without a usable name or polygonal geometry are skipped.
pub fn parse_collection(content: &str) -> Result<RegionCollection> {
    let geojson: GeoJson = content.parse()?;
    let fc = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("expected a FeatureCollection")),
    };

    let regions: Vec<Region> = fc
        .features
        .into_par_iter()
        .filter_map(convert_feature)
        .collect();

    Ok(RegionCollection::new(regions))
}

fn convert_feature(feature: Feature) -> Option<Region> {
    let props = feature.properties.as_ref();

    // Datasets are inconsistent about the name key
    let name = ["name", "CTP_KOR_NM", "SIG_KOR_NM", "NAME"]
        .iter()
        .find_map(|k| props.and_then(|p| p.get(*k)).and_then(|v| v.as_str()))?
        .to_string();

    let name_eng = props
        .and_then(|p| p.get("name_eng"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    // Codes appear both as numbers and numeric strings
    let code = props.and_then(|p| p.get("code")).and_then(|v| {
        v.as_u64()
            .map(|n| n as u32)
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    });

    let base_year = props.and_then(|p| p.get("base_year")).and_then(|v| {
        v.as_str()
            .map(|s| s.to_string())
            .or_else(|| v.as_u64().map(|n| n.to_string()))
    });

    let shape = match feature.geometry?.value {
        Value::Polygon(rings) => Shape::Polygon(convert_rings(&rings)),
        Value::MultiPolygon(polys) => {
            Shape::MultiPolygon(polys.iter().map(|rings| convert_rings(rings)).collect())
        }
        _ => return None,
    };

    Some(Region {
        name,
        name_eng,
        code,
        base_year,
        shape,
    })
}

fn convert_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter(|pos| pos.len() >= 2)
                .map(|pos| (pos[0], pos[1]))
                .collect()
        })
        .collect()
}
