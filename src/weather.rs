use crate::map::DetailLevel;
use crate::region::identity::RegionIndex;
use anyhow::{Context, Result};
use simd_json::prelude::*;
use simd_json::OwnedValue;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Choropleth class for a region
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Classification {
    Hot,
    #[default]
    Normal,
    Cold,
}

impl Classification {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "hot" => Some(Classification::Hot),
            "normal" => Some(Classification::Normal),
            "cold" => Some(Classification::Cold),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Hot => "hot",
            Classification::Normal => "normal",
            Classification::Cold => "cold",
        }
    }

    /// Hover text shown for the classification
    pub fn feeling_text(&self) -> &'static str {
        match self {
            Classification::Hot => "덥다",
            Classification::Normal => "보통",
            Classification::Cold => "춥다",
        }
    }
}

/// RegionKey -> classification, supplied externally per redraw
pub type ClassificationMap = HashMap<String, Classification>;

/// One classification fetch: the per-region classes plus the vote
/// detail arrays the popup layer consumes
#[derive(Debug, Default)]
pub struct WeatherReport {
    pub classifications: ClassificationMap,
    pub details: HashMap<String, Vec<i64>>,
}

/// Detail for a single region, for the popup layer
#[derive(Debug)]
pub struct RegionDetail {
    pub temperature: Option<f64>,
    pub feeling: Classification,
    pub detail: Vec<i64>,
}

/// The external weather/vote service, abstracted from its transport
pub trait WeatherSource {
    /// Classifications for every region at the given level, optionally
    /// filtered to one province's municipalities
    fn fetch(&self, level: DetailLevel, province: Option<&str>) -> Result<WeatherReport>;

    /// Province a municipality belongs to
    fn province_for(&self, region: &str) -> Result<String>;

    /// Full detail for one region
    fn region_detail(&self, province: &str, region: &str) -> Result<RegionDetail>;
}

/// Matched-vs-total diagnostics from an overlay application.
/// Observability only; unmatched regions still display as Normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub matched: usize,
    pub total: usize,
}

/// Assign a display class to every rendered region: resolve its key,
/// look it up, default to Normal on a miss. Mutates only the display
/// class vector, never the feature collection. Total: every slot holds
/// a defined classification afterwards regardless of map coverage.
pub fn apply(
    index: &RegionIndex,
    map: &ClassificationMap,
    classes: &mut [Classification],
) -> MatchStats {
    let mut stats = MatchStats {
        matched: 0,
        total: classes.len(),
    };
    for (idx, class) in classes.iter_mut().enumerate() {
        let key = index.key_of(idx);
        match map.get(key) {
            Some(&c) => {
                *class = c;
                stats.matched += 1;
            }
            None => {
                *class = Classification::Normal;
                log::debug!("no classification for {key}");
            }
        }
    }
    log::debug!("classification matched {}/{}", stats.matched, stats.total);
    stats
}

/// File-backed [`WeatherSource`]: reads the same JSON shapes the voting
/// service emits (`weather_stats`, `detail_arrays`) from the data
/// directory, one document per detail level.
pub struct FileWeatherSource {
    data_dir: PathBuf,
}

impl FileWeatherSource {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn read_document(&self, level: DetailLevel) -> Result<OwnedValue> {
        let file = match level {
            DetailLevel::Province => "weather-provinces.json",
            DetailLevel::Municipality => "weather-municipalities.json",
        };
        let path = self.data_dir.join(file);
        let mut bytes =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        simd_json::to_owned_value(&mut bytes)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn read_province_index(&self) -> Result<HashMap<String, String>> {
        let path = self.data_dir.join("region-index.json");
        let mut bytes =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let value = simd_json::to_owned_value(&mut bytes)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        let mut index = HashMap::new();
        if let Some(obj) = value.as_object() {
            for (region, province) in obj.iter() {
                if let Some(p) = province.as_str() {
                    index.insert(region.clone(), p.to_string());
                }
            }
        }
        Ok(index)
    }
}

impl WeatherSource for FileWeatherSource {
    fn fetch(&self, level: DetailLevel, province: Option<&str>) -> Result<WeatherReport> {
        let value = self.read_document(level)?;
        let mut report = parse_report(&value);

        // Municipality fetches scoped to one province drop everything else
        if let (DetailLevel::Municipality, Some(wanted)) = (level, province) {
            let index = self.read_province_index().unwrap_or_default();
            report
                .classifications
                .retain(|region, _| index.get(region).map(|p| p.as_str()) == Some(wanted));
            report
                .details
                .retain(|region, _| index.get(region).map(|p| p.as_str()) == Some(wanted));
        }
        Ok(report)
    }

    fn province_for(&self, region: &str) -> Result<String> {
        self.read_province_index()?
            .remove(region)
            .with_context(|| format!("no province recorded for {region}"))
    }

    fn region_detail(&self, _province: &str, region: &str) -> Result<RegionDetail> {
        let value = self.read_document(DetailLevel::Municipality)?;
        let report = parse_report(&value);
        let temperature = value
            .get("temperatures")
            .and_then(|t| t.get(region))
            .and_then(|v| v.as_f64());
        Ok(RegionDetail {
            temperature,
            feeling: report
                .classifications
                .get(region)
                .copied()
                .unwrap_or_default(),
            detail: report.details.get(region).cloned().unwrap_or_default(),
        })
    }
}

/// Extract a report from a parsed service response
pub fn parse_report(value: &OwnedValue) -> WeatherReport {
    let mut report = WeatherReport::default();

    if let Some(stats) = value.get("weather_stats").and_then(|v| v.as_object()) {
        for (region, label) in stats.iter() {
            if let Some(c) = label.as_str().and_then(Classification::from_label) {
                report.classifications.insert(region.clone(), c);
            }
        }
    }

    if let Some(arrays) = value.get("detail_arrays").and_then(|v| v.as_object()) {
        for (region, arr) in arrays.iter() {
            if let Some(values) = arr.as_array() {
                let detail: Vec<i64> = values.iter().filter_map(|v| v.as_i64()).collect();
                report.details.insert(region.clone(), detail);
            }
        }
    }

    report
}
