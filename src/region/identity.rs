use crate::data::{Region, RegionCollection};
use crate::map::DetailLevel;
use crate::region::merge;
use std::collections::HashMap;

/// Sentinel key for regions whose administrative code is not recognized.
/// Such regions still render; they just never match a classification.
pub const UNKNOWN_REGION: &str = "기타";

/// Province name for a 2-digit administrative code.
/// Exhaustive for the 17 top-level divisions.
pub fn province_from_code(code: u32) -> Option<&'static str> {
    match code {
        11 => Some("서울특별시"),
        21 => Some("부산광역시"),
        22 => Some("대구광역시"),
        23 => Some("인천광역시"),
        24 => Some("광주광역시"),
        25 => Some("대전광역시"),
        26 => Some("울산광역시"),
        29 => Some("세종특별자치시"),
        31 => Some("경기도"),
        32 => Some("강원도"),
        33 => Some("충청북도"),
        34 => Some("충청남도"),
        35 => Some("전라북도"),
        36 => Some("전라남도"),
        37 => Some("경상북도"),
        38 => Some("경상남도"),
        39 => Some("제주특별자치도"),
        _ => None,
    }
}

/// Derive the semantic key for a feature at the given detail level.
/// Idempotent; never fails.
pub fn resolve_key(region: &Region, level: DetailLevel) -> String {
    match level {
        DetailLevel::Province => region
            .code
            .and_then(province_from_code)
            .unwrap_or(UNKNOWN_REGION)
            .to_string(),
        DetailLevel::Municipality => {
            merge::parent_city(&region.name).unwrap_or_else(|| region.name.clone())
        }
    }
}

/// Normalize a transliterated name into an identifier: lower-cased,
/// whitespace runs collapsed to `_`, everything else non-alphanumeric
/// stripped. Diagnostic/event-id use only, never classification matching.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            pending_sep = !out.is_empty();
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(c);
        }
    }
    out
}

/// Per-collection identity index, rebuilt whenever a dataset is installed.
///
/// Keys are derived once via [`resolve_key`] and cached per feature; the
/// code→key table serves as the primary lookup path for features carrying
/// a code, with substring derivation as the fallback. The slug table maps
/// normalized transliterations back to local names.
pub struct RegionIndex {
    level: DetailLevel,
    base_year: Option<String>,
    keys: Vec<String>,
    by_code: HashMap<u32, String>,
    names_by_slug: HashMap<String, String>,
    slugs_by_name: HashMap<String, String>,
}

impl RegionIndex {
    pub fn build(collection: &RegionCollection, level: DetailLevel) -> Self {
        let mut keys = Vec::with_capacity(collection.len());
        let mut by_code = HashMap::new();
        let mut names_by_slug = HashMap::new();
        let mut slugs_by_name = HashMap::new();
        let base_year = collection
            .iter()
            .find_map(|r| r.base_year.clone());

        for region in collection.iter() {
            let key = resolve_key(region, level);
            if key == UNKNOWN_REGION {
                log::warn!(
                    "unknown administrative code {:?} for {}",
                    region.code,
                    region.name
                );
            }
            if let Some(code) = region.code {
                by_code.entry(code).or_insert_with(|| key.clone());
            }
            if let Some(eng) = &region.name_eng {
                let id = slug(eng);
                if !id.is_empty() {
                    names_by_slug.insert(id.clone(), region.name.clone());
                    slugs_by_name.insert(region.name.clone(), id);
                }
            }
            keys.push(key);
        }

        Self {
            level,
            base_year,
            keys,
            by_code,
            names_by_slug,
            slugs_by_name,
        }
    }

    pub fn level(&self) -> DetailLevel {
        self.level
    }

    /// Base-year tag of the indexed dataset
    pub fn base_year(&self) -> Option<&str> {
        self.base_year.as_deref()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Cached key for the feature at `idx` in the indexed collection
    pub fn key_of(&self, idx: usize) -> &str {
        &self.keys[idx]
    }

    /// Code-keyed lookup (primary path)
    pub fn key_for_code(&self, code: u32) -> Option<&str> {
        self.by_code.get(&code).map(|s| s.as_str())
    }

    /// Resolve an arbitrary feature: code table first, substring fallback
    pub fn resolve(&self, region: &Region) -> String {
        region
            .code
            .and_then(|c| self.key_for_code(c))
            .map(|s| s.to_string())
            .unwrap_or_else(|| resolve_key(region, self.level))
    }

    /// Stable identifier for a local name, from the transliteration table
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.slugs_by_name.get(name).map(|s| s.as_str())
    }

    /// Local name for a normalized identifier
    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.names_by_slug.get(id).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Shape;

    fn region(name: &str, code: Option<u32>, name_eng: Option<&str>) -> Region {
        Region {
            name: name.to_string(),
            name_eng: name_eng.map(|s| s.to_string()),
            code,
            base_year: Some("2018".to_string()),
            shape: Shape::Polygon(vec![vec![(0.0, 0.0), (1.0, 0.0), (0.5, 1.0), (0.0, 0.0)]]),
        }
    }

    #[test]
    fn test_all_province_codes_resolve() {
        let codes = [11, 21, 22, 23, 24, 25, 26, 29, 31, 32, 33, 34, 35, 36, 37, 38, 39];
        let mut names = std::collections::HashSet::new();
        for code in codes {
            let r = region("x", Some(code), None);
            let key = resolve_key(&r, DetailLevel::Province);
            assert_ne!(key, UNKNOWN_REGION);
            names.insert(key);
        }
        assert_eq!(names.len(), 17);
    }

    #[test]
    fn test_unknown_code_yields_sentinel() {
        let r = region("미상", Some(99), None);
        assert_eq!(resolve_key(&r, DetailLevel::Province), UNKNOWN_REGION);
        let r = region("미상", None, None);
        assert_eq!(resolve_key(&r, DetailLevel::Province), UNKNOWN_REGION);
    }

    #[test]
    fn test_municipality_key_aggregates_districts() {
        let r = region("수원시 장안구", None, None);
        assert_eq!(resolve_key(&r, DetailLevel::Municipality), "수원시");
        let r = region("강릉시", None, None);
        assert_eq!(resolve_key(&r, DetailLevel::Municipality), "강릉시");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let r = region("청주시 상당구", Some(33044), None);
        let first = resolve_key(&r, DetailLevel::Municipality);
        let second = resolve_key(&r, DetailLevel::Municipality);
        assert_eq!(first, second);
    }

    #[test]
    fn test_slug_normalization() {
        assert_eq!(slug("Seoul"), "seoul");
        assert_eq!(slug("North  Chungcheong"), "north_chungcheong");
        assert_eq!(slug("Jeju-do"), "jejudo");
        // Non-ASCII strips entirely
        assert_eq!(slug("수원-si"), "si");
    }

    #[test]
    fn test_index_code_path_and_slug_table() {
        let collection = RegionCollection::new(vec![
            region("서울특별시", Some(11), Some("Seoul")),
            region("부산광역시", Some(21), Some("Busan")),
        ]);
        let index = RegionIndex::build(&collection, DetailLevel::Province);

        assert_eq!(index.key_of(0), "서울특별시");
        assert_eq!(index.key_for_code(21), Some("부산광역시"));
        assert_eq!(index.resolve(&region("?", Some(11), None)), "서울특별시");
        assert_eq!(index.id_of("서울특별시"), Some("seoul"));
        assert_eq!(index.name_for_id("busan"), Some("부산광역시"));
        assert_eq!(index.base_year(), Some("2018"));
    }
}
