use crate::data::{Region, RegionCollection, Shape};
use std::collections::HashSet;

/// Parent cities whose district fragments are combined into one shape.
/// Defined once; membership is substring containment against the
/// fragment's local name, not a code lookup.
pub const MERGE_CITIES: [&str; 10] = [
    "용인", "수원", "성남", "청주", "천안", "전주", "창원", "안양", "고양", "안산",
];

/// Key for the parent city a district fragment belongs to
/// (`<city>시` convention), or None for pass-through features.
pub fn parent_city(name: &str) -> Option<String> {
    MERGE_CITIES
        .iter()
        .find(|city| name.contains(*city))
        .map(|city| format!("{city}시"))
}

/// Combine district fragments sharing a parent city into single
/// MultiPolygon features. Applied to the municipality dataset only.
///
/// Pass-through features are forwarded unchanged, exactly once. Every
/// matching parent city yields exactly one output feature, placed at
/// its first fragment's position; a lone fragment is normalized the
/// same way (name set to the parent key, geometry promoted to
/// MultiPolygon), which also makes the operation idempotent.
pub fn merge_districts(collection: RegionCollection) -> RegionCollection {
    let parents: Vec<Option<String>> = collection
        .regions
        .iter()
        .map(|r| parent_city(&r.name))
        .collect();

    let mut merged = Vec::with_capacity(collection.len());
    let mut processed: HashSet<&str> = HashSet::new();

    for (i, region) in collection.regions.iter().enumerate() {
        let Some(city) = &parents[i] else {
            merged.push(region.clone());
            continue;
        };
        if !processed.insert(city.as_str()) {
            continue;
        }

        let fragments: Vec<&Region> = collection
            .regions
            .iter()
            .zip(&parents)
            .filter(|(_, p)| p.as_ref() == Some(city))
            .map(|(r, _)| r)
            .collect();

        let mut polygons = Vec::new();
        for fragment in &fragments {
            polygons.extend(fragment.shape.to_polygons());
        }

        merged.push(Region {
            name: city.clone(),
            name_eng: Some(format!("{}-si", city.strip_suffix('시').unwrap_or(city))),
            code: fragments[0].code,
            base_year: fragments[0].base_year.clone(),
            shape: Shape::MultiPolygon(polygons),
        });
    }

    log::info!(
        "district merge: {} features in, {} out",
        parents.len(),
        merged.len()
    );
    RegionCollection::new(merged)
}
