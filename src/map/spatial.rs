use crate::data::RegionCollection;
use std::collections::HashMap;

/// Spatial index over region bounding boxes using conservative
/// approximation: each region is indexed into every cell its bbox
/// overlaps, guaranteeing no false negatives while allowing false
/// positives (eliminated by the downstream point-in-polygon test).
pub struct RegionGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionGrid {
    /// Default cell size in degrees, sized for municipality extents
    pub const DEFAULT_CELL_SIZE: f64 = 0.5;

    pub fn build(collection: &RegionCollection, cell_size: f64) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (idx, region) in collection.iter().enumerate() {
            let (min_lon, min_lat, max_lon, max_lat) = region.bbox();
            if min_lon > max_lon {
                continue;
            }
            let min_cell = to_cell(min_lon, min_lat, cell_size);
            let max_cell = to_cell(max_lon, max_lat, cell_size);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        Self { cells, cell_size }
    }

    /// Region indices whose bbox cell covers the given point
    pub fn candidates_at(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&to_cell(lon, lat, self.cell_size))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[inline(always)]
fn to_cell(lon: f64, lat: f64, cell_size: f64) -> (i32, i32) {
    (
        (lon / cell_size).floor() as i32,
        (lat / cell_size).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Region, Shape};

    fn region(name: &str, x: f64, y: f64) -> Region {
        Region {
            name: name.to_string(),
            name_eng: None,
            code: None,
            base_year: None,
            shape: Shape::Polygon(vec![vec![
                (x, y),
                (x + 0.3, y),
                (x + 0.3, y + 0.3),
                (x, y + 0.3),
                (x, y),
            ]]),
        }
    }

    #[test]
    fn test_point_query_finds_covering_region() {
        let collection = RegionCollection::new(vec![
            region("가", 126.0, 36.0),
            region("나", 129.0, 37.0),
        ]);
        let grid = RegionGrid::build(&collection, RegionGrid::DEFAULT_CELL_SIZE);

        assert!(grid.candidates_at(126.1, 36.1).contains(&0));
        assert!(!grid.candidates_at(126.1, 36.1).contains(&1));
        assert!(grid.candidates_at(129.1, 37.1).contains(&1));
        assert!(grid.candidates_at(0.0, 0.0).is_empty());
    }
}
