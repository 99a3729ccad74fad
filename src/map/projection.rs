use crate::data::RegionCollection;
use glam::DVec2;
use std::f64::consts::PI;

/// Projection center: middle of the Korean peninsula
pub const MAP_CENTER: (f64, f64) = (127.7, 36.0);

/// Share of the viewport the fitted collection may occupy
const FIT_MARGIN: f64 = 0.9;

/// Web-Mercator projection fitted to a feature collection: scale and
/// translate are chosen so the collection's projected bounding box fills
/// [`FIT_MARGIN`] of the viewport, with the projection center pinned to
/// the viewport center. Recomputed on every dataset install and resize.
#[derive(Clone, Debug)]
pub struct Projection {
    center_raw: DVec2,
    scale: f64,
    translate: DVec2,
}

impl Projection {
    pub fn fit(collection: &RegionCollection, width: f64, height: f64) -> Self {
        let center_raw = raw(MAP_CENTER.0, MAP_CENTER.1);

        let mut min = DVec2::MAX;
        let mut max = DVec2::MIN;
        for region in collection.iter() {
            region.shape.for_each_coord(|lon, lat| {
                let p = raw(lon, lat);
                min = min.min(p);
                max = max.max(p);
            });
        }

        let extent = max - min;
        let scale = if extent.x > 0.0 && extent.y > 0.0 {
            (FIT_MARGIN * width / extent.x).min(FIT_MARGIN * height / extent.y)
        } else {
            1.0
        };

        Self {
            center_raw,
            scale,
            translate: DVec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Project (lon, lat) to pixel coordinates (y grows downward)
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let r = raw(lon, lat);
        DVec2::new(
            (r.x - self.center_raw.x) * self.scale + self.translate.x,
            (self.center_raw.y - r.y) * self.scale + self.translate.y,
        )
    }

    /// Invert pixel coordinates back to (lon, lat)
    pub fn unproject(&self, p: DVec2) -> (f64, f64) {
        let x = (p.x - self.translate.x) / self.scale + self.center_raw.x;
        let y = self.center_raw.y - (p.y - self.translate.y) / self.scale;
        let lat = (2.0 * y.exp().atan() - PI / 2.0).to_degrees();
        (x.to_degrees(), lat)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

fn raw(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.to_radians();
    DVec2::new(lon.to_radians(), (PI / 4.0 + lat_rad / 2.0).tan().ln())
}

/// The gesture-owned screen transform: scale about the origin then
/// translate. Applied to every rendered element on each redraw; mutated
/// only by gestures and by the controller's post-switch re-application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl ZoomTransform {
    pub fn identity() -> Self {
        Self { k: 1.0, x: 0.0, y: 0.0 }
    }

    pub fn apply(&self, p: DVec2) -> DVec2 {
        p * self.k + DVec2::new(self.x, self.y)
    }

    pub fn invert(&self, p: DVec2) -> DVec2 {
        (p - DVec2::new(self.x, self.y)) / self.k
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Rescale while keeping the map point under `anchor` fixed on screen
    pub fn scaled_about(&self, factor: f64, anchor: DVec2, min_k: f64, max_k: f64) -> Self {
        let k = (self.k * factor).clamp(min_k, max_k);
        let ratio = k / self.k;
        Self {
            k,
            x: anchor.x - (anchor.x - self.x) * ratio,
            y: anchor.y - (anchor.y - self.y) * ratio,
        }
    }
}
