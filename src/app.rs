use crate::data::GeometryLoader;
use crate::map::{
    DetailLevel, LevelController, MapRenderer, RegionGrid, SwitchOutcome, SwitchTicket,
};
use crate::weather::{self, Classification, MatchStats, WeatherSource};
use anyhow::Result;
use glam::DVec2;

/// Zoom factor per scroll step or +/- keypress
const ZOOM_STEP: f64 = 1.25;

/// Callbacks for the popup layer, which lives outside this core
pub enum RegionEvent {
    Clicked {
        level: DetailLevel,
        name: String,
        /// Resolved province for municipality clicks
        province: Option<String>,
        /// Stable identifier from the transliteration table
        id: Option<String>,
        column: u16,
        row: u16,
    },
    Hovered {
        name: String,
        classification: Classification,
    },
}

/// Application state
pub struct App {
    pub controller: LevelController,
    pub renderer: MapRenderer,
    loader: GeometryLoader,
    weather: Box<dyn WeatherSource>,
    /// Display class per rendered region; the applier's only side effect
    pub classes: Vec<Classification>,
    pub stats: MatchStats,
    grid: RegionGrid,
    pub hover: Option<usize>,
    /// Current mouse position for the tooltip
    pub mouse_pos: Option<(u16, u16)>,
    /// Last mouse position for drag tracking
    last_mouse: Option<(u16, u16)>,
    /// Province picked by the last province-level click, scoping the
    /// next municipality weather fetch
    selected_province: Option<String>,
    events: Vec<RegionEvent>,
    pub should_quit: bool,
    pixel_width: usize,
    pixel_height: usize,
}

impl App {
    pub fn new(
        loader: GeometryLoader,
        weather: Box<dyn WeatherSource>,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        let (pixel_width, pixel_height) = pixel_dims(width, height);
        let regions = loader.load(DetailLevel::Province)?;
        let controller = LevelController::new(regions, pixel_width, pixel_height);
        let grid = RegionGrid::build(&controller.state().regions, RegionGrid::DEFAULT_CELL_SIZE);
        let classes = vec![Classification::Normal; controller.state().regions.len()];

        let mut app = Self {
            controller,
            renderer: MapRenderer::new(),
            loader,
            weather,
            classes,
            stats: MatchStats::default(),
            grid,
            hover: None,
            mouse_pos: None,
            last_mouse: None,
            selected_province: None,
            events: Vec::new(),
            should_quit: false,
            pixel_width,
            pixel_height,
        };
        app.refresh_weather();
        Ok(app)
    }

    /// Update viewport size when the terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pw, ph) = pixel_dims(width, height);
        self.pixel_width = pw;
        self.pixel_height = ph;
        self.controller.resize(pw, ph);
    }

    /// Zoom towards a terminal position
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let anchor = pixel_at(col, row);
        let ticket = self.controller.zoom_by(ZOOM_STEP, anchor);
        self.complete_switch(ticket);
    }

    /// Zoom away from a terminal position
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let anchor = pixel_at(col, row);
        let ticket = self.controller.zoom_by(1.0 / ZOOM_STEP, anchor);
        self.complete_switch(ticket);
    }

    /// Keyboard zoom, anchored at the viewport center
    pub fn zoom_in(&mut self) {
        let anchor = DVec2::new(self.pixel_width as f64 / 2.0, self.pixel_height as f64 / 2.0);
        let ticket = self.controller.zoom_by(ZOOM_STEP, anchor);
        self.complete_switch(ticket);
    }

    pub fn zoom_out(&mut self) {
        let anchor = DVec2::new(self.pixel_width as f64 / 2.0, self.pixel_height as f64 / 2.0);
        let ticket = self.controller.zoom_by(1.0 / ZOOM_STEP, anchor);
        self.complete_switch(ticket);
    }

    /// Pan by a pixel delta
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.controller.pan_by(dx, dy);
    }

    /// Handle mouse drag: the map follows the pointer
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (x as f64 - last_x as f64) * 2.0;
            let dy = (y as f64 - last_y as f64) * 4.0;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn start_drag(&mut self, x: u16, y: u16) {
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when the mouse button is released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Track the pointer and re-derive the hovered region
    pub fn update_hover(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        let p = pixel_at(col, row);
        let hit = self
            .renderer
            .hit_test(self.controller.state(), &self.grid, p.x, p.y);
        if hit != self.hover {
            self.hover = hit;
            if let Some(idx) = hit {
                self.events.push(RegionEvent::Hovered {
                    name: self.controller.state().regions.regions[idx].name.clone(),
                    classification: self.classes.get(idx).copied().unwrap_or_default(),
                });
            }
        }
    }

    /// Dispatch a region click with level context to the popup layer
    pub fn click(&mut self, col: u16, row: u16) {
        let p = pixel_at(col, row);
        let state = self.controller.state();
        let Some(idx) = self.renderer.hit_test(state, &self.grid, p.x, p.y) else {
            return;
        };
        let name = state.regions.regions[idx].name.clone();
        let id = state.index.id_of(&name).map(|s| s.to_string());
        let level = state.level;

        let province = match level {
            DetailLevel::Province => {
                self.selected_province = Some(name.clone());
                None
            }
            DetailLevel::Municipality => match self.weather.province_for(&name) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("no province resolved for {name}: {e:#}");
                    None
                }
            },
        };

        self.events.push(RegionEvent::Clicked {
            level,
            name,
            province,
            id,
            column: col,
            row,
        });
    }

    /// Name and feeling for the hovered region, for the tooltip
    pub fn hover_info(&self) -> Option<(&str, Classification)> {
        let idx = self.hover?;
        let name = self.controller.state().regions.regions.get(idx)?.name.as_str();
        Some((name, self.classes.get(idx).copied().unwrap_or_default()))
    }

    /// Re-fetch the classification map and repaint every region
    pub fn refresh_weather(&mut self) {
        let level = self.controller.level();
        let province = match level {
            DetailLevel::Municipality => self.selected_province.as_deref(),
            DetailLevel::Province => None,
        };
        match self.weather.fetch(level, province) {
            Ok(report) => {
                self.stats = weather::apply(
                    &self.controller.state().index,
                    &report.classifications,
                    &mut self.classes,
                );
            }
            Err(e) => log::warn!("weather fetch failed: {e:#}"),
        }
    }

    /// Clear classifications and return to the province map
    pub fn reset(&mut self) {
        self.classes.fill(Classification::Normal);
        self.stats = MatchStats::default();
        let ticket = self.controller.request_reset();
        self.complete_switch(ticket);
    }

    /// Drive an issued level switch to completion: load, merge/install,
    /// then re-apply the weather classification
    fn complete_switch(&mut self, ticket: Option<SwitchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let target = ticket.target();

        match self.loader.load(target) {
            Ok(collection) => {
                let overlay = match target {
                    DetailLevel::Municipality => match self.loader.load(DetailLevel::Province) {
                        Ok(provinces) => Some(provinces),
                        Err(e) => {
                            log::warn!("province boundary overlay unavailable: {e:#}");
                            None
                        }
                    },
                    DetailLevel::Province => None,
                };
                if self.controller.apply_switch(ticket, collection, overlay)
                    == SwitchOutcome::Applied
                {
                    self.selected_province = None;
                    self.hover = None;
                    self.grid = RegionGrid::build(
                        &self.controller.state().regions,
                        RegionGrid::DEFAULT_CELL_SIZE,
                    );
                    self.classes =
                        vec![Classification::Normal; self.controller.state().regions.len()];
                    self.refresh_weather();
                }
            }
            Err(e) => {
                log::warn!("level switch aborted: {e:#}");
                self.controller.abort_switch(&ticket);
            }
        }
    }

    /// Drain pending popup-layer events
    pub fn take_events(&mut self) -> Vec<RegionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.controller.transform().k)
    }
}

/// Terminal cell to braille pixel coordinates, accounting for the border
fn pixel_at(col: u16, row: u16) -> DVec2 {
    DVec2::new(
        (col.saturating_sub(1) as f64) * 2.0,
        (row.saturating_sub(1) as f64) * 4.0,
    )
}

/// Map area pixel dimensions for a terminal size.
/// Braille gives 2x4 resolution per character; border and status bar
/// take 2 columns and 3 rows.
fn pixel_dims(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const PROVINCES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[126.8, 37.4], [127.2, 37.4], [127.2, 37.7], [126.8, 37.7], [126.8, 37.4]]]},
                "properties": {"name": "서울특별시", "name_eng": "Seoul", "code": "11", "base_year": "2018"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[128.9, 35.0], [129.3, 35.0], [129.3, 35.4], [128.9, 35.4], [128.9, 35.0]]]},
                "properties": {"name": "부산광역시", "name_eng": "Busan", "code": "21", "base_year": "2018"}
            }
        ]
    }"#;

    const MUNICIPALITIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[127.0, 37.25], [127.1, 37.25], [127.1, 37.35], [127.0, 37.35], [127.0, 37.25]]]},
                "properties": {"name": "수원시 장안구", "name_eng": "Suwon Jangan-gu", "code": "41111", "base_year": "2018"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[127.1, 37.25], [127.2, 37.25], [127.2, 37.35], [127.1, 37.35], [127.1, 37.25]]]},
                "properties": {"name": "수원시 팔달구", "name_eng": "Suwon Paldal-gu", "code": "41115", "base_year": "2018"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[128.8, 37.7], [129.0, 37.7], [129.0, 37.9], [128.8, 37.9], [128.8, 37.7]]]},
                "properties": {"name": "강릉시", "name_eng": "Gangneung-si", "code": "42150", "base_year": "2018"}
            }
        ]
    }"#;

    const WEATHER_PROVINCES: &str = r#"{
        "weather_stats": {"서울특별시": "hot"},
        "detail_arrays": {"서울특별시": [5, 1, 0, 2]}
    }"#;

    const WEATHER_MUNICIPALITIES: &str = r#"{
        "weather_stats": {"수원시": "cold", "강릉시": "hot"},
        "detail_arrays": {"수원시": [0, 0, 4, 1]}
    }"#;

    const REGION_INDEX: &str = r#"{"수원시": "경기도", "강릉시": "강원도"}"#;

    fn fixture_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("tui-choropleth-tests")
            .join(format!("{}-{}", test, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("skorea-provinces-2018-geo.json"), PROVINCES).unwrap();
        fs::write(dir.join("skorea-municipalities-2018-geo.json"), MUNICIPALITIES).unwrap();
        fs::write(dir.join("weather-provinces.json"), WEATHER_PROVINCES).unwrap();
        fs::write(dir.join("weather-municipalities.json"), WEATHER_MUNICIPALITIES).unwrap();
        fs::write(dir.join("region-index.json"), REGION_INDEX).unwrap();
        dir
    }

    fn app(test: &str) -> App {
        let dir = fixture_dir(test);
        App::new(
            GeometryLoader::new(&dir),
            Box::new(crate::weather::FileWeatherSource::new(&dir)),
            120,
            40,
        )
        .unwrap()
    }

    #[test]
    fn test_startup_loads_and_classifies_provinces() {
        let app = app("startup");
        assert_eq!(app.controller.level(), DetailLevel::Province);
        assert_eq!(app.classes, vec![Classification::Hot, Classification::Normal]);
        assert_eq!(app.stats.matched, 1);
        assert_eq!(app.stats.total, 2);
    }

    #[test]
    fn test_zoom_past_threshold_switches_and_reclassifies() {
        let mut app = app("switch");
        // Four zoom-in steps: 1.25^4 ≈ 2.44 crosses the threshold
        for _ in 0..4 {
            app.zoom_in();
        }
        assert_eq!(app.controller.level(), DetailLevel::Municipality);
        assert!(!app.controller.is_switching());
        // Merged 수원시 + pass-through 강릉시
        assert_eq!(app.controller.state().regions.len(), 2);
        assert_eq!(app.classes, vec![Classification::Cold, Classification::Hot]);
        assert!(app.controller.state().overlay.is_some());
        // Transform preserved across the swap
        assert!(app.controller.transform().k >= 2.0);

        // Zoom back out below the dead-band floor: 2.44 -> 1.95 -> 1.56
        for _ in 0..2 {
            app.zoom_out();
        }
        assert_eq!(app.controller.level(), DetailLevel::Province);
        assert!((app.controller.transform().k - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_returns_to_provinces() {
        let mut app = app("reset");
        for _ in 0..4 {
            app.zoom_in();
        }
        assert_eq!(app.controller.level(), DetailLevel::Municipality);
        app.reset();
        assert_eq!(app.controller.level(), DetailLevel::Province);
        assert_eq!(app.controller.state().regions.len(), 2);
    }
}
