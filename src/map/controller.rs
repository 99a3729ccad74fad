use crate::data::RegionCollection;
use crate::map::projection::{Projection, ZoomTransform};
use crate::region::identity::RegionIndex;
use crate::region::merge;
use glam::DVec2;

/// Which of the two geometry granularities is active
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetailLevel {
    Province,
    Municipality,
}

impl DetailLevel {
    pub fn label(&self) -> &'static str {
        match self {
            DetailLevel::Province => "시도",
            DetailLevel::Municipality => "시군구",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelSize {
    Small,
    Medium,
    Large,
}

/// Scale at which the province map switches to municipalities
pub const SWITCH_UP_SCALE: f64 = 2.0;
/// Scale below which the municipality map switches back; the gap to
/// [`SWITCH_UP_SCALE`] is a dead-band against thrashing at the threshold
pub const SWITCH_DOWN_SCALE: f64 = 1.8;

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 10.0;

/// Label size bucket as a pure function of detail level and zoom scale,
/// independent of the level-switch logic
pub fn label_size(level: DetailLevel, k: f64) -> LabelSize {
    match level {
        DetailLevel::Province => {
            if k < 0.75 {
                LabelSize::Small
            } else if k < 1.5 {
                LabelSize::Medium
            } else {
                LabelSize::Large
            }
        }
        DetailLevel::Municipality => {
            if k < 3.0 {
                LabelSize::Small
            } else if k < 4.0 {
                LabelSize::Medium
            } else {
                LabelSize::Large
            }
        }
    }
}

/// Everything the renderer needs, owned by the controller and mutated
/// only through its transition sequence
pub struct MapViewState {
    pub level: DetailLevel,
    pub transform: ZoomTransform,
    pub regions: RegionCollection,
    pub projection: Projection,
    /// Province boundaries overlaid at municipality level, refit to the
    /// municipality projection
    pub overlay: Option<RegionCollection>,
    pub index: RegionIndex,
}

/// An in-flight level switch. Carries the token that guards against
/// stale completions and the pre-switch transform snapshot that the
/// continuity invariant requires.
#[derive(Debug)]
pub struct SwitchTicket {
    token: u64,
    target: DetailLevel,
    transform: ZoomTransform,
}

impl SwitchTicket {
    pub fn target(&self) -> DetailLevel {
        self.target
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    Applied,
    /// A newer switch superseded this one; the completion was discarded
    Stale,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Steady,
    Switching,
}

/// Owns the detail level, the zoom transform, and the active collection.
/// Gestures update the transform; when the scale crosses a threshold in
/// the Steady phase the controller issues a [`SwitchTicket`], and the
/// host loads the target dataset and hands it back to [`apply_switch`].
/// While a ticket is outstanding, further threshold checks are
/// suppressed; transform updates still apply visually.
///
/// [`apply_switch`]: LevelController::apply_switch
pub struct LevelController {
    state: MapViewState,
    phase: Phase,
    token: u64,
    width: f64,
    height: f64,
}

impl LevelController {
    /// Start at province level with an identity transform
    pub fn new(regions: RegionCollection, width: usize, height: usize) -> Self {
        let (width, height) = (width as f64, height as f64);
        let projection = Projection::fit(&regions, width, height);
        let index = RegionIndex::build(&regions, DetailLevel::Province);
        Self {
            state: MapViewState {
                level: DetailLevel::Province,
                transform: ZoomTransform::identity(),
                regions,
                projection,
                overlay: None,
                index,
            },
            phase: Phase::Steady,
            token: 0,
            width,
            height,
        }
    }

    pub fn state(&self) -> &MapViewState {
        &self.state
    }

    pub fn level(&self) -> DetailLevel {
        self.state.level
    }

    pub fn transform(&self) -> ZoomTransform {
        self.state.transform
    }

    pub fn is_switching(&self) -> bool {
        self.phase == Phase::Switching
    }

    pub fn label_size(&self) -> LabelSize {
        label_size(self.state.level, self.state.transform.k)
    }

    /// Rescale about a screen anchor; may issue a level switch
    pub fn zoom_by(&mut self, factor: f64, anchor: DVec2) -> Option<SwitchTicket> {
        self.state.transform =
            self.state
                .transform
                .scaled_about(factor, anchor, MIN_SCALE, MAX_SCALE);
        self.check_threshold()
    }

    /// Pan by a screen-pixel delta; never triggers a switch
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.state.transform = self.state.transform.translated(dx, dy);
    }

    /// Install a transform wholesale (programmatic gestures, tests)
    pub fn set_transform(&mut self, transform: ZoomTransform) -> Option<SwitchTicket> {
        self.state.transform = transform;
        self.check_threshold()
    }

    /// Force a return to the province level regardless of scale
    pub fn request_reset(&mut self) -> Option<SwitchTicket> {
        if self.phase == Phase::Steady && self.state.level == DetailLevel::Municipality {
            Some(self.issue(DetailLevel::Province))
        } else {
            None
        }
    }

    fn check_threshold(&mut self) -> Option<SwitchTicket> {
        if self.phase == Phase::Switching {
            return None;
        }
        let k = self.state.transform.k;
        let target = match self.state.level {
            DetailLevel::Province if k >= SWITCH_UP_SCALE => DetailLevel::Municipality,
            DetailLevel::Municipality if k < SWITCH_DOWN_SCALE => DetailLevel::Province,
            _ => return None,
        };
        log::info!("zoom {:.2} crossed threshold, switching to {}", k, target.label());
        Some(self.issue(target))
    }

    fn issue(&mut self, target: DetailLevel) -> SwitchTicket {
        self.phase = Phase::Switching;
        self.token += 1;
        SwitchTicket {
            token: self.token,
            target,
            transform: self.state.transform,
        }
    }

    /// Complete a switch: merge (fine level), refit, reindex, install.
    /// Entering Municipality re-applies the ticket's pre-switch transform
    /// verbatim; returning to Province resets to identity. A stale token
    /// means a newer switch superseded this one, and the completion is
    /// discarded without touching state.
    pub fn apply_switch(
        &mut self,
        ticket: SwitchTicket,
        collection: RegionCollection,
        overlay: Option<RegionCollection>,
    ) -> SwitchOutcome {
        if ticket.token != self.token {
            log::info!("discarding stale switch to {}", ticket.target.label());
            return SwitchOutcome::Stale;
        }

        let collection = match ticket.target {
            DetailLevel::Municipality => merge::merge_districts(collection),
            DetailLevel::Province => collection,
        };

        self.state.projection = Projection::fit(&collection, self.width, self.height);
        self.state.index = RegionIndex::build(&collection, ticket.target);
        self.state.regions = collection;
        match ticket.target {
            DetailLevel::Municipality => {
                self.state.overlay = overlay;
                self.state.transform = ticket.transform;
            }
            DetailLevel::Province => {
                self.state.overlay = None;
                self.state.transform = ZoomTransform::identity();
            }
        }
        self.state.level = ticket.target;
        self.phase = Phase::Steady;
        SwitchOutcome::Applied
    }

    /// A load failed: leave the prior dataset and transform unchanged
    pub fn abort_switch(&mut self, ticket: &SwitchTicket) {
        if ticket.token == self.token {
            self.phase = Phase::Steady;
        }
    }

    /// Viewport changed: refit the projection to the active collection
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width as f64;
        self.height = height as f64;
        self.state.projection = Projection::fit(&self.state.regions, self.width, self.height);
    }
}
