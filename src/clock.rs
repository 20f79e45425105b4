use crate::settings::TypeSettings;

/// Per-refresh clock increment before speed scaling.
const TICK_STEP: f64 = 0.01;

/// Monotonic animation time, advanced once per display refresh.
///
/// Owned by the host refresh loop and passed into the pure composition
/// functions as an explicit `clock_time`; nothing in the core reads ambient
/// time. When the settings make animation pointless (`num_metaballs == 0` or
/// `metaball_speed == 0`) the host should drop its refresh subscription —
/// `is_live` is the gate — and `tick` on a non-live clock is a no-op, so a
/// late teardown cannot drift the output.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationClock {
    time: f64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current animation time.
    pub fn time(self) -> f64 {
        self.time
    }

    /// Whether a refresh subscription should exist for these settings.
    pub fn is_live(settings: &TypeSettings) -> bool {
        settings.num_metaballs > 0 && settings.metaball_speed > 0.0
    }

    /// Advance by one refresh tick, scaled by the current speed.
    pub fn tick(&mut self, settings: &TypeSettings) {
        if !Self::is_live(settings) {
            return;
        }
        self.time += TICK_STEP * settings.metaball_speed;
    }
}
