use std::time::{SystemTime, UNIX_EPOCH};

// Game time runs at 6x wall time from a fixed base epoch. The epoch is
// chosen so the client-visible i32 seconds value stays positive for the
// supported lifetime of a deployment; older emulators used a 2003 epoch
// whose scaled value no longer fits.
const BASE_EPOCH_MILLIS: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z

const SECS_PER_DAY: i64 = 86_400;

/// A point in game time: seconds since the base epoch, scaled 6x and
/// aligned to a 3-second boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTime {
    seconds: i64,
}

impl GameTime {
    /// Current game time from the system clock.
    pub fn now() -> Self {
        let wall_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self::from_wall_millis(wall_millis)
    }

    /// Game time for a given wall-clock instant (unix milliseconds).
    pub fn from_wall_millis(wall_millis: i64) -> Self {
        let scaled = ((wall_millis - BASE_EPOCH_MILLIS) * 6) / 1000;
        Self {
            seconds: scaled - scaled.rem_euclid(3),
        }
    }

    /// Raw value for the client game-time packet.
    pub fn seconds(&self) -> i32 {
        self.seconds as i32
    }

    pub fn hour(&self) -> i32 {
        (self.seconds.rem_euclid(SECS_PER_DAY) / 3600) as i32
    }

    pub fn minute(&self) -> i32 {
        (self.seconds.rem_euclid(3600) / 60) as i32
    }

    /// Night is everything outside 06:00-17:59.
    pub fn is_night(&self) -> bool {
        let h = self.hour();
        !(6..18).contains(&h)
    }
}
