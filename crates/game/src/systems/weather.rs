use engine_core::{Phase, System, TickInfo};
use world::GameTime;

use crate::packets;
use crate::state::GameState;

/// Snapshots the game hour once per tick; on a change, rolls new weather
/// and broadcasts it to every online session.
pub struct WeatherSystem {
    clock: fn() -> GameTime,
}

impl WeatherSystem {
    pub fn new() -> Self {
        Self {
            clock: GameTime::now,
        }
    }

    /// Inject a clock for tests.
    pub fn with_clock(clock: fn() -> GameTime) -> Self {
        Self { clock }
    }
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System<GameState> for WeatherSystem {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn update(&mut self, state: &mut GameState, _tick: TickInfo) {
        let hour = (self.clock)().hour();

        if state.world.last_hour < 0 {
            // First tick: seed the weather without announcing it.
            state.world.last_hour = hour;
            state.world.randomize_weather();
            return;
        }
        if hour == state.world.last_hour {
            return;
        }

        state.world.last_hour = hour;
        state.world.randomize_weather();
        let pkt = packets::s_weather(state.world.weather);
        for sid in state.world.player_sessions() {
            state.sessions.send_to(sid, pkt.clone());
        }
        tracing::debug!(hour, weather = state.world.weather, "weather changed");
    }
}
