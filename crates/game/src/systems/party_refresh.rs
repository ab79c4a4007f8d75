use engine_core::{Phase, System, TickInfo};

use crate::packets;
use crate::state::GameState;

/// Broadcasts party member positions to every partied player at a fixed
/// interval (minimap dots).
pub struct PartyRefreshSystem;

impl System<GameState> for PartyRefreshSystem {
    fn name(&self) -> &'static str {
        "party_refresh"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn update(&mut self, state: &mut GameState, tick: TickInfo) {
        let interval = state.deps.tuning.party_refresh_ticks;
        if interval == 0 || tick.number % interval != 0 {
            return;
        }

        // (session, party) pairs first; member packets are built per party
        // against a stable snapshot of positions.
        let partied: Vec<_> = state
            .world
            .players()
            .filter(|p| p.party_id != 0)
            .map(|p| (p.session_id, p.party_id, p.char_id))
            .collect();

        for (sid, party_id, self_char) in &partied {
            let member_packets: Vec<Vec<u8>> = state
                .world
                .players()
                .filter(|m| m.party_id == *party_id && m.char_id != *self_char)
                .map(|m| packets::s_party_member(m.char_id, &m.name, m.x, m.y, m.map_id))
                .collect();
            for pkt in member_packets {
                state.sessions.send_to(*sid, pkt);
            }
        }
    }
}
