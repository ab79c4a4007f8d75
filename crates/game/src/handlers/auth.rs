use net::PacketReader;
use session::{CloseReason, SessionId, SessionState};
use world::GameTime;

use crate::events::Event;
use crate::packets;
use crate::persist_ops;
use crate::state::GameState;
use crate::vision;

const LOGIN_OK: u8 = 0;
const LOGIN_BAD_ACCOUNT: u8 = 8;
const LOGIN_RATE_LIMITED: u8 = 22;

pub fn handle_version(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let _client_version = r.read_d();
    let Some(session) = state.sessions.get_mut(sid) else {
        return;
    };
    session.send(packets::s_version_ok(1));
    session.set_state(SessionState::VersionOk);
}

pub fn handle_login(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let account = r.read_s();
    let _password = r.read_s();

    let Some(session) = state.sessions.get_mut(sid) else {
        return;
    };

    if !state.login_limiter.try_attempt(session.peer.ip()) {
        tracing::warn!(%sid, peer = %session.peer, "login attempts over budget");
        session.send(packets::s_login_result(LOGIN_RATE_LIMITED));
        session.close(CloseReason::RateLimited);
        return;
    }

    if account.is_empty() {
        session.send(packets::s_login_result(LOGIN_BAD_ACCOUNT));
        return;
    }

    session.account = Some(account.clone());
    session.set_state(SessionState::Authenticated);
    session.send(packets::s_login_result(LOGIN_OK));

    match state.deps.db.characters().list_for_account(&account) {
        Ok(chars) => {
            let pkt = packets::s_char_list(&chars);
            state.sessions.send_to(sid, pkt);
        }
        Err(err) => {
            tracing::error!(%sid, %err, "char list query failed");
            state.sessions.send_to(sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
        }
    }
}

pub fn handle_enter_world(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let char_name = r.read_s();

    let Some(session) = state.sessions.get(sid) else {
        return;
    };
    let Some(account) = session.account.clone() else {
        tracing::debug!(%sid, "enter world without account");
        return;
    };

    let row = match state.deps.db.characters().get_by_name(&char_name) {
        Ok(Some(row)) => row,
        Ok(None) => {
            state.sessions.send_to(sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
            return;
        }
        Err(err) => {
            tracing::error!(%sid, %err, "character load failed");
            state.sessions.send_to(sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
    };

    if !row.account.eq_ignore_ascii_case(&account) {
        tracing::warn!(%sid, char_name, "enter world for foreign character");
        return;
    }

    // Names are unique while online; a colliding login is rejected here.
    if state.world.player_by_name(&row.name).is_some() {
        state.sessions.send_to(sid, packets::s_message_code(packets::MSG_NAME_IN_USE));
        return;
    }

    let player = match persist_ops::load_player(&state.deps.db, &row, sid) {
        Ok(player) => player,
        Err(err) => {
            tracing::error!(%sid, %err, "player load failed");
            state.sessions.send_to(sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
    };
    let char_id = player.char_id;
    let name = player.name.clone();

    if let Err(err) = state.world.add_player(player) {
        tracing::warn!(%sid, %err, "world entry rejected");
        state.sessions.send_to(sid, packets::s_message_code(packets::MSG_NAME_IN_USE));
        return;
    }

    if let Some(session) = state.sessions.get_mut(sid) {
        session.bind_char(char_id);
        session.set_state(SessionState::InWorld);
    }

    if let Some(p) = state.world.player(sid) {
        let own = packets::s_own_char_pack(p);
        state.sessions.send_to(sid, own);
    }
    let gt = GameTime::now();
    state.sessions.send_to(sid, packets::s_game_time(gt.seconds()));
    let weather = state.world.weather;
    state.sessions.send_to(sid, packets::s_weather(weather));

    vision::send_surroundings(state, sid);
    vision::broadcast_appear(state, sid);

    state.bus.publish(Event::PlayerLoggedIn {
        session_id: sid,
        char_id,
        name,
    });
    tracing::info!(%sid, char_id, "entered world");
}

/// Return to character select: persist, leave the world, regress the state
/// machine (which clears the character binding).
pub fn handle_restart(state: &mut GameState, sid: SessionId, _r: &mut PacketReader<'_>) {
    vision::broadcast_disappear(state, sid);
    if let Some(player) = state.world.remove_player(sid) {
        if let Err(err) = persist_ops::save_player(&state.deps.db, &player) {
            tracing::error!(%sid, %err, "save on restart failed");
        }
    }

    let Some(session) = state.sessions.get_mut(sid) else {
        return;
    };
    session.set_state(SessionState::ReturningToSelect);
    let account = session.account.clone().unwrap_or_default();

    match state.deps.db.characters().list_for_account(&account) {
        Ok(chars) => {
            let pkt = packets::s_char_list(&chars);
            state.sessions.send_to(sid, pkt);
        }
        Err(err) => tracing::error!(%sid, %err, "char list query failed"),
    }
}

pub fn handle_quit(state: &mut GameState, sid: SessionId, _r: &mut PacketReader<'_>) {
    if let Some(session) = state.sessions.get_mut(sid) {
        session.close(CloseReason::ClientQuit);
    }
}

/// Keep-alive; in-world it doubles as the game-time resync (day/night).
pub fn handle_alive(state: &mut GameState, sid: SessionId, _r: &mut PacketReader<'_>) {
    let Some(session) = state.sessions.get_mut(sid) else {
        return;
    };
    if session.state() == SessionState::InWorld {
        session.send(packets::s_game_time(GameTime::now().seconds()));
    }
}
