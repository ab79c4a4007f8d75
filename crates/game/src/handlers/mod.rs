//! Packet handlers: parse, validate, enqueue.
//!
//! Heavy operations (attack, cast) are queued for Phase 2; a small set of
//! idempotent fast paths (keep-alive, heading change) mutate directly.

pub mod auth;
pub mod combat;
pub mod door;
pub mod item;
pub mod movement;
pub mod skill;
pub mod teleport;
pub mod trade;

use net::Registry;
use session::SessionState;

use crate::packets::*;
use crate::state::GameState;

const HANDSHAKE: &[SessionState] = &[SessionState::Handshake];
const VERSION_OK: &[SessionState] = &[SessionState::VersionOk];
const CHAR_SELECT: &[SessionState] = &[
    SessionState::Authenticated,
    SessionState::ReturningToSelect,
];
const IN_WORLD: &[SessionState] = &[SessionState::InWorld];
const ANY_ALIVE: &[SessionState] = &[
    SessionState::VersionOk,
    SessionState::Authenticated,
    SessionState::InWorld,
    SessionState::ReturningToSelect,
];

/// Register every opcode with the states in which it is legal. The table
/// is frozen after this returns.
pub fn register_all(reg: &mut Registry<GameState>) {
    reg.register(C_VERSION, HANDSHAKE, auth::handle_version);
    reg.register(C_LOGIN, VERSION_OK, auth::handle_login);
    reg.register(C_ENTER_WORLD, CHAR_SELECT, auth::handle_enter_world);
    reg.register(C_RESTART, IN_WORLD, auth::handle_restart);
    reg.register(C_QUIT, ANY_ALIVE, auth::handle_quit);
    reg.register(C_ALIVE, ANY_ALIVE, auth::handle_alive);

    reg.register(C_MOVE, IN_WORLD, movement::handle_move);
    reg.register(C_CHANGE_HEADING, IN_WORLD, movement::handle_change_heading);

    reg.register(C_ATTACK, IN_WORLD, combat::handle_attack);
    reg.register(C_FAR_ATTACK, IN_WORLD, combat::handle_far_attack);
    reg.register(C_USE_SKILL, IN_WORLD, skill::handle_use_skill);

    reg.register(C_PICKUP, IN_WORLD, item::handle_pickup);
    reg.register(C_DROP, IN_WORLD, item::handle_drop);
    reg.register(C_GIVE, IN_WORLD, trade::handle_give);

    reg.register(C_OPEN_DOOR, IN_WORLD, door::handle_open_door);
    reg.register(C_TELEPORT, IN_WORLD, teleport::handle_teleport);
}
