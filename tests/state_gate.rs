//! State-gated dispatch over the real handler table.

mod common;

use common::{add_session, drain, test_state};
use game::packets::{C_MOVE, C_QUIT};
use net::Registry;
use session::{SessionId, SessionState};

fn registry() -> Registry<game::GameState> {
    let mut reg = Registry::new();
    game::handlers::register_all(&mut reg);
    reg
}

#[test]
fn in_world_opcode_dropped_outside_in_world() {
    // A session still at VersionOk sends C_MOVE (registered for InWorld
    // only): no handler runs, the session stays open and unchanged.
    let mut state = test_state();
    let mut rx = add_session(&mut state, 1, SessionState::VersionOk);
    let reg = registry();

    let payload = [C_MOVE, 0, 0, 0, 0, 0x49];
    let ran = reg.dispatch(&mut state, SessionId(1), SessionState::VersionOk, &payload);

    assert!(!ran);
    let session = state.sessions.get(SessionId(1)).unwrap();
    assert_eq!(session.state(), SessionState::VersionOk);
    assert!(session.close_reason().is_none());
    assert_eq!(session.pending_output(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn same_opcode_runs_once_in_world() {
    let mut state = test_state();
    let _rx = common::join_world(&mut state, 1, 100, "hero", 100, 100);
    let reg = registry();

    // heading byte is XOR'd with 0x49 on the wire; 0x49 decodes to 0.
    let payload = [C_MOVE, 0, 0, 0, 0, 0x49];
    let ran = reg.dispatch(&mut state, SessionId(1), SessionState::InWorld, &payload);
    assert!(ran);
    // The step committed: north of (100,100).
    let p = state.world.player(SessionId(1)).unwrap();
    assert_eq!((p.x, p.y), (100, 99));
}

#[test]
fn handlers_only_run_in_declared_states() {
    // Dispatch every registered opcode from Handshake; only C_VERSION may
    // run. A handler invoked from an undeclared state would mutate the
    // session or world, so assert nothing changed.
    let mut state = test_state();
    let _rx = add_session(&mut state, 1, SessionState::Handshake);
    let reg = registry();

    for opcode in [C_MOVE, C_QUIT] {
        let ran = reg.dispatch(
            &mut state,
            SessionId(1),
            SessionState::Handshake,
            &[opcode, 0, 0, 0, 0],
        );
        assert!(!ran, "opcode {opcode} ran from Handshake");
    }
    assert_eq!(
        state.sessions.get(SessionId(1)).unwrap().state(),
        SessionState::Handshake
    );
}

#[test]
fn quit_is_legal_from_any_alive_state() {
    let mut state = test_state();
    let _rx = add_session(&mut state, 1, SessionState::Authenticated);
    let reg = registry();

    let ran = reg.dispatch(
        &mut state,
        SessionId(1),
        SessionState::Authenticated,
        &[C_QUIT],
    );
    assert!(ran);
    assert!(state.sessions.get(SessionId(1)).unwrap().is_closed());
}
