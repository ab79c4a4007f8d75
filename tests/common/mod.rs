//! Shared fixtures for the workspace scenario tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::Bytes;
use game::deps::{Deps, Rates, Tables, Tuning};
use game::GameState;
use persistence::GameDb;
use session::{Session, SessionId, SessionState};
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, watch};
use world::PlayerInfo;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    write!(f, "{content}").unwrap();
    f
}

/// Minimal but complete table set: one monster template, a big open map,
/// gold and a sword, an attack spell and a haste buff, one teleport
/// destination.
pub fn test_tables() -> Tables {
    let npcs_file = yaml_file(
        r#"
npcs:
  - id: 45000
    name: orc
    gfx_id: 100
    level: 5
    max_hp: 60
    attack: 8
    defense: 2
    exp: 30
    role: monster
"#,
    );
    let npcs = data::NpcTable::load(npcs_file.path()).unwrap();

    let spawns_file = yaml_file("spawns: []\n");
    let spawns = data::SpawnTable::load(spawns_file.path(), &npcs).unwrap();

    let items_file = yaml_file(
        r#"
items:
  - { id: 40308, name: adena, kind: etc, stackable: true }
  - { id: 1, name: short sword, kind: weapon, weight: 30, value: 50 }
"#,
    );
    let skills_file = yaml_file(
        r#"
skills:
  - { id: 1, name: energy bolt, mp_cost: 4, range: 10, power: 12 }
  - { id: 26, name: haste, mp_cost: 10, duration_secs: 300 }
"#,
    );
    let maps_file = yaml_file(
        r#"
maps:
  - id: 4
    origin_x: 0
    origin_y: 0
    width: 1000
    height: 1000
"#,
    );
    let gfx_file = yaml_file("door_gfxs: []\n");
    let doors_file = yaml_file("doors: []\n");
    let teleports_file = yaml_file(
        "teleports:\n  - { id: 1, name: town, map_id: 4, x: 200, y: 200, price: 0 }\n",
    );
    let polys_file = yaml_file("polymorphs: []\n");

    Tables {
        npcs,
        spawns,
        items: data::ItemTable::load(items_file.path()).unwrap(),
        skills: data::SkillTable::load(skills_file.path()).unwrap(),
        maps: data::MapData::load(maps_file.path()).unwrap(),
        doors: data::DoorTable::load(gfx_file.path(), doors_file.path()).unwrap(),
        teleports: data::TeleportTable::load(teleports_file.path()).unwrap(),
        polymorphs: data::PolymorphTable::load(polys_file.path()).unwrap(),
    }
}

pub fn test_state() -> GameState {
    let deps = Deps {
        tuning: Tuning {
            ground_item_expiry_ticks: 5,
            party_refresh_ticks: 2,
            batch_interval_ticks: 10,
            ..Tuning::default()
        },
        rates: Rates::default(),
        tables: test_tables(),
        db: GameDb::open_memory().unwrap(),
    };
    GameState::new(deps, 0)
}

/// Register an in-world session plus its character; returns the egress
/// receiver so tests can observe flushed packets.
pub fn join_world(
    state: &mut GameState,
    sid: u64,
    char_id: i32,
    name: &str,
    x: i32,
    y: i32,
) -> mpsc::Receiver<Bytes> {
    let rx = add_session(state, sid, SessionState::InWorld);
    state
        .world
        .add_player(test_player(sid, char_id, name, x, y))
        .unwrap();
    if let Some(session) = state.sessions.get_mut(SessionId(sid)) {
        session.bind_char(char_id);
    }
    rx
}

pub fn add_session(
    state: &mut GameState,
    sid: u64,
    session_state: SessionState,
) -> mpsc::Receiver<Bytes> {
    let (egress_tx, egress_rx) = mpsc::channel(256);
    let (close_tx, _close_rx) = watch::channel(false);
    let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 10_000 + sid as u16);
    let mut session = Session::new(SessionId(sid), peer, egress_tx, close_tx);
    session.set_state(session_state);
    state.sessions.add(session);
    egress_rx
}

pub fn test_player(sid: u64, char_id: i32, name: &str, x: i32, y: i32) -> PlayerInfo {
    PlayerInfo {
        session_id: SessionId(sid),
        char_id,
        account: "acct".to_string(),
        name: name.to_string(),
        map_id: 4,
        x,
        y,
        heading: 0,
        level: 10,
        hp: 100,
        max_hp: 100,
        mp: 50,
        max_mp: 50,
        exp: 0,
        food: 40,
        lawful: 0,
        adena: 1000,
        inventory: Vec::new(),
        equipment: HashMap::new(),
        buffs: HashMap::new(),
        party_id: 0,
        clan_id: 0,
        buddies: Default::default(),
        excludes: Default::default(),
        dead: false,
        paralyzed: false,
        sleeped: false,
        pending_teleport: false,
        last_move_millis: 0,
        move_speed: world::entities::MOVE_SPEED_NORMAL,
    }
}

/// Drain every packet currently in an egress receiver.
pub fn drain(rx: &mut mpsc::Receiver<Bytes>) -> Vec<Bytes> {
    let mut packets = Vec::new();
    while let Ok(pkt) = rx.try_recv() {
        packets.push(pkt);
    }
    packets
}

/// Count the drained packets starting with an opcode.
pub fn count_opcode(packets: &[Bytes], opcode: u8) -> usize {
    packets.iter().filter(|p| p.first() == Some(&opcode)).count()
}
