//! Opcode constants and server packet builders.
//!
//! Field layouts are fixed per opcode; builders keep every layout in one
//! place so handlers and systems never hand-assemble bytes.

use net::PacketWriter;
use persistence::CharacterRow;
use world::{DoorInfo, GroundItem, InvItem, NpcInfo, PlayerInfo, SummonInfo};

// Client -> server.
pub const C_VERSION: u8 = 71;
pub const C_LOGIN: u8 = 119;
pub const C_ENTER_WORLD: u8 = 83;
pub const C_RESTART: u8 = 204;
pub const C_QUIT: u8 = 57;
pub const C_ALIVE: u8 = 253;
pub const C_MOVE: u8 = 29;
pub const C_CHANGE_HEADING: u8 = 225;
pub const C_ATTACK: u8 = 103;
pub const C_FAR_ATTACK: u8 = 141;
pub const C_USE_SKILL: u8 = 88;
pub const C_PICKUP: u8 = 34;
pub const C_DROP: u8 = 217;
pub const C_GIVE: u8 = 173;
pub const C_OPEN_DOOR: u8 = 123;
pub const C_TELEPORT: u8 = 126;

// Server -> client.
pub const S_VERSION_OK: u8 = 125;
pub const S_LOGIN_RESULT: u8 = 21;
pub const S_CHAR_LIST: u8 = 99;
pub const S_OWN_CHAR_PACK: u8 = 66;
pub const S_PUT_OBJECT: u8 = 3;
pub const S_NPC_PACK: u8 = 11;
pub const S_SUMMON_PACK: u8 = 12;
pub const S_DROP_ITEM: u8 = 6;
pub const S_DOOR_PACK: u8 = 109;
pub const S_MOVE_OBJECT: u8 = 18;
pub const S_REMOVE_OBJECT: u8 = 9;
pub const S_CHANGE_HEADING: u8 = 30;
pub const S_ATTACK: u8 = 35;
pub const S_SKILL_EFFECT: u8 = 16;
pub const S_HP_UPDATE: u8 = 26;
pub const S_EXP: u8 = 44;
pub const S_DEATH: u8 = 77;
pub const S_WEATHER: u8 = 112;
pub const S_GAME_TIME: u8 = 118;
pub const S_MESSAGE_CODE: u8 = 75;
pub const S_PARTY_MEMBER: u8 = 59;
pub const S_TILE_FLAG: u8 = 14;
pub const S_INVENTORY_ADD: u8 = 8;
pub const S_INVENTORY_REMOVE: u8 = 15;
pub const S_ADENA: u8 = 28;
pub const S_BUFF_ICON: u8 = 42;

// User-facing message codes (validation failures never disturb world
// state; the client renders these).
pub const MSG_TARGET_NOT_FOUND: u16 = 109;
pub const MSG_OUT_OF_RANGE: u16 = 205;
pub const MSG_NOT_ENOUGH_GOLD: u16 = 189;
pub const MSG_TRY_AGAIN: u16 = 74;
pub const MSG_NAME_IN_USE: u16 = 34;
pub const MSG_CANNOT_NOW: u16 = 76;
pub const MSG_DOOR_LOCKED: u16 = 980;

pub fn s_version_ok(server_id: u8) -> Vec<u8> {
    let mut w = PacketWriter::new(S_VERSION_OK);
    w.write_c(0).write_c(server_id);
    w.into_bytes()
}

pub fn s_login_result(code: u8) -> Vec<u8> {
    let mut w = PacketWriter::new(S_LOGIN_RESULT);
    w.write_c(code);
    w.into_bytes()
}

pub fn s_char_list(chars: &[CharacterRow]) -> Vec<u8> {
    let mut w = PacketWriter::new(S_CHAR_LIST);
    w.write_c(chars.len() as u8);
    for c in chars {
        w.write_s(&c.name)
            .write_c(c.level as u8)
            .write_h(c.hp.min(i32::from(u16::MAX)) as u16)
            .write_h(c.mp.min(i32::from(u16::MAX)) as u16);
    }
    w.into_bytes()
}

pub fn s_own_char_pack(p: &PlayerInfo) -> Vec<u8> {
    let mut w = PacketWriter::new(S_OWN_CHAR_PACK);
    w.write_d(p.char_id)
        .write_h(p.x as u16)
        .write_h(p.y as u16)
        .write_h(p.map_id as u16)
        .write_c(p.heading)
        .write_c(p.level as u8)
        .write_d(p.hp)
        .write_d(p.max_hp)
        .write_d(p.mp)
        .write_d(p.max_mp)
        .write_s(&p.name);
    w.into_bytes()
}

/// Another player entering the viewer's perception.
pub fn s_put_object(p: &PlayerInfo) -> Vec<u8> {
    let mut w = PacketWriter::new(S_PUT_OBJECT);
    w.write_d(p.char_id)
        .write_h(p.x as u16)
        .write_h(p.y as u16)
        .write_c(p.heading)
        .write_c(p.level as u8)
        .write_c(p.dead as u8)
        .write_s(&p.name);
    w.into_bytes()
}

pub fn s_npc_pack(n: &NpcInfo) -> Vec<u8> {
    let mut w = PacketWriter::new(S_NPC_PACK);
    w.write_d(n.id)
        .write_d(n.gfx_id)
        .write_h(n.x as u16)
        .write_h(n.y as u16)
        .write_c(n.heading)
        .write_c(n.dead as u8)
        .write_s(&n.name);
    w.into_bytes()
}

pub fn s_summon_pack(s: &SummonInfo, master_name: &str) -> Vec<u8> {
    let mut w = PacketWriter::new(S_SUMMON_PACK);
    w.write_d(s.id)
        .write_d(s.gfx_id)
        .write_h(s.x as u16)
        .write_h(s.y as u16)
        .write_c(s.heading)
        .write_s(master_name);
    w.into_bytes()
}

pub fn s_drop_item(g: &GroundItem) -> Vec<u8> {
    let mut w = PacketWriter::new(S_DROP_ITEM);
    w.write_d(g.id)
        .write_d(g.item_id)
        .write_d(g.count)
        .write_h(g.x as u16)
        .write_h(g.y as u16)
        .write_c(g.enchant_lvl as u8);
    w.into_bytes()
}

pub fn s_door_pack(d: &DoorInfo) -> Vec<u8> {
    let mut w = PacketWriter::new(S_DOOR_PACK);
    w.write_d(d.id)
        .write_d(d.gfx_id)
        .write_h(d.x as u16)
        .write_h(d.y as u16)
        .write_c(d.direction as u8)
        .write_c(d.pack_status());
    w.into_bytes()
}

/// An entity the viewer already perceives stepped from (x, y).
pub fn s_move_object(object_id: i32, from_x: i32, from_y: i32, heading: u8) -> Vec<u8> {
    let mut w = PacketWriter::new(S_MOVE_OBJECT);
    w.write_d(object_id)
        .write_h(from_x as u16)
        .write_h(from_y as u16)
        .write_c(heading);
    w.into_bytes()
}

pub fn s_remove_object(object_id: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_REMOVE_OBJECT);
    w.write_d(object_id);
    w.into_bytes()
}

pub fn s_change_heading(object_id: i32, heading: u8) -> Vec<u8> {
    let mut w = PacketWriter::new(S_CHANGE_HEADING);
    w.write_d(object_id).write_c(heading);
    w.into_bytes()
}

pub fn s_attack(attacker_id: i32, target_id: i32, damage: i32, heading: u8) -> Vec<u8> {
    let mut w = PacketWriter::new(S_ATTACK);
    w.write_d(attacker_id)
        .write_d(target_id)
        .write_h(damage.clamp(0, i32::from(u16::MAX)) as u16)
        .write_c(heading);
    w.into_bytes()
}

pub fn s_skill_effect(caster_id: i32, target_id: i32, skill_id: i32, value: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_SKILL_EFFECT);
    w.write_d(caster_id)
        .write_d(target_id)
        .write_d(skill_id)
        .write_d(value);
    w.into_bytes()
}

pub fn s_hp_update(hp: i32, max_hp: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_HP_UPDATE);
    w.write_h(hp.clamp(0, i32::from(u16::MAX)) as u16)
        .write_h(max_hp.clamp(0, i32::from(u16::MAX)) as u16);
    w.into_bytes()
}

pub fn s_exp(exp: i64, level: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_EXP);
    w.write_d(exp.clamp(0, i64::from(i32::MAX)) as i32)
        .write_c(level as u8);
    w.into_bytes()
}

pub fn s_death(object_id: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_DEATH);
    w.write_d(object_id);
    w.into_bytes()
}

pub fn s_weather(weather: u8) -> Vec<u8> {
    let mut w = PacketWriter::new(S_WEATHER);
    w.write_c(weather);
    w.into_bytes()
}

pub fn s_game_time(seconds: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_GAME_TIME);
    w.write_d(seconds);
    w.into_bytes()
}

pub fn s_message_code(code: u16) -> Vec<u8> {
    let mut w = PacketWriter::new(S_MESSAGE_CODE);
    w.write_h(code);
    w.into_bytes()
}

pub fn s_party_member(char_id: i32, name: &str, x: i32, y: i32, map_id: i16) -> Vec<u8> {
    let mut w = PacketWriter::new(S_PARTY_MEMBER);
    w.write_d(char_id)
        .write_h(x as u16)
        .write_h(y as u16)
        .write_h(map_id as u16)
        .write_s(name);
    w.into_bytes()
}

/// Client-side collision hint: block or unblock one tile edge.
pub fn s_tile_flag(x: i32, y: i32, blocked: bool) -> Vec<u8> {
    let mut w = PacketWriter::new(S_TILE_FLAG);
    w.write_h(x as u16).write_h(y as u16).write_c(blocked as u8);
    w.into_bytes()
}

pub fn s_inventory_add(item: &InvItem) -> Vec<u8> {
    let mut w = PacketWriter::new(S_INVENTORY_ADD);
    w.write_d(item.id)
        .write_d(item.item_id)
        .write_d(item.count)
        .write_c(item.enchant_lvl as u8)
        .write_c(item.bless as u8);
    w.into_bytes()
}

pub fn s_inventory_remove(object_id: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_INVENTORY_REMOVE);
    w.write_d(object_id);
    w.into_bytes()
}

pub fn s_adena(amount: i64) -> Vec<u8> {
    let mut w = PacketWriter::new(S_ADENA);
    w.write_d(amount.clamp(0, i64::from(i32::MAX)) as i32);
    w.into_bytes()
}

pub fn s_buff_icon(skill_id: i32, remaining_secs: i32) -> Vec<u8> {
    let mut w = PacketWriter::new(S_BUFF_ICON);
    w.write_d(skill_id).write_h(remaining_secs.clamp(0, i32::from(u16::MAX)) as u16);
    w.into_bytes()
}
