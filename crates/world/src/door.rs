/// Door action codes shared with the client.
pub const DOOR_ACTION_OPEN: u8 = 28;
pub const DOOR_ACTION_CLOSE: u8 = 29;
pub const DOOR_ACTION_DMG1: u8 = 32; // 5/6 HP remaining
pub const DOOR_ACTION_DMG2: u8 = 33; // 4/6
pub const DOOR_ACTION_DMG3: u8 = 34; // 3/6
pub const DOOR_ACTION_DMG4: u8 = 35; // 2/6
pub const DOOR_ACTION_DMG5: u8 = 36; // 1/6
pub const DOOR_ACTION_DIE: u8 = 37;

/// A door currently in-world. Multi-tile doors span a line between the left
/// and right edge coordinates; the entrance tile is what actually blocks
/// passage. Accessed only from the tick thread.
#[derive(Debug, Clone)]
pub struct DoorInfo {
    /// Unique object id (door id range).
    pub id: i32,
    /// Spawn template id.
    pub door_id: i32,
    pub gfx_id: i32,
    pub x: i32,
    pub y: i32,
    pub map_id: i16,
    /// 0 = indestructible.
    pub max_hp: i32,
    pub hp: i32,
    /// Clan keeper NPC id; 0 = public door.
    pub keeper_id: i32,
    /// 0 = "/" (NE-SW), 1 = "\" (NW-SE).
    pub direction: i32,
    pub left_edge: i32,
    pub right_edge: i32,
    pub open_status: u8,
    pub dmg_status: u8,
    pub dead: bool,
}

impl DoorInfo {
    /// Open or destroyed doors allow passage.
    pub fn is_passable(&self) -> bool {
        self.dead || self.open_status == DOOR_ACTION_OPEN
    }

    pub fn entrance_x(&self) -> i32 {
        if self.direction == 0 {
            self.x
        } else {
            self.x - 1
        }
    }

    pub fn entrance_y(&self) -> i32 {
        if self.direction == 0 {
            self.y + 1
        } else {
            self.y
        }
    }

    /// Status byte for the door perception packet.
    /// Priority: dead > open > damaged > closed.
    pub fn pack_status(&self) -> u8 {
        if self.dead {
            return DOOR_ACTION_DIE;
        }
        if self.open_status == DOOR_ACTION_OPEN {
            return DOOR_ACTION_OPEN;
        }
        if self.max_hp > 1 && self.dmg_status != 0 {
            return self.dmg_status;
        }
        self.open_status
    }

    /// Returns true if the state actually changed.
    pub fn open(&mut self) -> bool {
        if self.dead || self.open_status == DOOR_ACTION_OPEN {
            return false;
        }
        self.open_status = DOOR_ACTION_OPEN;
        true
    }

    pub fn close(&mut self) -> bool {
        if self.dead || self.open_status == DOOR_ACTION_CLOSE {
            return false;
        }
        self.open_status = DOOR_ACTION_CLOSE;
        true
    }

    /// Apply damage; returns true when the door just died. Dead doors are
    /// forced open so they stop blocking.
    pub fn receive_damage(&mut self, damage: i32) -> bool {
        if self.max_hp == 0 || self.hp <= 0 || self.dead {
            return false;
        }
        self.hp -= damage;
        if self.hp <= 0 {
            self.hp = 0;
            self.dead = true;
            self.dmg_status = DOOR_ACTION_DIE;
            self.open_status = DOOR_ACTION_OPEN;
            return true;
        }
        self.update_dmg_status();
        false
    }

    /// Reset to full HP and closed (clan repair).
    pub fn repair(&mut self) {
        if self.max_hp <= 1 {
            return;
        }
        self.dead = false;
        self.hp = self.max_hp;
        self.dmg_status = 0;
        self.open_status = DOOR_ACTION_CLOSE;
    }

    fn update_dmg_status(&mut self) {
        if self.max_hp <= 0 {
            return;
        }
        self.dmg_status = match () {
            _ if self.hp * 6 <= self.max_hp => DOOR_ACTION_DMG5,
            _ if self.hp * 6 <= self.max_hp * 2 => DOOR_ACTION_DMG4,
            _ if self.hp * 6 <= self.max_hp * 3 => DOOR_ACTION_DMG3,
            _ if self.hp * 6 <= self.max_hp * 4 => DOOR_ACTION_DMG2,
            _ if self.hp * 6 <= self.max_hp * 5 => DOOR_ACTION_DMG1,
            _ => 0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door(max_hp: i32) -> DoorInfo {
        DoorInfo {
            id: 300_000_001,
            door_id: 1,
            gfx_id: 88,
            x: 100,
            y: 100,
            map_id: 4,
            max_hp,
            hp: max_hp,
            keeper_id: 0,
            direction: 0,
            left_edge: 99,
            right_edge: 101,
            open_status: DOOR_ACTION_CLOSE,
            dmg_status: 0,
            dead: false,
        }
    }

    #[test]
    fn closed_door_blocks() {
        let d = door(0);
        assert!(!d.is_passable());
        assert_eq!(d.pack_status(), DOOR_ACTION_CLOSE);
    }

    #[test]
    fn open_then_close_round_trip() {
        let mut d = door(0);
        assert!(d.open());
        assert!(d.is_passable());
        assert!(!d.open()); // already open
        assert!(d.close());
        assert!(!d.is_passable());
    }

    #[test]
    fn entrance_depends_on_direction() {
        let mut d = door(0);
        d.direction = 0;
        assert_eq!((d.entrance_x(), d.entrance_y()), (100, 101));
        d.direction = 1;
        assert_eq!((d.entrance_x(), d.entrance_y()), (99, 100));
    }

    #[test]
    fn damage_stages_bucket_by_sixths() {
        let mut d = door(600);
        d.receive_damage(100); // 500/600 -> 5/6
        assert_eq!(d.dmg_status, DOOR_ACTION_DMG1);
        d.receive_damage(100); // 400/600
        assert_eq!(d.dmg_status, DOOR_ACTION_DMG2);
        d.receive_damage(100); // 300/600
        assert_eq!(d.dmg_status, DOOR_ACTION_DMG3);
        d.receive_damage(100); // 200/600
        assert_eq!(d.dmg_status, DOOR_ACTION_DMG4);
        d.receive_damage(100); // 100/600
        assert_eq!(d.dmg_status, DOOR_ACTION_DMG5);
    }

    #[test]
    fn death_forces_open() {
        let mut d = door(100);
        let died = d.receive_damage(150);
        assert!(died);
        assert!(d.dead);
        assert_eq!(d.hp, 0);
        assert!(d.is_passable());
        assert_eq!(d.pack_status(), DOOR_ACTION_DIE);
    }

    #[test]
    fn indestructible_door_ignores_damage() {
        let mut d = door(0);
        assert!(!d.receive_damage(1_000_000));
        assert!(!d.dead);
    }

    #[test]
    fn repair_restores_closed_full_hp() {
        let mut d = door(100);
        d.receive_damage(150);
        assert!(d.dead);
        d.repair();
        assert!(!d.dead);
        assert_eq!(d.hp, 100);
        assert_eq!(d.open_status, DOOR_ACTION_CLOSE);
        assert_eq!(d.dmg_status, 0);
    }
}
