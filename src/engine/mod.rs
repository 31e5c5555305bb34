use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::arena::Arena;
use crate::constants::{BOMB_FUSE_TICKS, DEFAULT_ARENA, DEFAULT_BOMB_CAPACITY, DEFAULT_FLAME_RANGE};
use crate::map::parse_arena;
use crate::rng::Rng;
use crate::types::{
    Action, BombId, Coords, FlameId, FlameShape, Occupant, OccupantKind, PlayerId, PlayerStatus,
};

mod explosion;
mod spawn;

#[derive(Clone, Debug)]
struct PlayerInternal {
    name: String,
    number: Option<u32>,
    coords: Option<Coords>,
    flame: u32,
    bomb: u32,
    live_bombs: u32,
    kills: u32,
    deaths: u32,
    suicides: u32,
    sticky: Option<Action>,
}

#[derive(Clone, Debug)]
struct BombInternal {
    coords: Coords,
    owner: PlayerId,
    original_owner: PlayerId,
    flame_range: u32,
    ticks_left: u32,
}

#[derive(Clone, Debug)]
struct FlameInternal {
    coords: Coords,
    shape: FlameShape,
    owner: PlayerId,
    original_owner: PlayerId,
}

/// One game instance: arena, roster, action queue and the per-tick engine.
/// All mutation is synchronous; callers serialize access and drive the three
/// phases (`age_flames`, `resolve_actions`, `age_bombs`) in that order within
/// any logical tick.
#[derive(Clone, Debug)]
pub struct GameState {
    arena: Arena,
    players: BTreeMap<PlayerId, PlayerInternal>,
    join_queue: VecDeque<PlayerId>,
    pending: VecDeque<(PlayerId, Action)>,
    bombs: BTreeMap<BombId, BombInternal>,
    flames: BTreeMap<FlameId, FlameInternal>,
    rng: Rng,
    next_player_id: u64,
    next_bomb_id: u64,
    next_flame_id: u64,
    next_ordinal: u32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self::with_arena(parse_arena(DEFAULT_ARENA), seed)
    }

    pub fn from_text(text: &str, seed: u64) -> Self {
        Self::with_arena(parse_arena(text), seed)
    }

    pub fn with_arena(arena: Arena, seed: u64) -> Self {
        Self {
            arena,
            players: BTreeMap::new(),
            join_queue: VecDeque::new(),
            pending: VecDeque::new(),
            bombs: BTreeMap::new(),
            flames: BTreeMap::new(),
            rng: Rng::new(seed),
            next_player_id: 1,
            next_bomb_id: 1,
            next_flame_id: 1,
            next_ordinal: 1,
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Registers a player and queues them for the next `spawn_all`. The
    /// handle stays valid until `remove_player`, whether or not the player
    /// ever gets a spawn point.
    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players.insert(
            id,
            PlayerInternal {
                name: name.to_string(),
                number: None,
                coords: None,
                flame: DEFAULT_FLAME_RANGE,
                bomb: DEFAULT_BOMB_CAPACITY,
                live_bombs: 0,
                kills: 0,
                deaths: 0,
                suicides: 0,
                sticky: None,
            },
        );
        self.join_queue.push_back(id);
        id
    }

    /// Removes a player from the roster and, if placed, from the arena.
    /// Their live bombs keep ticking and explode normally; owner lookups
    /// simply find nobody to credit.
    pub fn remove_player(&mut self, id: PlayerId) {
        if let Some(player) = self.players.remove(&id) {
            if let Some(coords) = player.coords {
                self.arena
                    .remove(coords, Occupant::Player(id))
                    .expect("placed player has an occupant at its coords");
            }
        }
        self.join_queue.retain(|queued| *queued != id);
        self.pending.retain(|(queued, _)| *queued != id);
    }

    pub fn set_player_name(&mut self, id: PlayerId, name: &str) {
        if let Some(player) = self.players.get_mut(&id) {
            player.name = name.to_string();
        }
    }

    /// Appends to the FIFO intake queue. Unknown players are ignored; intake
    /// never fails from a client's point of view.
    pub fn enqueue_action(&mut self, id: PlayerId, action: Action) {
        if self.players.contains_key(&id) {
            self.pending.push_back((id, action));
        }
    }

    /// Runs the three phases in their fixed order as one logical tick.
    pub fn advance_tick(&mut self) {
        self.age_flames();
        self.resolve_actions();
        self.age_bombs();
    }

    /// Phase 1: last tick's fire burns out. Runs before action resolution so
    /// stale flame cannot kill a player moving this tick.
    pub fn age_flames(&mut self) {
        let flames = std::mem::take(&mut self.flames);
        for (id, flame) in flames {
            self.arena
                .remove(flame.coords, Occupant::Flame(id))
                .expect("active flame has an occupant at its coords");
        }
    }

    /// Phase 2: drain queued actions in FIFO order. The first action per
    /// player wins the tick; later ones are deferred to the next tick, never
    /// dropped. Players with nothing queued replay their sticky action.
    pub fn resolve_actions(&mut self) {
        let mut acted: HashSet<PlayerId> = HashSet::new();
        let mut deferred: VecDeque<(PlayerId, Action)> = VecDeque::new();

        while let Some((id, action)) = self.pending.pop_front() {
            if !self.players.contains_key(&id) {
                continue;
            }
            if acted.contains(&id) {
                deferred.push_back((id, action));
                continue;
            }
            acted.insert(id);
            self.execute_action(id, action);
        }

        let idle: Vec<(PlayerId, Action)> = self
            .players
            .iter()
            .filter(|(id, player)| player.coords.is_some() && !acted.contains(*id))
            .filter_map(|(id, player)| player.sticky.map(|action| (*id, action)))
            .collect();
        for (id, action) in idle {
            self.execute_action(id, action);
        }

        self.pending = deferred;
    }

    /// Phase 3: countdowns tick down; zero means boom. Bombs consumed by a
    /// chain earlier in the same pass are skipped.
    pub fn age_bombs(&mut self) {
        for bomb in self.bombs.values_mut() {
            bomb.ticks_left = bomb.ticks_left.saturating_sub(1);
        }
        let expired: Vec<BombId> = self
            .bombs
            .iter()
            .filter(|(_, bomb)| bomb.ticks_left == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if self.bombs.contains_key(&id) {
                self.explode(id);
            }
        }
    }

    fn execute_action(&mut self, id: PlayerId, action: Action) {
        match action {
            // bomb drops are one-shot; they clear the sticky action
            Action::DropBomb => {
                if let Some(player) = self.players.get_mut(&id) {
                    player.sticky = None;
                }
                self.drop_bomb(id);
            }
            _ => {
                if let Some(player) = self.players.get_mut(&id) {
                    player.sticky = Some(action);
                }
                self.try_move(id, action);
            }
        }
    }

    /// Movement fails silently on any obstacle. On success the destination's
    /// prior occupants each get a pickup notification.
    fn try_move(&mut self, id: PlayerId, action: Action) {
        let Some((dx, dy)) = action.move_offset() else {
            return;
        };
        let Some(from) = self.players.get(&id).and_then(|player| player.coords) else {
            return;
        };
        let dest = Coords {
            x: from.x + dx,
            y: from.y + dy,
        };
        let Ok(occupants) = self.arena.get(dest) else {
            return;
        };
        if occupants.iter().any(|o| o.blocks_movement()) {
            return;
        }

        self.arena
            .remove(from, Occupant::Player(id))
            .expect("moving player has an occupant at its coords");
        self.arena
            .add(dest, Occupant::Player(id))
            .expect("destination was readable above");
        if let Some(player) = self.players.get_mut(&id) {
            player.coords = Some(dest);
        }

        for occupant in occupants {
            self.picked_up(occupant, dest, id);
        }
    }

    fn picked_up(&mut self, occupant: Occupant, coords: Coords, by: PlayerId) {
        // a pickup earlier in the stack may have killed the player
        let alive_here = self
            .players
            .get(&by)
            .map(|player| player.coords == Some(coords))
            .unwrap_or(false);
        if !alive_here {
            return;
        }

        match occupant {
            Occupant::PowerupFlame => {
                if self.arena.remove(coords, occupant).is_ok() {
                    if let Some(player) = self.players.get_mut(&by) {
                        player.flame += 1;
                    }
                }
            }
            Occupant::PowerupBomb => {
                if self.arena.remove(coords, occupant).is_ok() {
                    if let Some(player) = self.players.get_mut(&by) {
                        player.bomb += 1;
                    }
                }
            }
            // walking into live fire is as deadly as being caught in it
            Occupant::Flame(flame_id) => {
                if let Some(flame) = self.flames.get(&flame_id) {
                    let (owner, original_owner) = (flame.owner, flame.original_owner);
                    self.kill_player(by, owner, original_owner);
                }
            }
            _ => {}
        }
    }

    /// Refused silently when the cell already holds a bomb or the player is
    /// at their live-bomb capacity.
    fn drop_bomb(&mut self, id: PlayerId) {
        let Some(player) = self.players.get(&id) else {
            return;
        };
        let Some(coords) = player.coords else {
            return;
        };
        if player.live_bombs >= player.bomb {
            return;
        }
        match self.arena.has_kind(coords, OccupantKind::Bomb) {
            Ok(false) => {}
            _ => return,
        }

        let flame_range = player.flame;
        let bomb_id = BombId(self.next_bomb_id);
        self.next_bomb_id += 1;
        self.bombs.insert(
            bomb_id,
            BombInternal {
                coords,
                owner: id,
                original_owner: id,
                flame_range,
                ticks_left: BOMB_FUSE_TICKS,
            },
        );
        self.arena
            .add(coords, Occupant::Bomb(bomb_id))
            .expect("player coords are inside the arena");
        if let Some(player) = self.players.get_mut(&id) {
            player.live_bombs += 1;
        }
    }

    pub fn player_stats(&self, id: PlayerId) -> Option<PlayerStatus> {
        self.players.get(&id).map(|player| PlayerStatus {
            coords: player.coords,
            number: player.number,
            flame: player.flame,
            bomb: player.bomb,
            kills: player.kills,
            deaths: player.deaths,
            suicides: player.suicides,
            name: player.name.clone(),
        })
    }

    /// Rectangular character grid, one glyph per cell, rows newline
    /// separated. Terrain uses the arena-file characters so a freshly loaded
    /// arena round-trips; dynamic entities render on top by display rank.
    pub fn snapshot(&self) -> String {
        let cols = self.arena.cols() as usize;
        let mut rows: Vec<String> = Vec::with_capacity(self.arena.rows() as usize);
        let mut row = String::with_capacity(cols);
        for (x, _, occupants) in self.arena.iter() {
            if x == 0 && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            let top = occupants.iter().max_by_key(|o| o.rank());
            row.push(match top {
                Some(occupant) => self.glyph(*occupant),
                None => ' ',
            });
        }
        if !row.is_empty() {
            rows.push(row);
        }
        rows.join("\n")
    }

    fn glyph(&self, occupant: Occupant) -> char {
        match occupant {
            Occupant::Block => 'B',
            Occupant::DestructibleBlock => '.',
            Occupant::SpawnPoint => 'S',
            Occupant::PowerupFlame => 'f',
            Occupant::PowerupBomb => 'b',
            Occupant::Bomb(_) => 'Q',
            Occupant::Player(id) => self
                .players
                .get(&id)
                .and_then(|player| player.number)
                .and_then(|number| char::from_digit(number % 10, 10))
                .unwrap_or('?'),
            Occupant::Flame(id) => self
                .flames
                .get(&id)
                .map(|flame| flame.shape.glyph())
                .unwrap_or('+'),
        }
    }
}
