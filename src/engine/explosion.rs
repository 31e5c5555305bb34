use super::*;
use crate::constants::{POWERUP_BOMB_CHANCE, POWERUP_FLAME_CHANCE};

/// Walk parameters for one explosion arm.
const ARMS: [(i32, i32, FlameShape, FlameShape); 4] = [
    (0, -1, FlameShape::Vertical, FlameShape::EndUp),
    (0, 1, FlameShape::Vertical, FlameShape::EndDown),
    (-1, 0, FlameShape::Horizontal, FlameShape::EndLeft),
    (1, 0, FlameShape::Horizontal, FlameShape::EndRight),
];

impl GameState {
    /// Removes the bomb and floods flame outward. Reactions run
    /// synchronously per placed flame, so chain ignitions, deaths and
    /// powerup destruction all resolve within this call.
    pub(super) fn explode(&mut self, bomb_id: BombId) {
        let Some(bomb) = self.bombs.remove(&bomb_id) else {
            return;
        };
        self.arena
            .remove(bomb.coords, Occupant::Bomb(bomb_id))
            .expect("live bomb has an occupant at its coords");
        if let Some(owner) = self.players.get_mut(&bomb.owner) {
            owner.live_bombs = owner.live_bombs.saturating_sub(1);
        }

        self.place_flame(bomb.coords, FlameShape::Cross, bomb.owner, bomb.original_owner);

        for (dx, dy, segment, end) in ARMS {
            for step in 1..=bomb.flame_range as i32 {
                let cell = Coords {
                    x: bomb.coords.x + dx * step,
                    y: bomb.coords.y + dy * step,
                };
                let Ok(occupants) = self.arena.get(cell) else {
                    break;
                };
                // indestructible walls stop the arm before their own cell
                if occupants.iter().any(|o| *o == Occupant::Block) {
                    break;
                }

                let hits_destructible = occupants
                    .iter()
                    .any(|o| *o == Occupant::DestructibleBlock);
                let next = Coords {
                    x: cell.x + dx,
                    y: cell.y + dy,
                };
                let next_blocked = match self.arena.get(next) {
                    Ok(beyond) => beyond.iter().any(|o| *o == Occupant::Block),
                    Err(_) => true,
                };
                let is_last =
                    hits_destructible || step == bomb.flame_range as i32 || next_blocked;
                let shape = if is_last { end } else { segment };

                self.place_flame(cell, shape, bomb.owner, bomb.original_owner);
                if hits_destructible {
                    break;
                }
            }
        }
    }

    /// Places one flame, merging perpendicular overlap from another live
    /// explosion into a cross, then notifies every prior occupant.
    fn place_flame(
        &mut self,
        coords: Coords,
        shape: FlameShape,
        owner: PlayerId,
        original_owner: PlayerId,
    ) {
        let Ok(before) = self.arena.get(coords) else {
            return;
        };

        let mut shape = shape;
        for occupant in &before {
            let Occupant::Flame(existing_id) = occupant else {
                continue;
            };
            let Some(existing) = self.flames.get(existing_id) else {
                continue;
            };
            let crossing = match (existing.shape.axis(), shape.axis()) {
                (Some(a), Some(b)) => a != b,
                _ => false,
            };
            if crossing {
                self.arena
                    .remove(coords, *occupant)
                    .expect("merged flame has an occupant at its coords");
                self.flames.remove(existing_id);
                shape = FlameShape::Cross;
            }
        }

        let flame_id = FlameId(self.next_flame_id);
        self.next_flame_id += 1;
        self.flames.insert(
            flame_id,
            FlameInternal {
                coords,
                shape,
                owner,
                original_owner,
            },
        );
        self.arena
            .add(coords, Occupant::Flame(flame_id))
            .expect("flame coords were readable above");

        for occupant in before {
            self.flamed(occupant, coords, owner, original_owner);
        }
    }

    fn flamed(
        &mut self,
        occupant: Occupant,
        coords: Coords,
        owner: PlayerId,
        original_owner: PlayerId,
    ) {
        match occupant {
            Occupant::DestructibleBlock => {
                // a crossing arm this tick may have destroyed it already
                if self.arena.remove(coords, occupant).is_ok() {
                    let roll = self.rng.next_f32();
                    let spawned = if roll < POWERUP_FLAME_CHANCE {
                        Some(Occupant::PowerupFlame)
                    } else if roll < POWERUP_FLAME_CHANCE + POWERUP_BOMB_CHANCE {
                        Some(Occupant::PowerupBomb)
                    } else {
                        None
                    };
                    if let Some(powerup) = spawned {
                        self.arena
                            .add(coords, powerup)
                            .expect("powerup spawns where its block stood");
                    }
                }
            }
            Occupant::PowerupFlame | Occupant::PowerupBomb => {
                // burned away, nothing granted
                let _ = self.arena.remove(coords, occupant);
            }
            Occupant::Player(player_id) => {
                self.kill_player(player_id, owner, original_owner);
            }
            Occupant::Bomb(other_bomb) => {
                self.ignite(other_bomb, owner);
            }
            // blocks never receive flame; spawn points ignore it; flames
            // were handled by the merge pass
            _ => {}
        }
    }

    /// Flame touched another bomb: it explodes at once. Someone else's fire
    /// re-parents the bomb first, moving its live-bomb budget to the new
    /// owner; attribution follows the updated owner.
    fn ignite(&mut self, bomb_id: BombId, by: PlayerId) {
        let Some(bomb) = self.bombs.get_mut(&bomb_id) else {
            return;
        };
        if bomb.owner != by {
            let previous = bomb.owner;
            bomb.owner = by;
            if let Some(player) = self.players.get_mut(&previous) {
                player.live_bombs = player.live_bombs.saturating_sub(1);
            }
            if let Some(player) = self.players.get_mut(&by) {
                player.live_bombs += 1;
            }
        }
        self.explode(bomb_id);
    }

    /// Death bookkeeping. Fire tracing back to the victim's own bomb with no
    /// intervening re-ignition is a suicide; otherwise the current owner is
    /// credited.
    pub(super) fn kill_player(
        &mut self,
        victim: PlayerId,
        owner: PlayerId,
        original_owner: PlayerId,
    ) {
        let Some(player) = self.players.get_mut(&victim) else {
            return;
        };
        let Some(coords) = player.coords.take() else {
            return;
        };
        player.deaths += 1;
        let suicide = owner == victim && original_owner == victim;
        if suicide {
            player.suicides += 1;
        }
        self.arena
            .remove(coords, Occupant::Player(victim))
            .expect("living player has an occupant at its coords");
        if !suicide {
            if let Some(killer) = self.players.get_mut(&owner) {
                killer.kills += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 9x9 open room for range tests.
    const ROOM: &str = "\
BBBBBBBBB
B       B
B       B
B       B
B       B
B       B
B       B
B       B
BBBBBBBBB";

    fn at(x: i32, y: i32) -> Coords {
        Coords { x, y }
    }

    fn place_player(state: &mut GameState, coords: Coords) -> PlayerId {
        let id = state.add_player("tester");
        state.join_queue.retain(|queued| *queued != id);
        let number = state.next_ordinal;
        state.next_ordinal += 1;
        let player = state.players.get_mut(&id).unwrap();
        player.number = Some(number);
        player.coords = Some(coords);
        state.arena.add(coords, Occupant::Player(id)).unwrap();
        id
    }

    fn drop_and_detonate(state: &mut GameState, id: PlayerId) {
        state.enqueue_action(id, Action::DropBomb);
        state.resolve_actions();
        for _ in 0..BOMB_FUSE_TICKS {
            state.age_bombs();
        }
    }

    fn flame_cells(state: &GameState) -> Vec<Coords> {
        let mut cells: Vec<Coords> = state.flames.values().map(|f| f.coords).collect();
        cells.sort_by_key(|c| (c.y, c.x));
        cells.dedup();
        cells
    }

    #[test]
    fn range_one_explosion_is_a_tight_cross() {
        let mut state = GameState::from_text(ROOM, 1);
        let id = place_player(&mut state, at(4, 4));
        drop_and_detonate(&mut state, id);

        assert_eq!(
            flame_cells(&state),
            vec![at(4, 3), at(3, 4), at(4, 4), at(5, 4), at(4, 5)]
        );
    }

    #[test]
    fn flame_range_extends_the_arms() {
        let mut state = GameState::from_text(ROOM, 1);
        let id = place_player(&mut state, at(4, 4));
        state.players.get_mut(&id).unwrap().flame = 3;
        drop_and_detonate(&mut state, id);

        let cells = flame_cells(&state);
        assert_eq!(cells.len(), 13);
        assert!(cells.contains(&at(1, 4)));
        assert!(cells.contains(&at(7, 4)));
        assert!(cells.contains(&at(4, 1)));
        assert!(cells.contains(&at(4, 7)));
    }

    #[test]
    fn blocks_stop_flame_before_their_own_cell() {
        let mut state = GameState::from_text(ROOM, 1);
        let id = place_player(&mut state, at(4, 4));
        state.players.get_mut(&id).unwrap().flame = 3;
        state.arena.add(at(5, 4), Occupant::Block).unwrap();
        drop_and_detonate(&mut state, id);

        let cells = flame_cells(&state);
        assert!(!cells.contains(&at(5, 4)));
        assert!(!cells.contains(&at(6, 4)));
        assert!(cells.contains(&at(3, 4)));
    }

    #[test]
    fn destructibles_take_flame_but_stop_it_beyond() {
        let mut state = GameState::from_text(ROOM, 42);
        let id = place_player(&mut state, at(4, 4));
        state.players.get_mut(&id).unwrap().flame = 3;
        state
            .arena
            .add(at(5, 4), Occupant::DestructibleBlock)
            .unwrap();
        drop_and_detonate(&mut state, id);

        let cells = flame_cells(&state);
        assert!(cells.contains(&at(5, 4)));
        assert!(!cells.contains(&at(6, 4)));
        assert!(!state
            .arena
            .has_kind(at(5, 4), OccupantKind::DestructibleBlock)
            .unwrap());
    }

    #[test]
    fn end_caps_and_segments_classify_by_position() {
        let mut state = GameState::from_text(ROOM, 1);
        let id = place_player(&mut state, at(4, 4));
        state.players.get_mut(&id).unwrap().flame = 2;
        drop_and_detonate(&mut state, id);

        let shape_at = |coords: Coords| {
            state
                .flames
                .values()
                .find(|f| f.coords == coords)
                .map(|f| f.shape)
        };
        assert_eq!(shape_at(at(4, 4)), Some(FlameShape::Cross));
        assert_eq!(shape_at(at(5, 4)), Some(FlameShape::Horizontal));
        assert_eq!(shape_at(at(6, 4)), Some(FlameShape::EndRight));
        assert_eq!(shape_at(at(4, 3)), Some(FlameShape::Vertical));
        assert_eq!(shape_at(at(4, 2)), Some(FlameShape::EndUp));
    }

    #[test]
    fn perpendicular_overlap_merges_into_a_cross() {
        let mut state = GameState::from_text(ROOM, 1);
        let a = place_player(&mut state, at(2, 4));
        let b = place_player(&mut state, at(4, 2));
        state.players.get_mut(&a).unwrap().flame = 2;
        state.players.get_mut(&b).unwrap().flame = 2;

        state.enqueue_action(a, Action::DropBomb);
        state.enqueue_action(b, Action::DropBomb);
        state.resolve_actions();
        for _ in 0..BOMB_FUSE_TICKS {
            state.age_bombs();
        }

        // a's east arm and b's south arm both reach (4, 4)
        let merged: Vec<&FlameInternal> = state
            .flames
            .values()
            .filter(|f| f.coords == at(4, 4))
            .collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].shape, FlameShape::Cross);
    }

    #[test]
    fn unassisted_self_destruction_is_a_suicide() {
        let mut state = GameState::from_text(ROOM, 1);
        let id = place_player(&mut state, at(4, 4));
        drop_and_detonate(&mut state, id);

        let stats = state.player_stats(id).unwrap();
        assert_eq!(stats.coords, None);
        assert_eq!(stats.deaths, 1);
        assert_eq!(stats.suicides, 1);
        assert_eq!(stats.kills, 0);
    }

    #[test]
    fn chain_ignition_transfers_the_kill() {
        let mut state = GameState::from_text(ROOM, 1);
        let hunter = place_player(&mut state, at(2, 4));
        let victim = place_player(&mut state, at(4, 4));
        state.players.get_mut(&hunter).unwrap().flame = 2;

        // the victim drops a bomb, steps off it, and waits beside it
        state.enqueue_action(victim, Action::DropBomb);
        state.resolve_actions();
        state.enqueue_action(victim, Action::MoveRight);
        state.resolve_actions();
        state.players.get_mut(&victim).unwrap().sticky = None;
        state.enqueue_action(hunter, Action::DropBomb);
        state.resolve_actions();
        state.enqueue_action(hunter, Action::MoveLeft);
        state.resolve_actions();
        state.enqueue_action(hunter, Action::MoveUp);
        state.resolve_actions();

        // the victim's bomb would expire first on its own; prime the fuses
        // so the hunter's fire reaches it while it is still live
        let ids: Vec<BombId> = state.bombs.keys().copied().collect();
        assert_eq!(ids.len(), 2);
        state.bombs.get_mut(&ids[0]).unwrap().ticks_left = 2;
        state.bombs.get_mut(&ids[1]).unwrap().ticks_left = 1;
        state.age_bombs();

        assert!(state.bombs.is_empty());
        let victim_stats = state.player_stats(victim).unwrap();
        assert_eq!(victim_stats.deaths, 1);
        assert_eq!(victim_stats.suicides, 0);
        assert_eq!(state.player_stats(hunter).unwrap().kills, 1);
    }

    #[test]
    fn eight_player_chain_reaction_scores_like_the_classic_scenario() {
        // 8 players total: the dropper in the middle, seven neighbors on the
        // arms of a range-2 cross. Every neighbor has a primed bomb on their
        // own cell; the dropper's bomb chain-ignites them all.
        let mut state = GameState::from_text(ROOM, 7);
        let center = at(4, 4);
        let dropper = place_player(&mut state, center);
        state.players.get_mut(&dropper).unwrap().flame = 2;

        let neighbor_cells = [
            at(4, 3),
            at(4, 2),
            at(4, 5),
            at(4, 6),
            at(3, 4),
            at(2, 4),
            at(5, 4),
        ];
        let neighbors: Vec<PlayerId> = neighbor_cells
            .iter()
            .map(|cell| place_player(&mut state, *cell))
            .collect();

        state.enqueue_action(dropper, Action::DropBomb);
        for id in &neighbors {
            state.enqueue_action(*id, Action::DropBomb);
        }
        state.resolve_actions();
        assert_eq!(state.bombs.len(), 8);

        for _ in 0..BOMB_FUSE_TICKS {
            state.age_bombs();
        }
        assert!(state.bombs.is_empty());

        let dropper_stats = state.player_stats(dropper).unwrap();
        assert_eq!(dropper_stats.kills, 7);
        assert_eq!(dropper_stats.deaths, 1);
        assert_eq!(dropper_stats.suicides, 1);
        for id in &neighbors {
            let stats = state.player_stats(*id).unwrap();
            assert_eq!(stats.kills, 0);
            assert_eq!(stats.deaths, 1);
            assert_eq!(stats.suicides, 0);
        }
    }

    #[test]
    fn live_bomb_budget_follows_the_transferred_owner() {
        let mut state = GameState::from_text(ROOM, 1);
        let igniter = place_player(&mut state, at(2, 4));
        let owner = place_player(&mut state, at(3, 4));

        state.enqueue_action(owner, Action::DropBomb);
        state.resolve_actions();
        state.enqueue_action(owner, Action::MoveDown);
        state.resolve_actions();
        state.enqueue_action(igniter, Action::DropBomb);
        state.resolve_actions();
        state.enqueue_action(igniter, Action::MoveUp);
        state.resolve_actions();

        let ids: Vec<BombId> = state.bombs.keys().copied().collect();
        for id in &ids {
            state.bombs.get_mut(id).unwrap().ticks_left = 1;
        }
        state.age_bombs();

        // both bombs are gone and nobody's budget is left dangling
        assert!(state.bombs.is_empty());
        assert_eq!(state.players.get(&igniter).unwrap().live_bombs, 0);
        assert_eq!(state.players.get(&owner).unwrap().live_bombs, 0);
    }

    #[test]
    fn powerup_rolls_stay_within_tolerance_and_never_double_spawn() {
        let mut flame_spawns = 0u32;
        let mut bomb_spawns = 0u32;
        let trials = 2_000;

        for seed in 0..trials {
            let mut state = GameState::from_text(ROOM, seed);
            let id = place_player(&mut state, at(4, 4));
            state
                .arena
                .add(at(5, 4), Occupant::DestructibleBlock)
                .unwrap();
            drop_and_detonate(&mut state, id);

            let cell = state.arena.get(at(5, 4)).unwrap();
            let has_flame = cell.contains(&Occupant::PowerupFlame);
            let has_bomb = cell.contains(&Occupant::PowerupBomb);
            assert!(!(has_flame && has_bomb), "seed {seed} spawned both");
            if has_flame {
                flame_spawns += 1;
            }
            if has_bomb {
                bomb_spawns += 1;
            }
        }

        // expected 15% each; allow generous slack for the small sample
        let lo = (trials as f32 * 0.10) as u32;
        let hi = (trials as f32 * 0.20) as u32;
        assert!((lo..=hi).contains(&flame_spawns), "flame: {flame_spawns}");
        assert!((lo..=hi).contains(&bomb_spawns), "bomb: {bomb_spawns}");
    }
}
