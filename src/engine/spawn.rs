use super::*;

impl GameState {
    /// Walks the arena in row-major order, seating queued players on spawn
    /// points. Each spawn point is consumed by the player it seats; ordinals
    /// are handed out sequentially from 1. Players left over stay queued for
    /// a later spawn call.
    pub fn spawn_all(&mut self) {
        let spawn_cells: Vec<Coords> = self
            .arena
            .iter()
            .filter(|(_, _, occupants)| {
                occupants.iter().any(|o| *o == Occupant::SpawnPoint)
            })
            .map(|(x, y, _)| Coords { x, y })
            .collect();

        for coords in spawn_cells {
            let Some(id) = self.next_queued_player() else {
                break;
            };
            let number = self.next_ordinal;
            self.next_ordinal += 1;
            if let Some(player) = self.players.get_mut(&id) {
                player.number = Some(number);
                player.coords = Some(coords);
            }
            self.arena
                .remove(coords, Occupant::SpawnPoint)
                .expect("spawn point was observed in the walk above");
            self.arena
                .add(coords, Occupant::Player(id))
                .expect("spawn coords are inside the arena");
        }
    }

    /// Skips players that were removed while still queued.
    fn next_queued_player(&mut self) -> Option<PlayerId> {
        while let Some(id) = self.join_queue.pop_front() {
            if self.players.contains_key(&id) {
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SPAWNS: &str = "\
BBBBB
BS SB
B   B
BBBBB";

    fn at(x: i32, y: i32) -> Coords {
        Coords { x, y }
    }

    #[test]
    fn players_spawn_in_row_major_order_with_sequential_ordinals() {
        let mut state = GameState::from_text(TWO_SPAWNS, 1);
        let first = state.add_player("first");
        let second = state.add_player("second");
        state.spawn_all();

        let first_stats = state.player_stats(first).unwrap();
        let second_stats = state.player_stats(second).unwrap();
        assert_eq!(first_stats.number, Some(1));
        assert_eq!(first_stats.coords, Some(at(1, 1)));
        assert_eq!(second_stats.number, Some(2));
        assert_eq!(second_stats.coords, Some(at(3, 1)));
    }

    #[test]
    fn spawn_points_are_consumed() {
        let mut state = GameState::from_text(TWO_SPAWNS, 1);
        state.add_player("only");
        state.spawn_all();

        assert!(!state
            .arena
            .has_kind(at(1, 1), OccupantKind::SpawnPoint)
            .unwrap());
        // the unused point survives for late joiners
        assert!(state
            .arena
            .has_kind(at(3, 1), OccupantKind::SpawnPoint)
            .unwrap());

        let late = state.add_player("late");
        state.spawn_all();
        assert_eq!(state.player_stats(late).unwrap().number, Some(2));
        assert_eq!(state.player_stats(late).unwrap().coords, Some(at(3, 1)));
    }

    #[test]
    fn overflow_players_stay_out_of_the_arena() {
        let mut state = GameState::from_text(TWO_SPAWNS, 1);
        let ids: Vec<PlayerId> = (0..3).map(|i| state.add_player(&format!("p{i}"))).collect();
        state.spawn_all();

        let benched = state.player_stats(ids[2]).unwrap();
        assert_eq!(benched.number, None);
        assert_eq!(benched.coords, None);

        // actions from an unspawned player are absorbed
        state.enqueue_action(ids[2], Action::MoveDown);
        state.advance_tick();
        assert_eq!(state.player_stats(ids[2]).unwrap().coords, None);
    }

    #[test]
    fn spawned_players_render_as_their_ordinal() {
        let mut state = GameState::from_text(TWO_SPAWNS, 1);
        state.add_player("first");
        state.add_player("second");
        state.spawn_all();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.lines().nth(1), Some("B1 2B"));
    }

    #[test]
    fn players_removed_while_queued_are_skipped() {
        let mut state = GameState::from_text(TWO_SPAWNS, 1);
        let quitter = state.add_player("quitter");
        let stayer = state.add_player("stayer");
        state.remove_player(quitter);
        state.spawn_all();

        let stats = state.player_stats(stayer).unwrap();
        assert_eq!(stats.number, Some(1));
        assert_eq!(stats.coords, Some(at(1, 1)));
    }
}
