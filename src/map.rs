use crate::arena::Arena;
use crate::types::{Coords, Occupant};

/// Builds an arena from the text format: `'B'` block, `'.'` destructible,
/// `'S'` spawn point, `' '` empty. Short rows are padded to the longest row;
/// unrecognized characters load as empty cells.
pub fn parse_arena(text: &str) -> Arena {
    let lines: Vec<&str> = text.lines().collect();
    let rows = lines.len() as i32;
    let cols = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as i32;
    let mut arena = Arena::new(cols, rows);

    for (y, line) in lines.iter().enumerate() {
        for (x, tile) in line.chars().enumerate() {
            let occupant = match tile {
                'B' => Occupant::Block,
                '.' => Occupant::DestructibleBlock,
                'S' => Occupant::SpawnPoint,
                _ => continue,
            };
            let coords = Coords {
                x: x as i32,
                y: y as i32,
            };
            arena
                .add(coords, occupant)
                .expect("parsed coords fit the computed arena dimensions");
        }
    }

    arena
}
