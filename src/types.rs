use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BombId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlameId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    DropBomb,
}

impl Action {
    /// Wire names as sent by clients. The bare forms are what the original
    /// protocol used; the prefixed forms are accepted as aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UP" | "MOVE_UP" => Some(Self::MoveUp),
            "DOWN" | "MOVE_DOWN" => Some(Self::MoveDown),
            "LEFT" | "MOVE_LEFT" => Some(Self::MoveLeft),
            "RIGHT" | "MOVE_RIGHT" => Some(Self::MoveRight),
            "BOMB" | "DROP_BOMB" => Some(Self::DropBomb),
            _ => None,
        }
    }

    /// Cell delta for movement actions, `None` for `DropBomb`.
    pub fn move_offset(self) -> Option<(i32, i32)> {
        match self {
            Self::MoveUp => Some((0, -1)),
            Self::MoveDown => Some((0, 1)),
            Self::MoveLeft => Some((-1, 0)),
            Self::MoveRight => Some((1, 0)),
            Self::DropBomb => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlameShape {
    Cross,
    Horizontal,
    Vertical,
    EndUp,
    EndDown,
    EndLeft,
    EndRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlameAxis {
    Horizontal,
    Vertical,
}

impl FlameShape {
    pub fn glyph(self) -> char {
        match self {
            Self::Cross => '+',
            Self::Horizontal => '-',
            Self::Vertical => '|',
            Self::EndUp => '^',
            Self::EndDown => 'v',
            Self::EndLeft => '<',
            Self::EndRight => '>',
        }
    }

    /// The axis a segment or end cap lies on. A cross spans both axes and
    /// never merges further.
    pub fn axis(self) -> Option<FlameAxis> {
        match self {
            Self::Cross => None,
            Self::Horizontal | Self::EndLeft | Self::EndRight => Some(FlameAxis::Horizontal),
            Self::Vertical | Self::EndUp | Self::EndDown => Some(FlameAxis::Vertical),
        }
    }
}

/// Everything that can occupy an arena cell. Players, bombs and flames carry
/// a stable id into the engine's side tables; terrain and powerups are plain
/// values matched by equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupant {
    Block,
    DestructibleBlock,
    SpawnPoint,
    PowerupFlame,
    PowerupBomb,
    Player(PlayerId),
    Bomb(BombId),
    Flame(FlameId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupantKind {
    Block,
    DestructibleBlock,
    SpawnPoint,
    PowerupFlame,
    PowerupBomb,
    Player,
    Bomb,
    Flame,
}

impl Occupant {
    pub fn kind(self) -> OccupantKind {
        match self {
            Self::Block => OccupantKind::Block,
            Self::DestructibleBlock => OccupantKind::DestructibleBlock,
            Self::SpawnPoint => OccupantKind::SpawnPoint,
            Self::PowerupFlame => OccupantKind::PowerupFlame,
            Self::PowerupBomb => OccupantKind::PowerupBomb,
            Self::Player(_) => OccupantKind::Player,
            Self::Bomb(_) => OccupantKind::Bomb,
            Self::Flame(_) => OccupantKind::Flame,
        }
    }

    /// Display priority; the highest-ranked occupant of a cell is rendered.
    pub fn rank(self) -> u8 {
        match self {
            Self::Block => 0,
            Self::DestructibleBlock => 1,
            Self::SpawnPoint => 2,
            Self::PowerupBomb => 3,
            Self::PowerupFlame => 4,
            Self::Bomb(_) => 5,
            Self::Player(_) => 6,
            Self::Flame(_) => 7,
        }
    }

    pub fn blocks_movement(self) -> bool {
        matches!(self, Self::Block | Self::DestructibleBlock | Self::Bomb(_))
    }
}

/// Per-player stat dump handed to the transport layer.
#[derive(Clone, Debug, Serialize)]
pub struct PlayerStatus {
    pub coords: Option<Coords>,
    pub number: Option<u32>,
    pub flame: u32,
    pub bomb: u32,
    pub kills: u32,
    pub deaths: u32,
    pub suicides: u32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_both_action_spellings() {
        assert_eq!(Action::parse("UP"), Some(Action::MoveUp));
        assert_eq!(Action::parse("MOVE_UP"), Some(Action::MoveUp));
        assert_eq!(Action::parse("BOMB"), Some(Action::DropBomb));
        assert_eq!(Action::parse("DROP_BOMB"), Some(Action::DropBomb));
        assert_eq!(Action::parse("up"), None);
        assert_eq!(Action::parse("JUMP"), None);
    }

    #[test]
    fn flame_renders_above_player_above_bomb() {
        let flame = Occupant::Flame(FlameId(1));
        let player = Occupant::Player(PlayerId(1));
        let bomb = Occupant::Bomb(BombId(1));
        assert!(flame.rank() > player.rank());
        assert!(player.rank() > bomb.rank());
        assert!(bomb.rank() > Occupant::Block.rank());
    }

    #[test]
    fn perpendicular_axes_differ_and_cross_has_none() {
        assert_eq!(FlameShape::EndRight.axis(), Some(FlameAxis::Horizontal));
        assert_eq!(FlameShape::EndDown.axis(), Some(FlameAxis::Vertical));
        assert_ne!(FlameShape::Horizontal.axis(), FlameShape::Vertical.axis());
        assert_eq!(FlameShape::Cross.axis(), None);
    }
}
