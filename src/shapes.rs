use crate::grid::Cell;

pub const ROTATIONS: usize = 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    L,
}

type Offsets = [(i8, i8); 4];

// Indexed by [kind][rotation]. Offsets are relative to the anchor with y
// pointing up; every rotation has its lowest cell at y = 0.
const SHAPES: [[Offsets; ROTATIONS]; 6] = [
    // I
    [
        [(0, 0), (1, 0), (2, 0), (3, 0)],
        [(0, 0), (0, 1), (0, 2), (0, 3)],
        [(0, 0), (1, 0), (2, 0), (3, 0)],
        [(0, 0), (0, 1), (0, 2), (0, 3)],
    ],
    // O
    [
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
    ],
    // T
    [
        [(0, 0), (1, 0), (2, 0), (1, 1)],
        [(0, 0), (0, 1), (0, 2), (1, 1)],
        [(1, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (0, 1)],
    ],
    // S
    [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (0, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (0, 1), (0, 2)],
    ],
    // Z
    [
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // L
    [
        [(0, 0), (1, 0), (2, 0), (2, 1)],
        [(0, 0), (1, 0), (0, 1), (0, 2)],
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (0, 2)],
    ],
];

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::I,
        ShapeKind::O,
        ShapeKind::T,
        ShapeKind::S,
        ShapeKind::Z,
        ShapeKind::L,
    ];

    fn index(self) -> usize {
        match self {
            ShapeKind::I => 0,
            ShapeKind::O => 1,
            ShapeKind::T => 2,
            ShapeKind::S => 3,
            ShapeKind::Z => 4,
            ShapeKind::L => 5,
        }
    }

    /// Cell offsets for `rotation`, taken modulo the number of rotations.
    pub fn offsets(self, rotation: usize) -> [Cell; 4] {
        SHAPES[self.index()][rotation % ROTATIONS].map(|(dx, dy)| Cell::new(dx.into(), dy.into()))
    }

    pub fn width(self, rotation: usize) -> i32 {
        self.offsets(rotation).iter().map(|c| c.x).max().unwrap_or(0) + 1
    }

    pub fn height(self, rotation: usize) -> i32 {
        self.offsets(rotation).iter().map(|c| c.y).max().unwrap_or(0) + 1
    }
}
