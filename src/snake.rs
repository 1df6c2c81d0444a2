use Direction::*;

/// A tile position in board units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn translated(self, (dx, dy): (i32, i32)) -> Self {
        Cell { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    /// Displacement of one step, `tile` units along a single axis.
    pub fn delta(self, tile: i32) -> (i32, i32) {
        match self {
            Up => (0, -tile),
            Down => (0, tile),
            Left => (-tile, 0),
            Right => (tile, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Left | Right)
    }
}

/// Body segments, head first.
#[derive(Debug, Clone)]
pub struct Snake {
    body: Vec<Cell>,
    direction: Direction,
}

impl Snake {
    pub fn new(pos: Cell, direction: Direction) -> Self {
        Snake { body: vec![pos], direction }
    }

    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn head(&self) -> Cell {
        // A snake is never built empty and only loses its tail after gaining a head.
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn next_head(&self, tile: i32) -> Cell {
        self.head().translated(self.direction.delta(tile))
    }

    pub fn push_head(&mut self, cell: Cell) {
        self.body.insert(0, cell);
    }

    pub fn drop_tail(&mut self) -> Option<Cell> {
        if self.body.len() > 1 {
            self.body.pop()
        } else {
            None
        }
    }

    /// True when the head sits on any other segment.
    pub fn bites_itself(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|seg| *seg == head)
    }

    /// Turns are only taken across the current axis: while moving
    /// horizontally only Up/Down are accepted and vice versa.
    pub fn set_direction(&mut self, new_direction: Direction) -> bool {
        if new_direction.is_horizontal() == self.direction.is_horizontal() {
            return false;
        }

        self.direction = new_direction;
        true
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }
}
