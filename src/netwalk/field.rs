use std::fmt;

use super::{io, rotations, Dir, Error, Kind, Piece};
use crate::{FiniteSearchQueue, Grid, P};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    kind: Kind,
    cands: [Piece; 4],
    n_cands: usize,
    stakes: [u8; 4],
}

impl Cell {
    pub fn new(kind: Kind) -> Cell {
        let orbit = rotations(kind);
        let mut cands = [Piece::NONE; 4];
        cands[..orbit.len()].copy_from_slice(&orbit);
        let mut cell = Cell {
            kind,
            cands,
            n_cands: orbit.len(),
            stakes: [0; 4],
        };
        cell.refresh_stakes();
        cell
    }
    pub fn kind(&self) -> Kind {
        self.kind
    }
    pub fn candidates(&self) -> &[Piece] {
        &self.cands[..self.n_cands]
    }
    pub fn stake(&self, dir: Dir) -> u8 {
        self.stakes[dir.index()]
    }
    pub fn is_solved(&self) -> bool {
        self.n_cands == 1
    }
    pub fn is_closed(&self, dir: Dir) -> bool {
        self.stake(dir) == 0
    }
    pub fn is_open(&self, dir: Dir) -> bool {
        self.stake(dir) as usize == self.n_cands
    }
    pub fn is_undetermined(&self, dir: Dir) -> bool {
        !self.is_closed(dir) && !self.is_open(dir)
    }

    pub fn refresh_stakes(&mut self) {
        self.stakes = [0; 4];
        for i in 0..self.n_cands {
            for &dir in &Dir::ALL {
                if self.cands[i].has(dir) {
                    self.stakes[dir.index()] += 1;
                }
            }
        }
    }

    // Retains the candidates whose stub on `dir` matches `require_open`;
    // returns the number removed.
    pub fn restrict(&mut self, dir: Dir, require_open: bool) -> usize {
        let mut kept = 0;
        for i in 0..self.n_cands {
            if self.cands[i].has(dir) == require_open {
                self.cands[kept] = self.cands[i];
                kept += 1;
            }
        }
        let removed = self.n_cands - kept;
        self.n_cands = kept;
        self.refresh_stakes();
        removed
    }
}

#[derive(Debug, Clone)]
pub enum SolveResult {
    Solved(Field),
    Exhausted,
}

enum Attempt {
    Progress,
    Inconclusive,
    Solved(Field),
}

// A probe on N or E is the same constraint as the S or W probe of the
// neighbor across that edge, which the scan also visits.
const PROBES: [(Dir, bool); 4] = [
    (Dir::W, false),
    (Dir::W, true),
    (Dir::S, false),
    (Dir::S, true),
];

#[derive(Debug, Clone)]
pub struct Field {
    height: i32,
    width: i32,
    cell: Grid<Cell>,
    non_empty: Vec<P>,
    unsolved: Grid<bool>,
    n_unsolved: i32,
    queue: FiniteSearchQueue,
}

impl Field {
    pub fn new(width: i32, height: i32, raw: &str) -> Result<Field, Error> {
        let kinds = io::decode(width, height, raw)?;
        let n_cells = width as usize * height as usize;

        let mut cell = Grid::new(height, width, Cell::new(Kind::Empty));
        let mut non_empty = Vec::new();
        let mut unsolved = Grid::new(height, width, false);
        let mut n_unsolved = 0;
        for y in 0..height {
            for x in 0..width {
                let pos = P(y, x);
                cell[pos] = Cell::new(kinds[pos]);
                if kinds[pos] != Kind::Empty {
                    non_empty.push(pos);
                    unsolved[pos] = true;
                    n_unsolved += 1;
                }
            }
        }

        let mut field = Field {
            height,
            width,
            cell,
            non_empty,
            unsolved,
            n_unsolved,
            queue: FiniteSearchQueue::new(n_cells),
        };
        for idx in 0..n_cells {
            field.queue.push(idx);
        }
        field.propagate()?;
        field.check_reachability()?;
        Ok(field)
    }

    pub fn height(&self) -> i32 {
        self.height
    }
    pub fn width(&self) -> i32 {
        self.width
    }
    pub fn cell(&self, pos: P) -> &Cell {
        &self.cell[pos]
    }
    pub fn fully_solved(&self) -> bool {
        self.n_unsolved == 0
    }

    fn wrap(&self, pos: P) -> P {
        P(pos.0.rem_euclid(self.height), pos.1.rem_euclid(self.width))
    }

    // Forces the edge of the cell at `pos` toward `dir` open or closed.
    // Reports whether the cell was tightened; an already-determined edge in
    // the opposite state is a contradiction.
    pub fn force_edge(&mut self, pos: P, dir: Dir, open: bool) -> Result<bool, Error> {
        let pos = self.wrap(pos);
        let idx = self.cell.index(pos);
        let cell = &mut self.cell[pos];
        if cell.is_closed(dir) {
            return if open { Err(Error::Unsolvable) } else { Ok(false) };
        }
        if cell.is_open(dir) {
            return if open { Ok(false) } else { Err(Error::Unsolvable) };
        }
        let removed = cell.restrict(dir, open);
        debug_assert!(removed > 0);
        if cell.is_solved() && self.unsolved[pos] {
            self.unsolved[pos] = false;
            self.n_unsolved -= 1;
        }
        self.queue.push(idx);
        Ok(true)
    }

    // An edge certainly closed on one side closes the neighbor's opposite
    // edge; an edge certainly open opens it.
    fn enforce_stakes(&mut self, pos: P) -> Result<(), Error> {
        for &dir in &Dir::ALL {
            // re-read: on wrapped boards the cell can be its own neighbor
            let cell = self.cell[pos];
            let target = pos + dir.displacement();
            if cell.is_closed(dir) {
                self.force_edge(target, dir.opposite(), false)?;
            } else if cell.is_open(dir) {
                self.force_edge(target, dir.opposite(), true)?;
            }
        }
        Ok(())
    }

    // Drains the queue of tightened cells to a fixed point. Every pass that
    // re-enqueues a cell shrank some candidate set first, so this ends.
    fn propagate(&mut self) -> Result<(), Error> {
        while !self.queue.is_empty() {
            let idx = self.queue.pop();
            let pos = self.cell.p(idx);
            self.enforce_stakes(pos)?;
        }
        Ok(())
    }

    // Traverses the non-empty cells over edges that are still possible
    // (stake > 0), not over certain ones: mid-propagation a valid puzzle
    // may not have committed its connectivity yet.
    fn check_reachability(&self) -> Result<(), Error> {
        if self.non_empty.is_empty() {
            return Ok(());
        }
        let mut visited = Grid::new(self.height, self.width, false);
        let mut stack = vec![self.non_empty[0]];
        visited[self.non_empty[0]] = true;
        let mut reached = 1;
        while let Some(pos) = stack.pop() {
            for &dir in &Dir::ALL {
                if self.cell[pos].stake(dir) == 0 {
                    continue;
                }
                let next = self.wrap(pos + dir.displacement());
                if visited[next] || self.cell[next].kind() == Kind::Empty {
                    continue;
                }
                visited[next] = true;
                reached += 1;
                stack.push(next);
            }
        }
        if reached == self.non_empty.len() {
            Ok(())
        } else {
            Err(Error::Unsolvable)
        }
    }

    // Iterative-deepening speculative search. Scans unsolved cells in
    // row-major order probing W and S edges; any progress restarts the scan
    // at depth 1. A trial that solves its clone completely short-circuits
    // upward carrying the solved board.
    pub fn solve(&mut self, max_depth: i32) -> Result<SolveResult, Error> {
        'restart: loop {
            for depth in 1..=max_depth {
                let mut nothing_to_do = true;
                for y in 0..self.height {
                    for x in 0..self.width {
                        let pos = P(y, x);
                        if !self.unsolved[pos] {
                            continue;
                        }
                        nothing_to_do = false;
                        for &(dir, open) in &PROBES {
                            match self.attempt(depth, pos, dir, open)? {
                                Attempt::Solved(solved) => {
                                    return Ok(SolveResult::Solved(solved))
                                }
                                Attempt::Progress => continue 'restart,
                                Attempt::Inconclusive => (),
                            }
                        }
                    }
                }
                if nothing_to_do {
                    return Ok(SolveResult::Solved(self.clone()));
                }
            }
            return Ok(SolveResult::Exhausted);
        }
    }

    // Hypothesizes one edge state on a clone. A contradiction there proves
    // the opposite state on the real board; anything short of that proves
    // nothing.
    fn attempt(&mut self, depth: i32, pos: P, dir: Dir, open: bool) -> Result<Attempt, Error> {
        if !self.cell[pos].is_undetermined(dir) {
            return Ok(Attempt::Inconclusive);
        }
        let mut trial = self.clone();
        match trial.speculate(pos, dir, open, depth - 1) {
            Ok(SolveResult::Solved(solved)) => Ok(Attempt::Solved(solved)),
            Ok(SolveResult::Exhausted) => Ok(Attempt::Inconclusive),
            Err(Error::Unsolvable) => {
                let changed = self.force_edge(pos, dir, !open)?;
                self.propagate()?;
                if changed {
                    self.check_reachability()?;
                }
                Ok(Attempt::Progress)
            }
            Err(other) => Err(other),
        }
    }

    fn speculate(&mut self, pos: P, dir: Dir, open: bool, depth: i32) -> Result<SolveResult, Error> {
        if self.force_edge(pos, dir, open)? {
            self.propagate()?;
            self.check_reachability()?;
        }
        self.solve(depth)
    }

    fn edge_char(&self, pos: P, dir: Dir) -> char {
        let cell = &self.cell[pos];
        if cell.is_closed(dir) {
            ' '
        } else if !cell.is_open(dir) {
            '?'
        } else if dir.is_vertical() {
            '|'
        } else {
            '-'
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, " {} ", self.edge_char(P(y, x), Dir::N))?;
            }
            writeln!(f)?;
            for x in 0..self.width {
                let pos = P(y, x);
                write!(
                    f,
                    "{}+{}",
                    self.edge_char(pos, Dir::W),
                    self.edge_char(pos, Dir::E)
                )?;
            }
            writeln!(f)?;
            for x in 0..self.width {
                write!(f, " {} ", self.edge_char(P(y, x), Dir::S))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
