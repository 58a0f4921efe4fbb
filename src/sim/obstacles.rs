//! Arena obstacles
//!
//! Open arenas carry optional soft pillars that nudge actors aside. Maze
//! arenas are a lattice of solid boxes: the player and most enemies are
//! pushed out along the shallowest axis, climbers scale the walls, and
//! bullets stop dead inside them.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::enemy::{ClimbState, Enemy};
use super::spatial::CellKey;
use crate::persistence::CellCoord;
use crate::safe_normalize;
use crate::tuning::ObstacleTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaLayout {
    Open,
    Maze,
}

#[derive(Debug, Clone)]
pub struct ObstacleField {
    pub layout: ArenaLayout,
    cell_size: f32,
    cells: HashMap<CellKey, Vec<Aabb>>,
    pub pillars: Vec<Vec2>,
}

impl ObstacleField {
    /// Empty open arena
    pub fn open() -> Self {
        Self {
            layout: ArenaLayout::Open,
            cell_size: 1.0,
            cells: HashMap::new(),
            pillars: Vec::new(),
        }
    }

    /// Open arena with soft pillars
    pub fn with_pillars(pillars: Vec<Vec2>) -> Self {
        Self {
            pillars,
            ..Self::open()
        }
    }

    /// Random maze: fill the lattice, carve corridors with walkers, clear the start
    pub fn maze<R: Rng + ?Sized>(rng: &mut R, tuning: &ObstacleTuning) -> Self {
        let step = tuning.maze_step.max(1);
        let extent = tuning.maze_extent;
        let mut lattice = Vec::new();
        let mut z = -extent;
        while z <= extent {
            let mut x = -extent;
            while x <= extent {
                lattice.push(CellCoord { x, z });
                x += step;
            }
            z += step;
        }
        let mut field = Self::from_cells(&lattice, tuning);

        for (start, len) in [((0, 0), 120), ((-12, -6), 90), ((12, 6), 90)] {
            let (mut x, mut z) = start;
            for _ in 0..len {
                let key = field.key_for(Vec2::new(x as f32, z as f32));
                field.cells.remove(&key);
                match rng.random_range(0..4) {
                    0 => x += step * 2,
                    1 => x -= step * 2,
                    2 => z += step * 2,
                    _ => z -= step * 2,
                }
                x = x.clamp(-extent, extent);
                z = z.clamp(-extent, extent);
            }
        }

        let clear = tuning.maze_start_clear;
        let mut z = -clear;
        while z <= clear {
            let mut x = -clear;
            while x <= clear {
                let key = field.key_for(Vec2::new(x as f32, z as f32));
                field.cells.remove(&key);
                x += step;
            }
            z += step;
        }
        log::debug!("maze carved: {} walls", field.box_count());
        field
    }

    /// Maze built from a saved preset (box centers)
    pub fn from_cells(coords: &[CellCoord], tuning: &ObstacleTuning) -> Self {
        let mut field = Self {
            layout: ArenaLayout::Maze,
            cell_size: tuning.maze_cell.max(0.01),
            cells: HashMap::new(),
            pillars: Vec::new(),
        };
        let half = Vec2::splat(tuning.maze_box / 2.0);
        for c in coords {
            let center = Vec2::new(c.x as f32, c.z as f32);
            let key = field.key_for(center);
            field.cells.entry(key).or_default().push(Aabb { center, half });
        }
        field
    }

    fn key_for(&self, pos: Vec2) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Boxes in the 3x3 block of cells around `pos`
    fn nearby(&self, pos: Vec2) -> impl Iterator<Item = &Aabb> {
        let (cx, cz) = self.key_for(pos);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dz| (cx + dx, cz + dz)))
            .filter_map(|key| self.cells.get(&key))
            .flatten()
    }

    pub fn box_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Box centers, for presentation and preset export
    pub fn box_centers(&self) -> Vec<Vec2> {
        let mut out: Vec<Vec2> = self.cells.values().flatten().map(|b| b.center).collect();
        out.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        out
    }

    /// Whether a point is inside a solid box
    pub fn blocks_point(&self, pos: Vec2) -> bool {
        self.layout == ArenaLayout::Maze && self.nearby(pos).any(|b| b.contains(pos))
    }

    /// Push a circle out of every box it overlaps, then apply soft pillars
    pub fn resolve_circle(&self, pos: Vec2, radius: f32, tuning: &ObstacleTuning) -> Vec2 {
        let mut p = pos;
        if self.layout == ArenaLayout::Maze {
            let pushes: Vec<Vec2> = self.nearby(p).filter_map(|b| b.push_out(p, radius)).collect();
            for push in pushes {
                p += push;
            }
        }
        self.soft_push(p, tuning)
    }

    fn soft_push(&self, pos: Vec2, tuning: &ObstacleTuning) -> Vec2 {
        let mut p = pos;
        for pillar in &self.pillars {
            if p.distance_squared(*pillar) < tuning.soft_radius * tuning.soft_radius {
                p += safe_normalize(p - *pillar, Vec2::X) * tuning.soft_push;
            }
        }
        p
    }

    /// Obstacle response for one enemy: climbers climb, everyone else is pushed out
    pub fn resolve_enemy(&self, enemy: &mut Enemy, now: f32, dt: f32, tuning: &ObstacleTuning) {
        if self.layout == ArenaLayout::Open {
            enemy.pos = self.soft_push(enemy.pos, tuning);
            return;
        }
        let pad = tuning.enemy_pad;
        let overlapping: Vec<Vec2> = self
            .nearby(enemy.pos)
            .filter_map(|b| b.push_out(enemy.pos, pad))
            .collect();

        match enemy.climb.as_mut() {
            Some(state) => {
                if !overlapping.is_empty() && *state == ClimbState::Ground {
                    *state = ClimbState::Ascending;
                }
                step_climb(&mut enemy.height, state, now, dt, tuning);
            }
            None => {
                for push in overlapping {
                    enemy.pos += push;
                }
            }
        }
    }
}

fn step_climb(height: &mut f32, state: &mut ClimbState, now: f32, dt: f32, t: &ObstacleTuning) {
    match *state {
        ClimbState::Ascending => {
            *height = (*height + t.climb_speed * dt).min(t.climb_height);
            if *height >= t.climb_height - 1e-3 {
                *state = ClimbState::OnTop {
                    until: now + t.climb_hold,
                };
            }
        }
        ClimbState::OnTop { until } => {
            if until <= now {
                *state = ClimbState::Descending;
            }
        }
        ClimbState::Descending => {
            *height = (*height - t.climb_speed * dt).max(0.0);
            if *height <= 1e-3 {
                *height = 0.0;
                *state = ClimbState::Ground;
            }
        }
        ClimbState::Ground => {
            if *height > 0.0 {
                *height = (*height - t.climb_speed * dt).max(0.0);
            }
        }
    }
}
