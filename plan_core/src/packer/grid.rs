//! Band grid, zone search and shelf filling.
//!
//! The envelope is cut into a front band, the corridor and a back band, and
//! each band into three columns. Rooms claim column capacity in priority
//! order (only their minimum width), then every band is filled left to right
//! and the claimed widths are stretched or squeezed, in whole grid steps and
//! within each room's proportion bounds, to close the band.

use serde::{Deserialize, Serialize};

use crate::allocator::ZonedRoom;
use crate::geometry::{Direction, Rect};
use crate::program::RoomKind;
use crate::regulation::Envelope;
use crate::rules::LayoutRules;
use crate::units::{snap, snap_down, snap_up, EPSILON};

use super::StairSlot;

/// Row of the 3x3 grid that holds rooms. The middle row is the corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Road side, local y = 0
    Front,
    Back,
}

impl Band {
    fn index(self) -> usize {
        match self {
            Band::Front => 0,
            Band::Back => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Front => "front",
            Band::Back => "back",
        }
    }
}

/// Grid cell of a plan-frame direction, or `None` for the corridor row.
pub fn cell_of(direction: Direction) -> Option<(Band, usize)> {
    use Direction::*;
    let column = match direction {
        SouthWest | West | NorthWest => 0,
        South | North => 1,
        SouthEast | East | NorthEast => 2,
    };
    match direction {
        SouthWest | South | SouthEast => Some((Band::Front, column)),
        NorthWest | North | NorthEast => Some((Band::Back, column)),
        West | East => None,
    }
}

/// Band and column boundaries for one envelope
#[derive(Debug, Clone, PartialEq)]
pub struct BandGrid {
    pub width: f64,
    pub front_depth: f64,
    pub corridor_width: f64,
    pub back_y: f64,
    pub back_depth: f64,
    /// Column edges: 0, W/3, 2W/3, W (snapped)
    pub columns: [f64; 4],
    pub grid: f64,
}

impl BandGrid {
    pub fn new(envelope: Envelope, layout: &LayoutRules) -> Self {
        let grid = layout.grid_ft;
        let width = envelope.width_ft;
        let front_depth = snap_down((envelope.depth_ft - layout.corridor_width_ft) / 2.0, grid);
        let back_y = front_depth + layout.corridor_width_ft;
        BandGrid {
            width,
            front_depth,
            corridor_width: layout.corridor_width_ft,
            back_y,
            back_depth: envelope.depth_ft - back_y,
            columns: [0.0, snap(width / 3.0, grid), snap(2.0 * width / 3.0, grid), width],
            grid,
        }
    }

    pub fn depth(&self, band: Band) -> f64 {
        match band {
            Band::Front => self.front_depth,
            Band::Back => self.back_depth,
        }
    }

    pub fn y(&self, band: Band) -> f64 {
        match band {
            Band::Front => 0.0,
            Band::Back => self.back_y,
        }
    }

    pub fn column_width(&self, column: usize) -> f64 {
        self.columns[column + 1] - self.columns[column]
    }

    /// Depth of the exterior half of a band; the corridor half gets the rest.
    pub fn half_depth(&self, band: Band) -> f64 {
        let depth = self.depth(band);
        depth - snap_down(depth / 2.0, self.grid)
    }

    pub fn corridor(&self) -> Rect {
        Rect::new(0.0, self.front_depth, self.width, self.corridor_width)
    }
}

// ============================================================================
// Capacity search
// ============================================================================

/// How far a room may spill out of its preferred cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPass {
    Cell,
    Adjacent,
    Band,
}

impl SearchPass {
    pub const ALL: [SearchPass; 3] = [SearchPass::Cell, SearchPass::Adjacent, SearchPass::Band];

    pub fn name(self) -> &'static str {
        match self {
            SearchPass::Cell => "cell",
            SearchPass::Adjacent => "adjacent",
            SearchPass::Band => "band",
        }
    }

    /// Columns pooled for a room whose preferred column is `column`, the
    /// preferred column first.
    fn pool(self, column: usize) -> Vec<usize> {
        let mut pool = vec![column];
        match self {
            SearchPass::Cell => {}
            SearchPass::Adjacent => {
                if column > 0 {
                    pool.push(column - 1);
                }
                if column < 2 {
                    pool.push(column + 1);
                }
            }
            SearchPass::Band => pool.extend((0..3).filter(|c| *c != column)),
        }
        pool
    }
}

/// One shelf entry: a full-depth room, or a half-depth pair stacked
/// exterior over corridor side.
#[derive(Debug, Clone)]
struct Slot {
    column: usize,
    seq: usize,
    /// Indices into the floor's room list
    rooms: Vec<usize>,
    nominal: f64,
    min_width: f64,
    max_width: f64,
    half: bool,
}

impl Slot {
    fn fill_key(&self) -> (usize, i64) {
        // east column entries run from the plot side inward
        let seq = self.seq as i64;
        (self.column, if self.column < 2 { seq } else { -seq })
    }
}

/// A placed rectangle before ids and walls exist
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub kind: RoomKind,
    pub label: String,
    pub rect: Rect,
}

/// Claims column capacity room by room, then fills the bands.
pub struct ShelfPlanner<'a> {
    grid: &'a BandGrid,
    layout: &'a LayoutRules,
    residual: [[f64; 3]; 2],
    slots: [Vec<Slot>; 2],
    next_seq: usize,
}

impl<'a> ShelfPlanner<'a> {
    pub fn new(grid: &'a BandGrid, layout: &'a LayoutRules) -> Self {
        let widths = [grid.column_width(0), grid.column_width(1), grid.column_width(2)];
        ShelfPlanner {
            grid,
            layout,
            residual: [widths, widths],
            slots: [Vec::new(), Vec::new()],
            next_seq: 0,
        }
    }

    /// Take the staircase slot out of its cell's capacity.
    pub fn reserve_stair(&mut self, stair: &StairSlot) {
        let residual = &mut self.residual[stair.band.index()][stair.column];
        *residual = (*residual - stair.footprint.width).max(0.0);
    }

    /// Claim capacity for one room. On failure, returns every cell tried
    /// (plan-frame direction) with the pass it was tried in.
    pub fn place(
        &mut self,
        index: usize,
        room: &ZonedRoom,
        plan_zone: Direction,
    ) -> Result<(), Vec<(SearchPass, Direction)>> {
        let mut attempted = Vec::new();
        let grid = self.layout.grid_ft;
        let aspect = self.layout.aspect_ratio_max;
        let min_area = room.target.min_sqft;

        for pass in SearchPass::ALL {
            for candidate in plan_zone.search_order() {
                let Some((band, column)) = cell_of(candidate) else {
                    continue;
                };
                attempted.push((pass, candidate));
                let b = band.index();
                let depth = if room.half_depth {
                    self.grid.half_depth(band)
                } else {
                    self.grid.depth(band)
                };

                if room.half_depth && pass == SearchPass::Cell {
                    // the joining room sits on the corridor side and needs its own bounds there
                    let inner = self.grid.depth(band) - depth;
                    let inner_min = snap_up((inner / aspect).max(min_area / inner), grid);
                    let inner_max = snap_down(inner * aspect, grid);
                    let spare = self.residual[b][column];
                    let open_half = self.slots[b].iter_mut().find(|slot| {
                        let joined_min = slot.min_width.max(inner_min);
                        slot.half
                            && slot.rooms.len() == 1
                            && slot.column == column
                            && joined_min <= slot.max_width.min(inner_max) + EPSILON
                            && joined_min - slot.min_width <= spare + EPSILON
                    });
                    if let Some(slot) = open_half {
                        let joined_min = slot.min_width.max(inner_min);
                        self.residual[b][column] = (spare - (joined_min - slot.min_width)).max(0.0);
                        slot.min_width = joined_min;
                        slot.max_width = slot.max_width.min(inner_max);
                        slot.nominal = slot.nominal.max(slot.min_width).min(slot.max_width);
                        slot.rooms.push(index);
                        return Ok(());
                    }
                }

                let min_width = snap_up((depth / aspect).max(min_area / depth), grid);
                let max_width = snap_down(depth * aspect, grid);
                if min_width > max_width {
                    continue;
                }
                let nominal = snap(room.target.max_sqft / depth, grid).max(min_width).min(max_width);

                let pool = pass.pool(column);
                let available: f64 = pool.iter().map(|c| self.residual[b][*c]).sum();
                if available + EPSILON < min_width {
                    continue;
                }

                let mut order = pool[1..].to_vec();
                order.sort_by(|x, y| self.residual[b][*y].total_cmp(&self.residual[b][*x]));
                let mut need = min_width;
                for c in std::iter::once(column).chain(order) {
                    let take = need.min(self.residual[b][c]);
                    self.residual[b][c] -= take;
                    need -= take;
                }

                self.slots[b].push(Slot {
                    column,
                    seq: self.next_seq,
                    rooms: vec![index],
                    nominal: nominal.min(available),
                    min_width,
                    max_width,
                    half: room.half_depth,
                });
                self.next_seq += 1;
                return Ok(());
            }
        }
        Err(attempted)
    }

    /// Resolve widths and emit rectangles: per band (front, back) the stair
    /// if it sits there, the shelf entries, then any residual passage; the
    /// corridor comes last.
    ///
    /// Fails when a band's widths can neither close it within every room's
    /// bounds nor leave a full passage.
    pub fn fill(self, rooms: &[ZonedRoom], stair: Option<&StairSlot>) -> Result<Vec<Placed>, OpenBand> {
        let mut placed = Vec::new();
        let grid = self.grid;
        for band in [Band::Front, Band::Back] {
            let depth = grid.depth(band);
            let y = grid.y(band);
            let (mut lo, mut hi) = (0.0, grid.width);
            if let Some(stair) = stair.filter(|s| s.band == band) {
                placed.push(Placed {
                    kind: RoomKind::Staircase,
                    label: RoomKind::Staircase.display_name().to_string(),
                    rect: stair.footprint,
                });
                if stair.column == 0 {
                    lo = stair.footprint.width;
                } else {
                    hi = grid.width - stair.footprint.width;
                }
            }

            let mut slots = self.slots[band.index()].clone();
            slots.sort_by_key(Slot::fill_key);
            let edges = self.edges(&slots, lo, hi).ok_or_else(|| OpenBand {
                band,
                room: slots.last().map(|slot| slot.rooms[0]).unwrap_or(0),
            })?;
            let end = edges.last().copied().unwrap_or(lo);

            for (slot, pair) in slots.iter().zip(edges.windows(2)) {
                let (x0, x1) = (pair[0], pair[1]);
                let width = x1 - x0;
                let first = &rooms[slot.rooms[0]];
                if slot.half {
                    let exterior_depth = grid.half_depth(band);
                    let inner_depth = depth - exterior_depth;
                    let (exterior_y, inner_y) = match band {
                        Band::Front => (y, y + exterior_depth),
                        Band::Back => (y + depth - exterior_depth, y),
                    };
                    placed.push(Placed {
                        kind: first.kind,
                        label: first.label.clone(),
                        rect: Rect::new(x0, exterior_y, width, exterior_depth),
                    });
                    let inner = match slot.rooms.get(1) {
                        Some(second) => (rooms[*second].kind, rooms[*second].label.clone()),
                        None => (RoomKind::Passage, RoomKind::Passage.display_name().to_string()),
                    };
                    placed.push(Placed {
                        kind: inner.0,
                        label: inner.1,
                        rect: Rect::new(x0, inner_y, width, inner_depth),
                    });
                } else {
                    placed.push(Placed {
                        kind: first.kind,
                        label: first.label.clone(),
                        rect: Rect::new(x0, y, width, depth),
                    });
                }
            }

            let leftover = hi - end;
            if leftover > EPSILON {
                placed.push(Placed {
                    kind: RoomKind::Passage,
                    label: RoomKind::Passage.display_name().to_string(),
                    rect: Rect::new(end, y, leftover, depth),
                });
            }
        }

        placed.push(Placed {
            kind: RoomKind::Corridor,
            label: RoomKind::Corridor.display_name().to_string(),
            rect: grid.corridor(),
        });
        Ok(placed)
    }

    /// Slot edges between `lo` and `hi`, in whole grid steps with every width
    /// inside its slot's bounds. The slots close the band when their maximum
    /// widths reach `hi`; otherwise they stop short of it by at least a
    /// passage width. `None` when neither is possible.
    fn edges(&self, slots: &[Slot], lo: f64, hi: f64) -> Option<Vec<f64>> {
        let step = self.layout.grid_ft;
        let steps = |x: f64| (x / step).round() as i64;
        let length = steps(hi - lo);
        if slots.is_empty() {
            return Some(vec![lo]);
        }

        let bounds: Vec<(i64, i64)> = slots.iter().map(|s| (steps(s.min_width), steps(s.max_width))).collect();
        let mut widths: Vec<i64> = slots
            .iter()
            .zip(&bounds)
            .map(|(s, (min, max))| steps(s.nominal).max(*min).min(*max))
            .collect();
        let floor: i64 = bounds.iter().map(|b| b.0).sum();
        let ceiling: i64 = bounds.iter().map(|b| b.1).sum();
        let passage = (self.layout.min_passage_ft / step - EPSILON).ceil() as i64;

        let target = if ceiling >= length {
            length
        } else if length - ceiling >= passage {
            ceiling
        } else {
            length - passage
        };
        if floor > target {
            return None;
        }
        level(&mut widths, &bounds, target);

        let mut edges = Vec::with_capacity(slots.len() + 1);
        edges.push(lo);
        let mut cursor = lo;
        for w in widths {
            cursor += w as f64 * step;
            edges.push(cursor);
        }
        Some(edges)
    }
}

/// A band the planner could not close
#[derive(Debug, Clone, PartialEq)]
pub struct OpenBand {
    pub band: Band,
    /// Last room placed in the band
    pub room: usize,
}

/// Move `widths` to sum to `target` one step at a time, always taking from
/// the widest margin above its minimum or giving to the widest margin below
/// its maximum. The caller guarantees the target lies between the bound sums.
fn level(widths: &mut [i64], bounds: &[(i64, i64)], target: i64) {
    let mut total: i64 = widths.iter().sum();
    while total != target {
        let grow = total < target;
        let pick = (0..widths.len())
            .map(|i| {
                let margin = if grow { bounds[i].1 - widths[i] } else { widths[i] - bounds[i].0 };
                (margin, std::cmp::Reverse(i))
            })
            .max();
        let Some((margin, std::cmp::Reverse(i))) = pick else {
            return;
        };
        if margin <= 0 {
            return;
        }
        if grow {
            widths[i] += 1;
            total += 1;
        } else {
            widths[i] -= 1;
            total -= 1;
        }
    }
}
