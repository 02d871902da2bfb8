use std::collections::{BTreeMap, VecDeque};

use geom::LonLat;
use serde::Serialize;

use crate::{Displacement, VehicleID};

/// Every accepted fix is played back over this many display ticks.
pub const ANIMATION_STEPS: usize = 20;

/// One scheduled micro-movement: put this vehicle's marker here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoveOp {
    pub id: VehicleID,
    pub target: LonLat,
}

/// The pending animation frames, at most ANIMATION_STEPS of them. Each slot holds one
/// target per vehicle, so a displacement scheduled mid-playback overwrites whatever an
/// older batch left behind for the same vehicle. Two batches never fight over one marker.
pub struct StepTable {
    slots: VecDeque<BTreeMap<VehicleID, LonLat>>,
}

impl StepTable {
    pub fn new() -> Self {
        Self {
            slots: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn remaining_frames(&self) -> usize {
        self.slots.len()
    }

    /// Split a displacement into ANIMATION_STEPS evenly spaced targets, one per frame. An
    /// unmoved vehicle schedules nothing; its marker just stays put.
    pub fn schedule(&mut self, d: &Displacement) {
        if d.from == d.to {
            return;
        }

        while self.slots.len() < ANIMATION_STEPS {
            self.slots.push_back(BTreeMap::new());
        }

        let lon_delta = (d.to.x() - d.from.x()) / (ANIMATION_STEPS as f64);
        let lat_delta = (d.to.y() - d.from.y()) / (ANIMATION_STEPS as f64);
        for i in 0..ANIMATION_STEPS {
            // The last frame has to land on the reported fix exactly, not within floating
            // point error of it
            let target = if i == ANIMATION_STEPS - 1 {
                d.to
            } else {
                LonLat::new(
                    d.from.x() + lon_delta * ((i + 1) as f64),
                    d.from.y() + lat_delta * ((i + 1) as f64),
                )
            };
            self.slots[i].insert(d.id.clone(), target);
        }
    }

    /// Pop the next frame's operations. Frames come off strictly in order; the order of
    /// vehicles within one frame doesn't matter.
    pub fn next_frame(&mut self) -> Option<Vec<MoveOp>> {
        let slot = self.slots.pop_front()?;
        Some(
            slot.into_iter()
                .map(|(id, target)| MoveOp { id, target })
                .collect(),
        )
    }
}
