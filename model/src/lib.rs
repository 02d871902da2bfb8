#[macro_use]
extern crate log;

mod animation;
mod feed;
mod palette;

use std::collections::BTreeMap;

use geom::LonLat;
use serde::{Deserialize, Serialize};

pub use self::animation::{MoveOp, StepTable, ANIMATION_STEPS};
pub use self::feed::{parse_batch, VehicleRecord};
pub use self::palette::{ColorWheel, MarkerColor};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleID(pub String);

/// Live state for one vehicle, updated both by incoming feed batches and by animation
/// frames playing back.
pub struct Vehicle {
    pub id: VehicleID,
    /// Where the marker currently is. Between fixes, this sweeps towards the most recently
    /// reported position.
    pub pos: LonLat,
    /// Epoch milliseconds of the last accepted fix. None until the first record lands, so
    /// that record is always accepted.
    pub last_update: Option<i64>,
    /// Every accepted fix, plus a trailing anchor point that animation rewrites in place.
    /// Never truncated.
    pub trail: Vec<LonLat>,
    pub color: MarkerColor,
}

/// The movement needed to bring a vehicle's marker from its previous fix to a new one.
pub struct Displacement {
    pub id: VehicleID,
    pub from: LonLat,
    pub to: LonLat,
}

/// All vehicles ever seen this session. Entries are created lazily and never removed; a
/// vehicle that stops reporting just stays parked at its last position.
pub struct Registry {
    vehicles: BTreeMap<VehicleID, Vehicle>,
    colors: ColorWheel,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            vehicles: BTreeMap::new(),
            colors: ColorWheel::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, id: &VehicleID) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Process one feed batch in delivery order, scheduling animation for every accepted
    /// record. Returns each record's reported position -- accepted or not -- so the caller
    /// can fit the viewport around the first batch.
    pub fn process_batch(
        &mut self,
        records: Vec<VehicleRecord>,
        table: &mut StepTable,
    ) -> Vec<LonLat> {
        let mut pts = Vec::new();
        for rec in records {
            pts.push(LonLat::new(rec.lon, rec.lat));
            if let Some(displacement) = self.accept(&rec) {
                table.schedule(&displacement);
            }
        }
        pts
    }

    /// Commit one record, returning the displacement to animate. A record that doesn't
    /// advance last_update is dropped silently. An accepted record duplicates the trail's
    /// last point; that copy is the anchor the animation frames rewrite.
    pub fn accept(&mut self, rec: &VehicleRecord) -> Option<Displacement> {
        let vehicle = self.get_or_create(rec);
        if let Some(t) = vehicle.last_update {
            if rec.last_update <= t {
                debug!(
                    "Dropping stale update for {:?}: {} doesn't advance {}",
                    vehicle.id, rec.last_update, t
                );
                return None;
            }
        }
        vehicle.last_update = Some(rec.last_update);

        let from = *vehicle.trail.last().unwrap();
        vehicle.trail.push(from);

        Some(Displacement {
            id: vehicle.id.clone(),
            from,
            to: LonLat::new(rec.lon, rec.lat),
        })
    }

    /// One animation micro-step: move the marker and rewrite the trail's anchor point. The
    /// trail doesn't grow here; only accept does that.
    pub fn apply(&mut self, op: &MoveOp) {
        if let Some(vehicle) = self.vehicles.get_mut(&op.id) {
            vehicle.pos = op.target;
            *vehicle.trail.last_mut().unwrap() = op.target;
        }
    }

    fn get_or_create(&mut self, rec: &VehicleRecord) -> &mut Vehicle {
        let colors = &mut self.colors;
        self.vehicles.entry(rec.id.clone()).or_insert_with(|| {
            let pos = LonLat::new(rec.lon, rec.lat);
            Vehicle {
                id: rec.id.clone(),
                pos,
                last_update: None,
                trail: vec![pos],
                color: colors.next(),
            }
        })
    }
}
