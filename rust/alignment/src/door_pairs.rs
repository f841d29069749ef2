// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Matching door labels across rooms

use crate::room::RoomScan;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A door in a specific room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoorRef {
    pub room: Uuid,
    pub door: usize,
}

/// Connection between two rooms through one labeled door in each
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoorPair {
    pub label: String,
    /// Door in the earlier-added room
    pub first: DoorRef,
    pub second: DoorRef,
}

impl DoorPair {
    pub fn connects(&self, room: Uuid) -> bool {
        self.first.room == room || self.second.room == room
    }

    /// `(near, far)` doors as seen from `room`
    pub fn sides_from(&self, room: Uuid) -> Option<(DoorRef, DoorRef)> {
        if self.first.room == room {
            Some((self.first, self.second))
        } else if self.second.room == room {
            Some((self.second, self.first))
        } else {
            None
        }
    }
}

/// Label carried by more than two doors, or twice within one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousLabel {
    pub label: String,
    pub doors: Vec<DoorRef>,
}

impl AmbiguousLabel {
    pub fn rooms(&self) -> Vec<Uuid> {
        self.doors.iter().map(|d| d.room).collect()
    }
}

/// Outcome of label matching, every list sorted by label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoorPairing {
    pub pairs: Vec<DoorPair>,
    pub ambiguous: Vec<AmbiguousLabel>,
    /// Labels found on a single door
    pub unmatched: Vec<String>,
}

/// Group labeled doors by label.
///
/// A label forms a pair only when it is on exactly one door in each of
/// exactly two rooms.
pub fn match_door_pairs(rooms: &[RoomScan]) -> DoorPairing {
    let mut by_label: BTreeMap<&str, Vec<DoorRef>> = BTreeMap::new();
    for room in rooms {
        for (index, door) in room.doors.iter().enumerate() {
            if let Some(label) = door.label.as_deref() {
                by_label.entry(label).or_default().push(DoorRef {
                    room: room.id,
                    door: index,
                });
            }
        }
    }

    let mut pairing = DoorPairing::default();
    for (label, doors) in by_label {
        let label = label.to_string();
        if doors.len() == 1 {
            pairing.unmatched.push(label);
        } else if doors.len() == 2 && doors[0].room != doors[1].room {
            pairing.pairs.push(DoorPair {
                label,
                first: doors[0],
                second: doors[1],
            });
        } else {
            pairing.ambiguous.push(AmbiguousLabel { label, doors });
        }
    }
    pairing
}
