use serde::{Deserialize, Serialize};

use super::sleep_gap;
use crate::models::room::Room;
use crate::models::tenant::{Tenant, TenantKind};

/// What a newcomer asks for when looking for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RoomPreferences {
    #[serde(rename = "type")]
    pub kind: TenantKind,
    pub ac: bool,
    pub sleep_time: u8,
    pub smoking: bool,
}

impl From<&Tenant> for RoomPreferences {
    fn from(tenant: &Tenant) -> Self {
        Self {
            kind: tenant.kind,
            ac: tenant.ac,
            sleep_time: tenant.sleep_time,
            smoking: tenant.smoking,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomRecommendation {
    pub room_no: String,
    pub score: u32,
    pub floor: i32,
    pub capacity: u32,
    pub ac: bool,
    pub current_occupants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoommateMatch {
    pub roommate_id: i64,
    pub roommate_name: String,
    pub compatibility_score: u32,
    pub reasons: Vec<&'static str>,
}

const ROOM_AC_MATCH: u32 = 30;
const ROOM_SLEEP_CLOSE: u32 = 25;
const ROOM_SLEEP_NEAR: u32 = 10;
const ROOM_SMOKING_MATCH: u32 = 25;
const ROOM_KIND_MATCH: u32 = 20;

/// Score a room for `prefs` against the people already living in it.
///
/// Bedtimes are compared on a 24h clock that wraps past midnight, so 23
/// and 1 count as 2 hours apart rather than 22.
pub fn room_compatibility(prefs: &RoomPreferences, room: &Room, occupants: &[Tenant]) -> u32 {
    let mut score = 0;
    if room.ac == prefs.ac {
        score += ROOM_AC_MATCH;
    }
    for occupant in occupants {
        match sleep_gap(occupant.sleep_time, prefs.sleep_time) {
            0..=2 => score += ROOM_SLEEP_CLOSE,
            3..=4 => score += ROOM_SLEEP_NEAR,
            _ => {}
        }
        if occupant.smoking == prefs.smoking {
            score += ROOM_SMOKING_MATCH;
        }
        if occupant.kind == prefs.kind {
            score += ROOM_KIND_MATCH;
        }
    }
    score
}

/// Best three rooms by score. Ties keep the input order.
pub fn recommend_rooms(
    prefs: &RoomPreferences,
    candidates: &[(Room, Vec<Tenant>)],
) -> Vec<RoomRecommendation> {
    let mut scored: Vec<RoomRecommendation> = candidates
        .iter()
        .map(|(room, occupants)| RoomRecommendation {
            room_no: room.room_no.clone(),
            score: room_compatibility(prefs, room, occupants),
            floor: room.floor,
            capacity: room.capacity,
            ac: room.ac,
            current_occupants: occupants.len(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(3);
    scored
}

/// Pairwise score between two tenants, with the reasons that contributed.
pub fn roommate_compatibility(student: &Tenant, other: &Tenant) -> (u32, Vec<&'static str>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    match sleep_gap(student.sleep_time, other.sleep_time) {
        0..=1 => {
            score += 30;
            reasons.push("Similar sleep schedule");
        }
        2 => score += 20,
        _ => {}
    }
    if student.smoking == other.smoking {
        score += 25;
        reasons.push("Same smoking preference");
    }
    if student.kind == other.kind {
        score += 20;
        reasons.push("Same occupation type");
    }
    if student.ac == other.ac {
        score += 15;
        reasons.push("Same AC preference");
    }
    (score, reasons)
}

/// Score every roommate of `student` (skipping the student), best first.
pub fn rank_roommates(student: &Tenant, roommates: &[Tenant]) -> Vec<RoommateMatch> {
    let mut matches: Vec<RoommateMatch> = roommates
        .iter()
        .filter(|t| t.id != student.id)
        .map(|t| {
            let (score, reasons) = roommate_compatibility(student, t);
            RoommateMatch {
                roommate_id: t.id,
                roommate_name: t.name.clone(),
                compatibility_score: score,
                reasons,
            }
        })
        .collect();
    matches.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));
    matches
}
