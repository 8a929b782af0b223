use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    Occupied,
    #[serde(rename = "Under Maintenance")]
    UnderMaintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_no: String,
    pub floor: i32,
    pub capacity: u32,
    pub ac: bool,
    pub status: RoomStatus,
}

impl Room {
    /// Only rooms marked Available take new tenants.
    pub fn is_available(&self) -> bool {
        self.status == RoomStatus::Available
    }
}
