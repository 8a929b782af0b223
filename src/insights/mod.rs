//! Ranking heuristics behind the admin insights endpoints.
//!
//! Everything here is a pure function over already-loaded records, so the
//! handlers do the store reads and these modules only score.

pub mod compatibility;
pub mod forecast;
pub mod payment_risk;
pub mod priority;

pub use compatibility::{
    rank_roommates, recommend_rooms, room_compatibility, roommate_compatibility, RoomPreferences,
    RoomRecommendation, RoommateMatch,
};
pub use forecast::{attendance_trend, mess_forecast, AttendanceTrend, MessForecast};
pub use payment_risk::{payment_risk, RiskLevel, RiskReport};
pub use priority::complaint_priority;

/// Hours between two bedtimes on a 24h clock, wrapping past midnight.
pub(crate) fn sleep_gap(a: u8, b: u8) -> u8 {
    let diff = (i16::from(a) - i16::from(b)).unsigned_abs() as u8 % 24;
    diff.min(24 - diff)
}
