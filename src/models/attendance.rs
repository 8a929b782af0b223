use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

/// One tenant on one day, stored under `"{tenant_id}_{date}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub tenant_id: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    pub status: AttendanceStatus,
    /// `HH:MM:SS` when marked.
    pub time: String,
    pub timestamp: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn doc_id(tenant_id: i64, date: &str) -> String {
        format!("{tenant_id}_{date}")
    }
}

/// Attendance row joined with the tenant's name and room.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub student_name: String,
    pub room_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceStats {
    pub date: String,
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub leave: u64,
    pub not_marked: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoorAttendance {
    pub tenant_id: i64,
    pub name: String,
    pub room: String,
    pub present_days: u64,
    pub marked_days: u64,
    pub percentage: f64,
}

/// Meals a tenant opted into for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealAttendance {
    #[serde(default)]
    pub breakfast: bool,
    #[serde(default)]
    pub lunch: bool,
    #[serde(default)]
    pub dinner: bool,
}

impl MealAttendance {
    pub fn any(&self) -> bool {
        self.breakfast || self.lunch || self.dinner
    }
}

/// A day's mess document: tenant id (as string) to meals.
pub type MessDay = BTreeMap<String, MealAttendance>;

#[derive(Debug, Clone, Serialize)]
pub struct MessEntry {
    pub tenant_id: String,
    pub name: String,
    pub attendance: MealAttendance,
}

/// Weekly menu: weekday name to meal name to dish.
pub type WeekMenu = BTreeMap<String, BTreeMap<String, String>>;
