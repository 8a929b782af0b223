use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::errors::AppError;
use crate::models::attendance::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, AttendanceView, MealAttendance,
    MessDay, MessEntry, PoorAttendance, WeekMenu,
};
use crate::store::{from_document, to_document, Document, Query};

use super::{Repository, ATTENDANCE, MESS_ATTENDANCE, MESS_MENU};

const MENU_DOC: &str = "week";

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

impl Repository {
    /// Mark one tenant for one day. Marking again overwrites.
    pub async fn mark_attendance(
        &self,
        tenant_id: i64,
        date: &str,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        let day = parse_date(date)?;
        self.tenant(tenant_id).await?;

        let record = AttendanceRecord {
            tenant_id,
            date: day.to_string(),
            status,
            time: now.format("%H:%M:%S").to_string(),
            timestamp: now,
        };
        self.store
            .set(
                ATTENDANCE,
                &AttendanceRecord::doc_id(tenant_id, &record.date),
                to_document(&record)?,
            )
            .await?;
        Ok(record)
    }

    pub async fn attendance_on(&self, date: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        let day = parse_date(date)?;
        self.fetch_all(ATTENDANCE, &Query::new().eq("date", day.to_string()))
            .await
    }

    /// Records in the inclusive date range joined with tenant name and room.
    /// Either bound may be omitted.
    pub async fn attendance_between(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<AttendanceView>, AppError> {
        let from = from.map(parse_date).transpose()?.map(|d| d.to_string());
        let to = to.map(parse_date).transpose()?.map(|d| d.to_string());

        let records: Vec<AttendanceRecord> = self
            .fetch_all(ATTENDANCE, &Query::new().between("date", from, to))
            .await?;
        let tenants: HashMap<i64, (String, String)> = self
            .list_tenants()
            .await?
            .into_iter()
            .map(|t| (t.id, (t.name, t.room)))
            .collect();

        let mut views: Vec<AttendanceView> = records
            .into_iter()
            .map(|record| {
                let (student_name, room_number) = tenants
                    .get(&record.tenant_id)
                    .cloned()
                    .unwrap_or_else(|| ("Unknown".to_string(), "N/A".to_string()));
                AttendanceView {
                    record,
                    student_name,
                    room_number,
                }
            })
            .collect();
        views.sort_by(|a, b| {
            b.record
                .date
                .cmp(&a.record.date)
                .then(a.record.tenant_id.cmp(&b.record.tenant_id))
        });
        Ok(views)
    }

    pub async fn attendance_stats(&self, date: &str) -> Result<AttendanceStats, AppError> {
        let records = self.attendance_on(date).await?;
        let total = self.count_tenants().await?;

        let count = |status: AttendanceStatus| records.iter().filter(|r| r.status == status).count() as u64;
        let present = count(AttendanceStatus::Present);

        Ok(AttendanceStats {
            date: parse_date(date)?.to_string(),
            total,
            present,
            absent: count(AttendanceStatus::Absent),
            leave: count(AttendanceStatus::Leave),
            not_marked: total.saturating_sub(records.len() as u64),
            percentage: percentage(present, total),
        })
    }

    /// Tenants present on fewer than `threshold` percent of their marked
    /// days within the window ending `today`, worst first, at most ten.
    pub async fn poor_attendance(
        &self,
        today: NaiveDate,
        window_days: i64,
        threshold: f64,
    ) -> Result<Vec<PoorAttendance>, AppError> {
        let from = (today - Duration::days(window_days.max(1) - 1)).to_string();
        let records: Vec<AttendanceRecord> = self
            .fetch_all(
                ATTENDANCE,
                &Query::new().between("date", Some(from), Some(today.to_string())),
            )
            .await?;

        let mut per_tenant: HashMap<i64, (u64, u64)> = HashMap::new();
        for record in &records {
            let entry = per_tenant.entry(record.tenant_id).or_default();
            entry.1 += 1;
            if record.status == AttendanceStatus::Present {
                entry.0 += 1;
            }
        }

        let mut poor: Vec<PoorAttendance> = self
            .list_tenants()
            .await?
            .into_iter()
            .filter_map(|tenant| {
                let (present_days, marked_days) = per_tenant.get(&tenant.id).copied()?;
                let rate = percentage(present_days, marked_days);
                (rate < threshold).then(|| PoorAttendance {
                    tenant_id: tenant.id,
                    name: tenant.name,
                    room: tenant.room,
                    present_days,
                    marked_days,
                    percentage: rate,
                })
            })
            .collect();

        poor.sort_by(|a, b| a.percentage.total_cmp(&b.percentage));
        poor.truncate(10);
        Ok(poor)
    }

    /// Present count and marked count for each of the `days` days ending
    /// `today`, oldest first.
    pub async fn daily_presence(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> Result<Vec<(NaiveDate, u64, u64)>, AppError> {
        let from = today - Duration::days(days.max(1) - 1);
        let records: Vec<AttendanceRecord> = self
            .fetch_all(
                ATTENDANCE,
                &Query::new().between("date", Some(from.to_string()), Some(today.to_string())),
            )
            .await?;

        let mut by_day: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for record in &records {
            let entry = by_day.entry(record.date.clone()).or_default();
            entry.1 += 1;
            if record.status == AttendanceStatus::Present {
                entry.0 += 1;
            }
        }

        Ok(from
            .iter_days()
            .take_while(|d| *d <= today)
            .map(|d| {
                let (present, marked) = by_day.get(&d.to_string()).copied().unwrap_or_default();
                (d, present, marked)
            })
            .collect())
    }

    // ── Mess ─────────────────────────────────────────────────────

    /// Record which meals a tenant will take on `date`.
    pub async fn save_mess_attendance(
        &self,
        tenant_id: i64,
        meals: MealAttendance,
        date: NaiveDate,
    ) -> Result<(), AppError> {
        self.tenant(tenant_id).await?;

        let key = date.to_string();
        let mut patch = Document::new();
        patch.insert(
            tenant_id.to_string(),
            serde_json::Value::Object(to_document(&meals)?),
        );

        if !self.store.merge(MESS_ATTENDANCE, &key, patch.clone()).await? {
            self.store.set(MESS_ATTENDANCE, &key, patch).await?;
        }
        Ok(())
    }

    pub async fn mess_day(&self, date: NaiveDate) -> Result<MessDay, AppError> {
        match self.store.get(MESS_ATTENDANCE, &date.to_string()).await? {
            Some(doc) => Ok(from_document(doc)?),
            None => Ok(MessDay::new()),
        }
    }

    /// A day's mess sign-ups with tenant names.
    pub async fn mess_attendance_on(&self, date: NaiveDate) -> Result<Vec<MessEntry>, AppError> {
        let day = self.mess_day(date).await?;
        let mut entries = Vec::with_capacity(day.len());
        for (tenant_id, attendance) in day {
            let name = match tenant_id.parse::<i64>() {
                Ok(id) => self.get_tenant(id).await?.map(|t| t.name),
                Err(_) => None,
            }
            .unwrap_or_else(|| format!("Unknown ({tenant_id})"));
            entries.push(MessEntry {
                tenant_id,
                name,
                attendance,
            });
        }
        Ok(entries)
    }

    /// Number of tenants taking at least one meal on each of the `days`
    /// days before `today`, oldest first.
    pub async fn mess_headcounts(&self, today: NaiveDate, days: i64) -> Result<Vec<u64>, AppError> {
        let mut counts = Vec::with_capacity(days.max(0) as usize);
        for offset in (1..=days).rev() {
            let day = self.mess_day(today - Duration::days(offset)).await?;
            counts.push(day.values().filter(|m| m.any()).count() as u64);
        }
        Ok(counts)
    }

    pub async fn save_menu(&self, menu: &WeekMenu) -> Result<(), AppError> {
        self.store
            .set(MESS_MENU, MENU_DOC, to_document(menu)?)
            .await?;
        Ok(())
    }

    pub async fn get_menu(&self) -> Result<WeekMenu, AppError> {
        Ok(self.fetch(MESS_MENU, MENU_DOC).await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2026-02-28").is_ok());
        assert!(parse_date("28/02/2026").is_err());
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }
}
