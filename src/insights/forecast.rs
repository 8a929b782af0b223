use chrono::{NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessForecast {
    pub forecast: u64,
    pub average_last_7_days: f64,
    pub historical_data: Vec<u64>,
}

/// Expected mess headcount for tomorrow from recent daily headcounts.
///
/// The forecast is the plain mean, scaled by 0.8 and truncated when
/// tomorrow falls on a weekend. No history at all forecasts zero.
pub fn mess_forecast(history: &[u64], tomorrow: Weekday) -> MessForecast {
    let total: u64 = history.iter().sum();
    if history.is_empty() || total == 0 {
        return MessForecast {
            forecast: 0,
            average_last_7_days: 0.0,
            historical_data: history.to_vec(),
        };
    }

    let average = total as f64 / history.len() as f64;
    let forecast = match tomorrow {
        Weekday::Sat | Weekday::Sun => (average * 0.8) as u64,
        _ => average as u64,
    };

    MessForecast {
        forecast,
        average_last_7_days: (average * 10.0).round() / 10.0,
        historical_data: history.to_vec(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceTrend {
    /// Mean present percentage over the days that had any marks.
    pub avg_attendance: f64,
    pub days_counted: usize,
    pub insights: Vec<String>,
}

/// Summarise `(day, present, marked)` rows, oldest first.
pub fn attendance_trend(days: &[(NaiveDate, u64, u64)]) -> AttendanceTrend {
    let rates: Vec<f64> = days
        .iter()
        .filter(|(_, _, marked)| *marked > 0)
        .map(|(_, present, marked)| (*present * 100) as f64 / *marked as f64)
        .collect();

    let average = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    let mut insights = Vec::new();
    if average > 85.0 {
        insights.push("Excellent attendance rate".to_string());
    } else if average > 70.0 {
        insights.push("Good attendance rate".to_string());
    } else {
        insights.push("Attendance needs improvement".to_string());
    }

    if let [.., (_, yesterday, _), (_, today, _)] = days {
        if today > yesterday {
            insights.push("Attendance improved from yesterday".to_string());
        } else if today < yesterday {
            insights.push("Attendance decreased from yesterday".to_string());
        }
    }

    AttendanceTrend {
        avg_attendance: (average * 10.0).round() / 10.0,
        days_counted: rates.len(),
        insights,
    }
}
