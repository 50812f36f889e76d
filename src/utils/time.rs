use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Interview timestamps are civil date + slot start interpreted as UTC;
/// cross-timezone resolution is out of scope.
pub fn at_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_date_and_slot_start() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date");
        let time = NaiveTime::from_hms_opt(9, 30, 0).expect("valid time");
        assert_eq!(at_utc(date, time).to_rfc3339(), "2026-09-01T09:30:00+00:00");
    }
}
