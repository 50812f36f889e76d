use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::interview::Interview;
use crate::models::room::Room;
use crate::utils::time::at_utc;
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

/// An ephemeral candidate interview window. Never persisted; chronological
/// order is the only assignment tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Copy)]
pub struct SlotWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub interval_minutes: i64,
}

/// Lazy, restartable slot sequence: `[cursor, cursor + interval)` from the
/// window start, dropping (not truncating) a slot that would overrun the end.
/// An interval at least as long as the window yields an empty sequence.
pub fn slot_iter(window: &SlotWindow) -> Result<impl Iterator<Item = TimeSlot> + Clone> {
    if window.interval_minutes <= 0 {
        return Err(Error::InvalidWindow(format!(
            "interval must be positive, got {} minutes",
            window.interval_minutes
        )));
    }
    if window.start >= window.end {
        return Err(Error::InvalidWindow(format!(
            "start {} must be before end {}",
            window.start, window.end
        )));
    }

    let start = window.start;
    let step_seconds = window.interval_minutes.checked_mul(60).ok_or_else(|| {
        Error::InvalidWindow(format!(
            "interval of {} minutes is out of range",
            window.interval_minutes
        ))
    })?;
    let span_seconds =
        window.end.num_seconds_from_midnight() as i64 - start.num_seconds_from_midnight() as i64;
    let count = span_seconds / step_seconds;

    Ok((0..count).map(move |i| {
        let slot_start = start + Duration::seconds(i * step_seconds);
        TimeSlot {
            start: slot_start,
            end: slot_start + Duration::seconds(step_seconds),
        }
    }))
}

pub fn plan_slots(window: &SlotWindow) -> Result<Vec<TimeSlot>> {
    Ok(slot_iter(window)?.collect())
}

/// Positional zip: the i-th candidate in selection order takes the i-th
/// chronological slot. Fails before anything is paired when the candidates
/// outnumber the slots.
pub fn pair_assignments(
    candidate_ids: &[Uuid],
    slots: &[TimeSlot],
) -> Result<Vec<(Uuid, TimeSlot)>> {
    if candidate_ids.len() > slots.len() {
        return Err(Error::CapacityExceeded { max: slots.len() });
    }
    Ok(candidate_ids
        .iter()
        .copied()
        .zip(slots.iter().copied())
        .collect())
}

// A concurrent batch can slip past the duplicate pre-check; the unique index
// on application_id then reports the loser as a conflict, not a 500.
fn map_interview_insert_error(err: sqlx::Error, application_id: Uuid) -> Error {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::DuplicateAssignment(application_id)
        }
        other => Error::from(other),
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    pool: PgPool,
}

impl ScheduleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Binds candidates to slots and creates the interview rows in a single
    /// transaction, so a capacity or duplicate failure leaves zero rows.
    pub async fn allocate(
        &self,
        date: NaiveDate,
        room_id: Uuid,
        candidate_ids: &[Uuid],
        window: &SlotWindow,
    ) -> Result<Vec<Interview>> {
        let slots = plan_slots(window)?;
        let pairs = pair_assignments(candidate_ids, &slots)?;

        let mut seen = HashSet::new();
        for id in candidate_ids {
            if !seen.insert(*id) {
                return Err(Error::BadRequest(format!(
                    "Candidate {} appears more than once in the selection",
                    id
                )));
            }
        }

        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, Room>(
            r#"SELECT id, name, capacity, is_active, created_at, updated_at
               FROM rooms WHERE id = $1"#,
        )
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Room {} not found", room_id)))?;
        if !room.is_active {
            return Err(Error::BadRequest(format!(
                "Room {} is not active",
                room.name
            )));
        }

        let applications = sqlx::query_as::<_, Application>(
            r#"SELECT id, candidate_name, email, created_at, updated_at
               FROM applications WHERE id = ANY($1)"#,
        )
        .bind(candidate_ids)
        .fetch_all(&mut *tx)
        .await?;
        if applications.len() != candidate_ids.len() {
            let found: HashSet<Uuid> = applications.iter().map(|a| a.id).collect();
            let missing = candidate_ids
                .iter()
                .find(|id| !found.contains(id))
                .copied()
                .unwrap_or(room_id);
            return Err(Error::NotFound(format!("Application {} not found", missing)));
        }

        // Reject policy: a candidate already holding an interview is a
        // conflict, never a silent supersede.
        let taken: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT application_id FROM interviews WHERE application_id = ANY($1) LIMIT 1"#,
        )
        .bind(candidate_ids)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some((application_id,)) = taken {
            return Err(Error::DuplicateAssignment(application_id));
        }

        let mut created = Vec::with_capacity(pairs.len());
        for (candidate_id, slot) in &pairs {
            let interview = sqlx::query_as::<_, Interview>(
                r#"
                INSERT INTO interviews (application_id, room_id, scheduled_at)
                VALUES ($1, $2, $3)
                RETURNING id, application_id, room_id, scheduled_at, status, result,
                          technical_score, communication_score, problem_solving_score,
                          culture_fit_score, overall_score, interviewer_notes,
                          notification_sent, created_at, updated_at
                "#,
            )
            .bind(candidate_id)
            .bind(room_id)
            .bind(at_utc(date, slot.start))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_interview_insert_error(e, *candidate_id))?;
            created.push(interview);
        }

        tx.commit().await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid test time")
    }

    fn window(start: NaiveTime, end: NaiveTime, interval_minutes: i64) -> SlotWindow {
        SlotWindow {
            start,
            end,
            interval_minutes,
        }
    }

    #[test]
    fn hour_window_with_half_hour_interval_yields_two_slots() {
        let slots = assert_ok!(plan_slots(&window(t(9, 0), t(10, 0), 30)));
        assert_eq!(
            slots,
            vec![
                TimeSlot {
                    start: t(9, 0),
                    end: t(9, 30)
                },
                TimeSlot {
                    start: t(9, 30),
                    end: t(10, 0)
                },
            ]
        );
    }

    #[test]
    fn overrunning_slot_is_dropped_not_truncated() {
        let slots = assert_ok!(plan_slots(&window(t(9, 0), t(10, 0), 45)));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end, t(9, 45));
    }

    #[test]
    fn interval_longer_than_window_is_empty_not_an_error() {
        let slots = assert_ok!(plan_slots(&window(t(9, 0), t(10, 0), 90)));
        assert!(slots.is_empty());
    }

    #[test]
    fn slot_count_is_floor_of_window_over_interval_and_slots_stay_in_bounds() {
        for (start, end, interval) in [
            (t(9, 0), t(17, 0), 25),
            (t(8, 15), t(12, 0), 40),
            (t(0, 0), t(23, 59), 60),
            (t(13, 30), t(14, 0), 7),
        ] {
            let w = window(start, end, interval);
            let slots = assert_ok!(plan_slots(&w));
            let span = end.num_seconds_from_midnight() as i64
                - start.num_seconds_from_midnight() as i64;
            assert_eq!(slots.len() as i64, span / (interval * 60));
            for slot in &slots {
                assert!(slot.start >= start);
                assert!(slot.end <= end);
                assert!(slot.start < slot.end);
            }
        }
    }

    #[test]
    fn sequence_is_restartable() {
        let iter = assert_ok!(slot_iter(&window(t(9, 0), t(11, 0), 30)));
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert!(matches!(
            plan_slots(&window(t(10, 0), t(9, 0), 30)),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            plan_slots(&window(t(9, 0), t(9, 0), 30)),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        assert!(matches!(
            plan_slots(&window(t(9, 0), t(10, 0), 0)),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            plan_slots(&window(t(9, 0), t(10, 0), -15)),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn absurdly_large_interval_is_rejected_not_wrapped() {
        assert!(matches!(
            plan_slots(&window(t(9, 0), t(10, 0), i64::MAX)),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            plan_slots(&window(t(9, 0), t(10, 0), i64::MAX / 60 + 1)),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[derive(Debug)]
    struct DuplicateKeyError;

    impl std::fmt::Display for DuplicateKeyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKeyError {}

    impl sqlx::error::DatabaseError for DuplicateKeyError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn racing_duplicate_insert_surfaces_as_a_conflict() {
        let application_id = Uuid::new_v4();
        let err = sqlx::Error::Database(Box::new(DuplicateKeyError));
        assert!(matches!(
            map_interview_insert_error(err, application_id),
            Error::DuplicateAssignment(id) if id == application_id
        ));
    }

    #[test]
    fn non_duplicate_insert_errors_pass_through() {
        assert!(matches!(
            map_interview_insert_error(sqlx::Error::RowNotFound, Uuid::new_v4()),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn pairing_is_positional_in_selection_order() {
        let candidates: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let slots = assert_ok!(plan_slots(&window(t(9, 0), t(11, 0), 30)));
        let pairs = assert_ok!(pair_assignments(&candidates, &slots));
        assert_eq!(pairs.len(), 3);
        for (i, (candidate, slot)) in pairs.iter().enumerate() {
            assert_eq!(*candidate, candidates[i]);
            assert_eq!(*slot, slots[i]);
        }
    }

    #[test]
    fn three_candidates_on_two_slots_report_the_assignable_maximum() {
        let candidates: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let slots = assert_ok!(plan_slots(&window(t(9, 0), t(10, 0), 30)));
        match pair_assignments(&candidates, &slots) {
            Err(Error::CapacityExceeded { max }) => assert_eq!(max, 2),
            other => panic!("expected CapacityExceeded, got {:?}", other.map(|p| p.len())),
        }
    }
}
