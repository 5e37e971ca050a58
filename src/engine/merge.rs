use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{info, warn};

use super::work_day::{work_day, work_day_window};
use crate::config::PayrollPolicyConfig;
use crate::error::EngineError;
use crate::model::{AttendanceLogEntry, PunchBatch, PunchKind, RawPunch};
use crate::store;

/// What an import run did (or, for a dry run, would do).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub total_records: usize,
    pub imported: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub skipped_old: usize,
    pub unmapped_subject_ids: Vec<UnmappedSubject>,
    pub work_days_processed: usize,
    pub errors: Vec<String>,
}

/// A subject id the terminal reported that maps to no known employee,
/// with how many punches carried it.
#[derive(Debug, Clone, Serialize)]
pub struct UnmappedSubject {
    pub subject_id: String,
    pub count: usize,
}

/// Resulting sign-in/sign-out pair for one (employee, work day), as it
/// would look after the merge. Dry runs surface a bounded sample of
/// these, most recent work days first.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewPair {
    pub employee_id: u64,
    pub work_day: NaiveDate,
    pub sign_in: Option<NaiveDateTime>,
    pub sign_out: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct ImportPreview {
    pub summary: ImportSummary,
    pub sample: Vec<PreviewPair>,
}

/// One canonical entry the merge intends to write.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub employee_id: u64,
    pub work_day: NaiveDate,
    pub kind: PunchKind,
    pub timestamp: NaiveDateTime,
}

/// Outcome of the pure planning phase: every write the batch implies,
/// plus the bookkeeping counters. Committing a plan is a separate,
/// transactional step.
#[derive(Debug, Default)]
pub struct MergePlan {
    pub inserts: Vec<PlannedEntry>,
    /// (existing row id, replacement) pairs where the candidate beat the
    /// stored timestamp.
    pub updates: Vec<(u64, PlannedEntry)>,
    pub duplicates: usize,
    pub skipped_old: usize,
    pub unmapped: BTreeMap<String, usize>,
    pub total_records: usize,
    pub work_days: BTreeSet<(u64, NaiveDate)>,
    /// Post-merge sign-in/sign-out view of every touched work day.
    pub pairs: Vec<PreviewPair>,
}

impl MergePlan {
    pub fn into_summary(self, errors: Vec<String>) -> ImportSummary {
        ImportSummary {
            total_records: self.total_records,
            imported: self.inserts.len(),
            updated: self.updates.len(),
            duplicates: self.duplicates,
            skipped_old: self.skipped_old,
            unmapped_subject_ids: self
                .unmapped
                .into_iter()
                .map(|(subject_id, count)| UnmappedSubject { subject_id, count })
                .collect(),
            work_days_processed: self.work_days.len(),
            errors,
        }
    }
}

/// Resolves a punch batch against the canonical log without touching the
/// store.
///
/// `last_known_timestamp` is the global high-water mark, computed once by
/// the caller; every punch at or before it is skipped as already seen.
/// Within each surviving (employee, work day) group the earliest punch is
/// the sign-in candidate and the latest the sign-out candidate. Against an
/// existing entry, an earlier sign-in or a later sign-out wins; anything
/// else is a duplicate no-op. Re-importing overlapping files is therefore
/// self-correcting: wider-bounding punches always win, strict subsets are
/// no-ops.
pub fn plan_merge(
    punches: &[RawPunch],
    subjects: &HashMap<String, u64>,
    existing: &[AttendanceLogEntry],
    last_known_timestamp: Option<NaiveDateTime>,
    policy: &PayrollPolicyConfig,
) -> MergePlan {
    let cutoff = policy.workday_cutoff_hour;
    let mut plan = MergePlan {
        total_records: punches.len(),
        ..Default::default()
    };

    // Group the surviving punches by (employee, work day).
    let mut groups: BTreeMap<(u64, NaiveDate), Vec<NaiveDateTime>> = BTreeMap::new();
    for punch in punches {
        if let Some(mark) = last_known_timestamp {
            if punch.timestamp <= mark {
                plan.skipped_old += 1;
                continue;
            }
        }
        let Some(&employee_id) = subjects.get(&punch.subject_id) else {
            *plan.unmapped.entry(punch.subject_id.clone()).or_insert(0) += 1;
            continue;
        };
        let day = work_day(punch.timestamp, cutoff);
        groups.entry((employee_id, day)).or_default().push(punch.timestamp);
    }

    // Index existing canonical entries by (employee, work day, kind). The
    // invariant guarantees one per key; a violated invariant degrades to
    // keeping the better-bounding entry.
    let mut index: HashMap<(u64, NaiveDate, PunchKind), (u64, NaiveDateTime)> = HashMap::new();
    for entry in existing {
        let key = (entry.employee_id, work_day(entry.timestamp, cutoff), entry.kind);
        match index.get(&key) {
            Some(&(_, ts))
                if (entry.kind == PunchKind::SignIn && ts <= entry.timestamp)
                    || (entry.kind == PunchKind::SignOut && ts >= entry.timestamp) => {}
            _ => {
                index.insert(key, (entry.id, entry.timestamp));
            }
        }
    }

    for ((employee_id, day), mut stamps) in groups {
        stamps.sort();
        plan.work_days.insert((employee_id, day));

        let mut candidates = vec![(PunchKind::SignIn, stamps[0])];
        // A lone punch yields no sign-out candidate.
        if stamps.len() > 1 {
            candidates.push((PunchKind::SignOut, stamps[stamps.len() - 1]));
        }

        let mut resolved: [Option<NaiveDateTime>; 2] = [
            index.get(&(employee_id, day, PunchKind::SignIn)).map(|&(_, ts)| ts),
            index.get(&(employee_id, day, PunchKind::SignOut)).map(|&(_, ts)| ts),
        ];

        for (kind, candidate) in candidates {
            let planned = PlannedEntry {
                employee_id,
                work_day: day,
                kind,
                timestamp: candidate,
            };
            let slot = match kind {
                PunchKind::SignIn => 0,
                PunchKind::SignOut => 1,
            };
            match index.get(&(employee_id, day, kind)) {
                None => {
                    resolved[slot] = Some(candidate);
                    plan.inserts.push(planned);
                }
                Some(&(id, stored)) => {
                    let wins = match kind {
                        PunchKind::SignIn => candidate < stored,
                        PunchKind::SignOut => candidate > stored,
                    };
                    if wins {
                        resolved[slot] = Some(candidate);
                        plan.updates.push((id, planned));
                    } else {
                        plan.duplicates += 1;
                    }
                }
            }
        }

        plan.pairs.push(PreviewPair {
            employee_id,
            work_day: day,
            sign_in: resolved[0],
            sign_out: resolved[1],
        });
    }

    plan
}

/// Runs the read + plan path for a dry run. Non-locking reads; performs
/// no writes.
async fn plan_against_store(
    pool: &MySqlPool,
    batch: &PunchBatch,
    policy: &PayrollPolicyConfig,
) -> Result<MergePlan, EngineError> {
    let Some((lo, hi)) = punch_range(&batch.punches, policy) else {
        return Ok(MergePlan {
            total_records: 0,
            ..Default::default()
        });
    };

    let mark = store::latest_log_timestamp(pool).await?;
    let subjects = store::subject_map(pool).await?;
    let existing = store::log_entries_between(pool, lo, hi).await?;

    Ok(plan_merge(&batch.punches, &subjects, &existing, mark, policy))
}

/// Timestamp window covering every work day the batch can touch.
fn punch_range(
    punches: &[RawPunch],
    policy: &PayrollPolicyConfig,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let min = punches.iter().map(|p| p.timestamp).min()?;
    let max = punches.iter().map(|p| p.timestamp).max()?;
    let cutoff = policy.workday_cutoff_hour;
    let (lo, _) = work_day_window(work_day(min, cutoff), cutoff);
    let (_, hi) = work_day_window(work_day(max, cutoff), cutoff);
    Some((lo, hi))
}

/// Merges a punch batch into the canonical attendance log.
///
/// The whole batch commits inside one transaction: a storage failure
/// mid-batch rolls everything back, so downstream calculations never see
/// a half-merged log. The reads feeding the plan run inside that same
/// transaction, with the window fetch taking range locks, so two
/// overlapping imports are serialized at the storage layer instead of
/// both inserting the same (employee, work day, kind) entry.
pub async fn import_punches(
    pool: &MySqlPool,
    batch: PunchBatch,
    policy: &PayrollPolicyConfig,
) -> Result<ImportSummary, EngineError> {
    let Some((lo, hi)) = punch_range(&batch.punches, policy) else {
        let empty = MergePlan {
            total_records: 0,
            ..Default::default()
        };
        return Ok(empty.into_summary(batch.errors));
    };

    let mut tx = pool.begin().await?;
    let mark = store::latest_log_timestamp(&mut *tx).await?;
    let subjects = store::subject_map(&mut *tx).await?;
    let existing = store::log_entries_between_locked(&mut *tx, lo, hi).await?;
    let plan = plan_merge(&batch.punches, &subjects, &existing, mark, policy);
    for entry in &plan.inserts {
        sqlx::query(
            r#"
            INSERT INTO attendance_log (employee_id, timestamp, kind)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(entry.employee_id)
        .bind(entry.timestamp)
        .bind(entry.kind)
        .execute(&mut *tx)
        .await?;
    }
    for (id, entry) in &plan.updates {
        sqlx::query(
            r#"
            UPDATE attendance_log
            SET timestamp = ?
            WHERE id = ?
            "#,
        )
        .bind(entry.timestamp)
        .bind(*id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    if !plan.unmapped.is_empty() {
        warn!(
            unmapped = plan.unmapped.len(),
            "punch batch contained subject ids with no employee mapping"
        );
    }
    let summary = plan.into_summary(batch.errors);
    info!(
        total = summary.total_records,
        imported = summary.imported,
        updated = summary.updated,
        duplicates = summary.duplicates,
        skipped_old = summary.skipped_old,
        work_days = summary.work_days_processed,
        "punch import committed"
    );
    Ok(summary)
}

/// Dry run: full grouping and candidate resolution, zero writes. Returns
/// the summary the real import would produce plus a bounded sample of the
/// resulting sign-in/sign-out pairs, newest work days first.
pub async fn preview_import(
    pool: &MySqlPool,
    batch: PunchBatch,
    policy: &PayrollPolicyConfig,
) -> Result<ImportPreview, EngineError> {
    let mut plan = plan_against_store(pool, &batch, policy).await?;

    plan.pairs.sort_by(|a, b| b.work_day.cmp(&a.work_day));
    plan.pairs.truncate(policy.preview_sample_size);
    let sample = std::mem::take(&mut plan.pairs);

    Ok(ImportPreview {
        summary: plan.into_summary(batch.errors),
        sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn punch(subject: &str, s: &str) -> RawPunch {
        RawPunch {
            subject_id: subject.to_string(),
            timestamp: ts(s),
        }
    }

    fn entry(id: u64, employee_id: u64, kind: PunchKind, s: &str) -> AttendanceLogEntry {
        AttendanceLogEntry {
            id,
            employee_id,
            timestamp: ts(s),
            kind,
        }
    }

    fn subjects() -> HashMap<String, u64> {
        HashMap::from([("EMP-001".to_string(), 1), ("EMP-002".to_string(), 2)])
    }

    fn policy() -> PayrollPolicyConfig {
        PayrollPolicyConfig::default()
    }

    #[test]
    fn fresh_batch_inserts_earliest_in_latest_out() {
        let punches = vec![
            punch("EMP-001", "2026-03-10 09:05:00"),
            punch("EMP-001", "2026-03-10 13:00:00"),
            punch("EMP-001", "2026-03-10 18:20:00"),
        ];
        let plan = plan_merge(&punches, &subjects(), &[], None, &policy());

        assert_eq!(plan.inserts.len(), 2);
        assert_eq!(plan.updates.len(), 0);
        let sign_in = &plan.inserts[0];
        assert_eq!(sign_in.kind, PunchKind::SignIn);
        assert_eq!(sign_in.timestamp, ts("2026-03-10 09:05:00"));
        let sign_out = &plan.inserts[1];
        assert_eq!(sign_out.kind, PunchKind::SignOut);
        assert_eq!(sign_out.timestamp, ts("2026-03-10 18:20:00"));
        assert_eq!(plan.work_days.len(), 1);
    }

    #[test]
    fn lone_punch_produces_no_sign_out() {
        let punches = vec![punch("EMP-001", "2026-03-10 09:05:00")];
        let plan = plan_merge(&punches, &subjects(), &[], None, &policy());

        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].kind, PunchKind::SignIn);
    }

    #[test]
    fn reimport_of_same_batch_is_all_duplicates() {
        let punches = vec![
            punch("EMP-001", "2026-03-10 09:05:00"),
            punch("EMP-001", "2026-03-10 18:20:00"),
        ];
        let existing = vec![
            entry(10, 1, PunchKind::SignIn, "2026-03-10 09:05:00"),
            entry(11, 1, PunchKind::SignOut, "2026-03-10 18:20:00"),
        ];
        let plan = plan_merge(&punches, &subjects(), &existing, None, &policy());

        assert_eq!(plan.inserts.len(), 0);
        assert_eq!(plan.updates.len(), 0);
        assert_eq!(plan.duplicates, 2);
    }

    #[test]
    fn earlier_sign_in_candidate_wins() {
        let punches = vec![punch("EMP-001", "2026-03-10 08:55:00")];
        let existing = vec![entry(10, 1, PunchKind::SignIn, "2026-03-10 09:10:00")];
        let plan = plan_merge(&punches, &subjects(), &existing, None, &policy());

        assert_eq!(plan.updates.len(), 1);
        let (id, planned) = &plan.updates[0];
        assert_eq!(*id, 10);
        assert_eq!(planned.timestamp, ts("2026-03-10 08:55:00"));
    }

    #[test]
    fn later_sign_in_candidate_is_a_duplicate() {
        let punches = vec![punch("EMP-001", "2026-03-10 09:20:00")];
        let existing = vec![entry(10, 1, PunchKind::SignIn, "2026-03-10 09:10:00")];
        let plan = plan_merge(&punches, &subjects(), &existing, None, &policy());

        assert_eq!(plan.inserts.len(), 0);
        assert_eq!(plan.updates.len(), 0);
        assert_eq!(plan.duplicates, 1);
    }

    #[test]
    fn later_sign_out_candidate_wins() {
        let punches = vec![
            punch("EMP-001", "2026-03-10 09:30:00"),
            punch("EMP-001", "2026-03-10 19:00:00"),
        ];
        let existing = vec![
            entry(10, 1, PunchKind::SignIn, "2026-03-10 09:00:00"),
            entry(11, 1, PunchKind::SignOut, "2026-03-10 17:00:00"),
        ];
        let plan = plan_merge(&punches, &subjects(), &existing, None, &policy());

        // 09:30 loses to the stored 09:00 sign-in; 19:00 beats 17:00.
        assert_eq!(plan.duplicates, 1);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].0, 11);
        assert_eq!(plan.updates[0].1.timestamp, ts("2026-03-10 19:00:00"));
    }

    #[test]
    fn high_water_mark_skips_old_punches_for_any_employee() {
        let mark = Some(ts("2026-03-10 18:00:00"));
        let punches = vec![
            punch("EMP-001", "2026-03-10 09:00:00"),
            punch("EMP-002", "2026-03-10 18:00:00"),
            punch("EMP-002", "2026-03-10 18:00:01"),
        ];
        let plan = plan_merge(&punches, &subjects(), &[], mark, &policy());

        assert_eq!(plan.skipped_old, 2);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].employee_id, 2);
    }

    #[test]
    fn unmapped_subjects_are_reported_once_with_counts() {
        let punches = vec![
            punch("GHOST-9", "2026-03-10 09:00:00"),
            punch("GHOST-9", "2026-03-10 18:00:00"),
            punch("EMP-001", "2026-03-10 09:00:00"),
        ];
        let plan = plan_merge(&punches, &subjects(), &[], None, &policy());

        assert_eq!(plan.unmapped.len(), 1);
        assert_eq!(plan.unmapped["GHOST-9"], 2);
        assert_eq!(plan.inserts.len(), 1);

        let summary = plan.into_summary(Vec::new());
        assert_eq!(summary.unmapped_subject_ids.len(), 1);
        assert_eq!(summary.unmapped_subject_ids[0].subject_id, "GHOST-9");
        assert_eq!(summary.unmapped_subject_ids[0].count, 2);
    }

    #[test]
    fn overnight_punches_group_on_one_work_day() {
        let punches = vec![
            punch("EMP-001", "2026-03-10 22:00:00"),
            punch("EMP-001", "2026-03-11 03:30:00"),
        ];
        let plan = plan_merge(&punches, &subjects(), &[], None, &policy());

        assert_eq!(plan.work_days.len(), 1);
        assert!(plan.work_days.contains(&(1, d("2026-03-10"))));
        assert_eq!(plan.inserts.len(), 2);
        assert_eq!(plan.inserts[1].timestamp, ts("2026-03-11 03:30:00"));
    }

    #[test]
    fn pairs_reflect_post_merge_state() {
        let punches = vec![punch("EMP-001", "2026-03-10 08:55:00")];
        let existing = vec![
            entry(10, 1, PunchKind::SignIn, "2026-03-10 09:10:00"),
            entry(11, 1, PunchKind::SignOut, "2026-03-10 18:00:00"),
        ];
        let plan = plan_merge(&punches, &subjects(), &existing, None, &policy());

        assert_eq!(plan.pairs.len(), 1);
        let pair = &plan.pairs[0];
        assert_eq!(pair.sign_in, Some(ts("2026-03-10 08:55:00")));
        assert_eq!(pair.sign_out, Some(ts("2026-03-10 18:00:00")));
    }
}
