//! Roster reconciliation.
//!
//! Merges a provider's complete employee roster into the organization's
//! local records. Local `enabled` preferences survive every sync; an
//! employee that disappears from the roster is soft-removed and forced
//! off; a reappearing employee comes back disabled. The whole merge runs
//! in one transaction under a per-organization advisory lock, so
//! concurrent sync requests serialize and a mid-run failure leaves no
//! partial state.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::Employee;
use crate::providers::RosterEmployee;

/// An employee touched by a sync run, with the per-run flags. The flags
/// are recomputed on every run and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct SyncedEmployee {
    #[serde(flatten)]
    pub employee: Employee,
    pub was_just_added: bool,
    pub was_just_removed: bool,
}

/// Everything touched by one sync run: every roster entry in roster
/// order, then the records this run removed. Records removed by an
/// earlier run and still absent are left alone and not reported.
#[derive(Debug, Serialize)]
pub struct SyncOutcome {
    pub employees: Vec<SyncedEmployee>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub struct SyncPlan {
    pub entries: Vec<PlannedEntry>,
    /// Provider ids of local records to soft-remove.
    pub removals: Vec<i64>,
}

#[derive(Debug, PartialEq)]
pub struct PlannedEntry {
    pub provider_employee_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub op: PlannedOp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlannedOp {
    /// Provider id never seen before: insert with `enabled = false`.
    Create,
    /// Known record: refresh cached fields, clear removal, keep `enabled`.
    Refresh { reappeared: bool },
}

/// Classify a roster snapshot against the local records. Pure; the only
/// state it reads is what it is given. Duplicate provider ids in the
/// roster are collapsed to their first occurrence so the unique
/// (organization, provider id) constraint can never be violated.
pub fn plan(roster: &[RosterEmployee], local: &[Employee]) -> SyncPlan {
    let mut seen: HashSet<i64> = HashSet::with_capacity(roster.len());
    let mut entries = Vec::with_capacity(roster.len());

    for remote in roster {
        if !seen.insert(remote.id) {
            tracing::warn!(provider_employee_id = remote.id, "duplicate roster entry skipped");
            continue;
        }

        let op = match local.iter().find(|e| e.provider_employee_id == remote.id) {
            Some(existing) => PlannedOp::Refresh {
                reappeared: existing.removed,
            },
            None => PlannedOp::Create,
        };

        entries.push(PlannedEntry {
            provider_employee_id: remote.id,
            name: remote.name.clone(),
            email: remote.email.clone(),
            op,
        });
    }

    let removals = local
        .iter()
        .filter(|e| !e.removed && !seen.contains(&e.provider_employee_id))
        .map(|e| e.provider_employee_id)
        .collect();

    SyncPlan { entries, removals }
}

/// Apply a roster snapshot to the organization's records.
///
/// The roster has already been fetched; a provider failure aborts before
/// this point with no local writes. Serialization across concurrent runs
/// comes from an advisory lock on the organization id, held for the
/// transaction.
pub async fn run(
    pool: &PgPool,
    organization_id: Uuid,
    roster: &[RosterEmployee],
) -> Result<SyncOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;

    let local = db::employees::list_for_sync(&mut *tx, organization_id).await?;
    let plan = plan(roster, &local);

    let mut employees = Vec::with_capacity(plan.entries.len() + plan.removals.len());

    for entry in &plan.entries {
        let (employee, was_just_added) = match entry.op {
            PlannedOp::Create => {
                let created = db::employees::insert_from_roster(
                    &mut *tx,
                    organization_id,
                    entry.provider_employee_id,
                    &entry.name,
                    entry.email.as_deref(),
                )
                .await?;
                (created, true)
            }
            PlannedOp::Refresh { reappeared } => {
                let updated = db::employees::refresh_from_roster(
                    &mut *tx,
                    organization_id,
                    entry.provider_employee_id,
                    &entry.name,
                    entry.email.as_deref(),
                )
                .await?;
                (updated, reappeared)
            }
        };

        employees.push(SyncedEmployee {
            employee,
            was_just_added,
            was_just_removed: false,
        });
    }

    for provider_employee_id in &plan.removals {
        let removed =
            db::employees::mark_removed(&mut *tx, organization_id, *provider_employee_id).await?;
        employees.push(SyncedEmployee {
            employee: removed,
            was_just_added: false,
            was_just_removed: true,
        });
    }

    tx.commit().await?;

    let added = employees.iter().filter(|e| e.was_just_added).count();
    let removed = employees.iter().filter(|e| e.was_just_removed).count();
    tracing::info!(
        organization_id = %organization_id,
        roster_size = roster.len(),
        added,
        removed,
        "roster sync applied"
    );

    Ok(SyncOutcome {
        employees,
        synced_at: Utc::now(),
    })
}
