//! Encoding of [`CycleSnapshot`] onto the fixed store keys.
//!
//! Reading never fails. Every unreadable key degrades to the registry
//! default for that field and logs a warning. The step list is restored
//! all-or-nothing: unless every registry step is present and the statuses
//! have a shape linear gating can produce, all steps start over as pending,
//! and the checkboxes and verification flag that went with them are dropped.
//!
//! A `running` status is kept only while it is younger than
//! [`STALE_RUN_AFTER`]; it may belong to another session on the same store.
//! Older ones were interrupted and come back as `error`.

use std::collections::BTreeSet;

use jiff::Timestamp;
use log::{info, warn};

use super::KeyValueStore;
use crate::{
    error::Result,
    gating,
    models::{
        initial_metadata, CycleSnapshot, StepId, StepState, StepStatus, ViewMode, STALE_RUN_AFTER,
    },
    registry::StepRegistry,
};

/// Fixed keys the snapshot is stored under.
pub mod keys {
    pub const STEPS: &str = "payroll_steps";
    pub const CHECKED: &str = "checked_steps";
    pub const SELECTED_MONTH: &str = "selected_month";
    pub const VERIFICATION_FLAG: &str = "verification_flag";
    pub const VIEW_MODE: &str = "view_mode";
    pub const VERIFICATION_HANDOFF: &str = "verification_handoff";
}

/// Writes every snapshot field, stopping at the first failing key.
pub fn write_snapshot(store: &mut dyn KeyValueStore, snapshot: &CycleSnapshot) -> Result<()> {
    let steps = serde_json::to_string(&snapshot.steps)?;
    let checked = serde_json::to_string(&snapshot.checked)?;

    store.set(keys::STEPS, &steps)?;
    store.set(keys::CHECKED, &checked)?;
    store.set(keys::SELECTED_MONTH, &snapshot.selected_month)?;
    store.set(
        keys::VERIFICATION_FLAG,
        if snapshot.verification_flag { "true" } else { "false" },
    )?;
    store.set(keys::VIEW_MODE, snapshot.view_mode.as_str())?;
    Ok(())
}

/// Restores a snapshot for `registry`, degrading field by field.
pub fn read_snapshot(
    store: &dyn KeyValueStore,
    registry: &StepRegistry,
    default_month: &str,
) -> CycleSnapshot {
    let restored = read_key(store, keys::STEPS)
        .map(|raw| decode_steps(&raw, registry, Timestamp::now()));
    let steps_restored = !matches!(restored, Some(None));
    let mut steps = restored
        .flatten()
        .unwrap_or_else(|| registry.initial_states());

    let checked = match read_key(store, keys::CHECKED) {
        Some(_) if !steps_restored => {
            warn!("Clearing checkboxes stored with an unusable step list");
            BTreeSet::new()
        }
        Some(raw) => decode_checked(&raw, registry).unwrap_or_default(),
        None => BTreeSet::new(),
    };
    for state in &mut steps {
        state.checked = checked.contains(&state.id);
    }

    let selected_month = read_key(store, keys::SELECTED_MONTH)
        .map(|raw| raw.trim().to_string())
        .filter(|month| !month.is_empty())
        .unwrap_or_else(|| default_month.to_string());

    let verification_flag = read_key(store, keys::VERIFICATION_FLAG)
        .and_then(|raw| match raw.trim() {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                warn!("Ignoring unreadable verification flag '{other}'");
                None
            }
        })
        .unwrap_or(false)
        && steps_restored;

    let view_mode = read_key(store, keys::VIEW_MODE)
        .and_then(|raw| match raw.parse::<ViewMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!("Ignoring stored view mode: {e}");
                None
            }
        })
        .unwrap_or_default();

    CycleSnapshot {
        steps,
        checked,
        selected_month,
        view_mode,
        verification_flag,
    }
}

fn read_key(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read '{key}' from the cycle store, using defaults: {e}");
            None
        }
    }
}

fn decode_steps(raw: &str, registry: &StepRegistry, now: Timestamp) -> Option<Vec<StepState>> {
    let persisted: Vec<StepState> = match serde_json::from_str(raw) {
        Ok(steps) => steps,
        Err(e) => {
            warn!("Stored step list is malformed, starting from pending: {e}");
            return None;
        }
    };

    if persisted.len() != registry.len() {
        warn!(
            "Stored step list has {} entries but the cycle has {}, starting from pending",
            persisted.len(),
            registry.len()
        );
        return None;
    }

    let mut restored = Vec::with_capacity(registry.len());
    for id in registry.ids() {
        let Some(state) = persisted.iter().find(|s| &s.id == id) else {
            warn!("Stored step list is missing '{id}', starting from pending");
            return None;
        };
        let mut state = state.clone();
        if state.is_live_run(now) {
            info!("Step '{id}' is running in another session");
        } else if state.status == StepStatus::Running {
            warn!("Step '{id}' was interrupted while running; marking it as failed");
            state.status = StepStatus::Error;
            state.started_at = None;
        }
        if state.metadata.is_empty() {
            state.metadata = initial_metadata();
        }
        restored.push(state);
    }

    if !gating::is_linear(&restored) {
        warn!("Stored step statuses skip ahead of the cycle order, starting from pending");
        return None;
    }

    Some(restored)
}

fn decode_checked(raw: &str, registry: &StepRegistry) -> Option<BTreeSet<StepId>> {
    let ids: Vec<StepId> = match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(e) => {
            warn!("Stored checkbox list is malformed, clearing it: {e}");
            return None;
        }
    };

    Some(
        ids.into_iter()
            .filter(|id| {
                let known = registry.index_of(id.as_str()).is_some();
                if !known {
                    warn!("Dropping checkbox for unknown step '{id}'");
                }
                known
            })
            .collect(),
    )
}
