//! Resolution engine.
//!
//! Merges a weekday's default slots with the overrides for one date. Slot
//! indices are 1-based positions in the start-time ordering of the defaults;
//! an override may point past the last default to add an ad-hoc slot.

use std::collections::BTreeMap;

use super::model::{DailyOverride, DefaultSlot, ResolvedSlot, SlotStatus};

/// Merges one override onto its base slot.
///
/// Cancellations only annotate: course and venue come from the override only
/// when the base has none. Scheduled and replaced overrides always set the
/// course and set the venue when one is given. Times are replaced only when
/// the override carries them.
pub fn apply_override(base: Option<&ResolvedSlot>, over: &DailyOverride) -> ResolvedSlot {
    let mut resolved = base
        .cloned()
        .unwrap_or_else(|| ResolvedSlot::empty(over.slot_index));
    resolved.slot_index = over.slot_index;
    resolved.status = over.status;

    if let Some(start) = over.start_time {
        resolved.start_time = Some(start);
    }
    if let Some(end) = over.end_time {
        resolved.end_time = Some(end);
    }

    if over.status == SlotStatus::Cancelled {
        if resolved.course_code.is_empty() {
            if let Some(course) = &over.course_code {
                resolved.course_code = course.clone();
            }
        }
        if resolved.venue.is_empty() {
            if let Some(venue) = &over.venue {
                resolved.venue = venue.clone();
            }
        }
        return resolved;
    }

    resolved.course_code = over.course_code.clone().unwrap_or_default();
    if let Some(venue) = over.venue.as_deref().filter(|v| !v.is_empty()) {
        resolved.venue = venue.to_string();
    }
    resolved
}

/// Default slots for one weekday in slot-index order.
fn base_slots(defaults: &[DefaultSlot]) -> Vec<ResolvedSlot> {
    let mut ordered: Vec<&DefaultSlot> = defaults.iter().collect();
    ordered.sort_by_key(|slot| slot.start_time);
    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| ResolvedSlot::from_default(idx as i32 + 1, slot))
        .collect()
}

/// Resolves a whole day.
///
/// `defaults` are the class's default slots for the date's weekday and
/// `overrides` the class's overrides for the date. The result is ordered by
/// slot index and contains only indices that have a default or an override.
pub fn resolve_day(defaults: &[DefaultSlot], overrides: &[DailyOverride]) -> Vec<ResolvedSlot> {
    let mut by_index: BTreeMap<i32, ResolvedSlot> = base_slots(defaults)
        .into_iter()
        .map(|slot| (slot.slot_index, slot))
        .collect();

    for over in overrides {
        let resolved = apply_override(by_index.get(&over.slot_index), over);
        by_index.insert(over.slot_index, resolved);
    }

    by_index.range(1..).map(|(_, slot)| slot.clone()).collect()
}

/// Resolves a single index against its default, for late-update notices.
pub fn resolve_single_slot(
    defaults: &[DefaultSlot],
    slot_index: i32,
    over: &DailyOverride,
) -> ResolvedSlot {
    let base = usize::try_from(slot_index)
        .ok()
        .and_then(|idx| idx.checked_sub(1))
        .and_then(|idx| base_slots(defaults).into_iter().nth(idx));

    let mut resolved = apply_override(base.as_ref(), over);
    resolved.slot_index = slot_index;
    resolved
}
