//! Change records for patching a displayed recipe list.
//!
//! Positions follow the batch-update convention of list widgets: `Delete`,
//! `Update` and the source of a `Move` index the previous snapshot, `Insert`
//! and the destination of a `Move` index the new one.

use std::collections::{BTreeSet, HashMap};

use crate::models::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRecord {
    Insert { at: usize },
    Delete { at: usize },
    Update { at: usize },
    Move { from: usize, to: usize },
}

/// Compute the batch that turns `old` into `new`.
///
/// Both snapshots are identified by recipe id. Ids present in both whose
/// relative order changed become moves; the set of moves is minimal (every
/// item outside one longest run that kept its order). Unmoved items with
/// changed fields become updates.
pub fn diff(old: &[Recipe], new: &[Recipe]) -> Vec<ChangeRecord> {
    let old_index: HashMap<&str, usize> = old
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();
    let new_index: HashMap<&str, usize> = new
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();

    let mut deletes = Vec::new();
    // (old position, new position) for ids in both, in old order
    let mut shared = Vec::new();
    for (i, recipe) in old.iter().enumerate() {
        match new_index.get(recipe.id.as_str()) {
            Some(&j) => shared.push((i, j)),
            None => deletes.push(ChangeRecord::Delete { at: i }),
        }
    }
    deletes.reverse();

    let inserts: Vec<ChangeRecord> = new
        .iter()
        .enumerate()
        .filter(|(_, r)| !old_index.contains_key(r.id.as_str()))
        .map(|(j, _)| ChangeRecord::Insert { at: j })
        .collect();

    let targets: Vec<usize> = shared.iter().map(|&(_, j)| j).collect();
    let stable = longest_increasing_run(&targets);

    let mut moves = Vec::new();
    let mut updates = Vec::new();
    for (k, &(i, j)) in shared.iter().enumerate() {
        if stable.contains(&k) {
            if old[i] != new[j] {
                updates.push(ChangeRecord::Update { at: i });
            }
        } else {
            moves.push(ChangeRecord::Move { from: i, to: j });
        }
    }

    let mut changes = deletes;
    changes.extend(moves);
    changes.extend(inserts);
    changes.extend(updates);
    changes
}

/// Indices into `values` of one longest strictly increasing subsequence.
fn longest_increasing_run(values: &[usize]) -> BTreeSet<usize> {
    // tails[len] = index of the smallest tail of an increasing run of length len + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &v) in values.iter().enumerate() {
        let pos = tails.partition_point(|&t| values[t] < v);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut run = BTreeSet::new();
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.insert(i);
        cursor = prev[i];
    }
    run
}

/// Replay `changes` onto `displayed` so it matches `current`.
///
/// Removals go first in descending old position, then insertions in
/// ascending new position, then updates are written in place.
pub fn apply<T: Clone>(displayed: &mut Vec<T>, changes: &[ChangeRecord], current: &[T]) {
    let mut removals = Vec::new();
    let mut insertions = BTreeSet::new();
    let mut updates = Vec::new();

    for change in changes {
        match *change {
            ChangeRecord::Delete { at } => removals.push(at),
            ChangeRecord::Insert { at } => {
                insertions.insert(at);
            }
            ChangeRecord::Move { from, to } => {
                removals.push(from);
                insertions.insert(to);
            }
            ChangeRecord::Update { at } => updates.push(at),
        }
    }

    removals.sort_unstable();
    removals.dedup();
    for &at in removals.iter().rev() {
        if at < displayed.len() {
            displayed.remove(at);
        }
    }

    for &at in &insertions {
        if let Some(item) = current.get(at) {
            let at = at.min(displayed.len());
            displayed.insert(at, item.clone());
        }
    }

    for old_at in updates {
        // Position among survivors, then skip over freshly inserted slots
        let survivor_rank = old_at - removals.iter().filter(|&&r| r < old_at).count();
        let target = (0..current.len())
            .filter(|j| !insertions.contains(j))
            .nth(survivor_rank);
        if let Some(j) = target {
            if let (Some(slot), Some(item)) = (displayed.get_mut(j), current.get(j)) {
                *slot = item.clone();
            }
        }
    }
}
