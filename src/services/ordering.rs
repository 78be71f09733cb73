//! Ordering engine.
//!
//! Pure transforms over a snapshot of links and categories. Every function
//! takes borrowed input and returns a new collection; callers swap the
//! result in as a whole.
//!
//! Presentation order: pinned links first, ranked by `pinned_order`; then
//! non-pinned links ranked by `order`, falling back to `created_at`.
//! Pinned ranks are kept as a `0..n` permutation by every transform here.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::types::errors::StoreError;
use crate::types::link::{Category, Link, ReorderScope, COMMON_CATEGORY_ID};

/// Standard comparator for presentation order.
pub fn compare_links(a: &Link, b: &Link) -> Ordering {
    match (a.pinned, b.pinned) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.pinned_order.unwrap_or(0).cmp(&b.pinned_order.unwrap_or(0)),
        (false, false) => a.sort_key().cmp(&b.sort_key()),
    }
}

/// Stable sort by [`compare_links`].
pub fn sort_links(links: &mut [Link]) {
    links.sort_by(compare_links);
}

/// Removes the element at `from` and reinserts it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Rank key of a link inside `scope`.
fn scope_rank(scope: &ReorderScope, link: &Link) -> i64 {
    match scope {
        ReorderScope::Pinned => link.pinned_order.unwrap_or(i64::MAX),
        _ => link.sort_key(),
    }
}

/// Moves `active_id` to the slot of `over_id` inside `scope` and re-ranks the scope 0..n.
///
/// Returns the input unchanged when the ids are equal or either is not in scope.
pub fn reorder(links: &[Link], active_id: &str, over_id: &str, scope: &ReorderScope) -> Vec<Link> {
    let mut next = links.to_vec();
    if active_id == over_id {
        return next;
    }

    let mut scoped: Vec<usize> = (0..next.len()).filter(|&i| scope.contains(&next[i])).collect();
    scoped.sort_by_key(|&i| scope_rank(scope, &next[i]));

    let active_pos = scoped.iter().position(|&i| next[i].id == active_id);
    let over_pos = scoped.iter().position(|&i| next[i].id == over_id);
    let (Some(from), Some(to)) = (active_pos, over_pos) else {
        return next;
    };

    array_move(&mut scoped, from, to);
    for (rank, &index) in scoped.iter().enumerate() {
        let rank = Some(rank as i64);
        match scope {
            ReorderScope::Pinned => next[index].pinned_order = rank,
            _ => next[index].order = rank,
        }
    }

    sort_links(&mut next);
    next
}

/// Re-ranks pinned links to `0..n`, keeping their current relative order.
///
/// Pinned links without a rank go last, in array order.
pub fn compact_pinned_orders(links: &mut [Link]) {
    let mut pinned: Vec<usize> = (0..links.len()).filter(|&i| links[i].pinned).collect();
    pinned.sort_by_key(|&i| links[i].pinned_order.unwrap_or(i64::MAX));
    for (rank, index) in pinned.into_iter().enumerate() {
        links[index].pinned_order = Some(rank as i64);
    }
    for link in links.iter_mut().filter(|l| !l.pinned) {
        link.pinned_order = None;
    }
}

/// Flips `pinned` on the link with `id`.
///
/// Pinning appends to the end of the pinned ranks. Unpinning clears the
/// rank and closes the gap it leaves. Returns `None` if `id` is unknown.
pub fn toggle_pin(links: &[Link], id: &str) -> Option<Vec<Link>> {
    let target = links.iter().position(|l| l.id == id)?;
    let pinned_count = links.iter().filter(|l| l.pinned).count() as i64;

    let mut next = links.to_vec();
    let link = &mut next[target];
    link.pinned = !link.pinned;
    link.pinned_order = if link.pinned { Some(pinned_count) } else { None };

    compact_pinned_orders(&mut next);
    sort_links(&mut next);
    Some(next)
}

/// Next free `order` among non-pinned links of `category_id` (`max + 1`, or 0).
pub fn next_order(links: &[Link], category_id: &str) -> i64 {
    links
        .iter()
        .filter(|l| !l.pinned && l.category_id == category_id)
        .map(|l| l.order.unwrap_or(0))
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Adds a freshly created link.
///
/// Its `order` becomes the next free rank of its category. A pinned link
/// is placed right after the pinned block with the next pinned rank; an
/// unpinned one is appended and the list re-sorted.
pub fn insert(links: &[Link], mut new_link: Link) -> Vec<Link> {
    let mut next = links.to_vec();
    new_link.order = Some(next_order(&next, &new_link.category_id));

    if new_link.pinned {
        new_link.pinned_order = Some(next.iter().filter(|l| l.pinned).count() as i64);
        let slot = next.iter().position(|l| !l.pinned).unwrap_or(next.len());
        next.insert(slot, new_link);
    } else {
        new_link.pinned_order = None;
        next.push(new_link);
        sort_links(&mut next);
    }
    next
}

/// Removes the link with `id`, closing any gap in the pinned ranks.
pub fn remove(links: &[Link], id: &str) -> Option<Vec<Link>> {
    let target = links.iter().position(|l| l.id == id)?;
    let mut next = links.to_vec();
    let removed = next.remove(target);
    if removed.pinned {
        compact_pinned_orders(&mut next);
    }
    Some(next)
}

/// Puts exactly one `common` category at index 0.
///
/// Returns the fixed list and whether anything had to change.
pub fn ensure_common_first(categories: &[Category]) -> (Vec<Category>, bool) {
    let common = categories
        .iter()
        .find(|c| c.id == COMMON_CATEGORY_ID)
        .cloned()
        .unwrap_or_else(Category::common);

    let mut fixed = Vec::with_capacity(categories.len() + 1);
    fixed.push(common);
    fixed.extend(categories.iter().filter(|c| c.id != COMMON_CATEGORY_ID).cloned());

    let changed = fixed != categories;
    (fixed, changed)
}

/// Points every link whose category is not in `categories` at `common`.
///
/// Returns how many links were reassigned.
pub fn reassign_orphans(links: &mut [Link], categories: &[Category]) -> usize {
    let known: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let mut reassigned = 0;
    for link in links.iter_mut() {
        if !known.contains(link.category_id.as_str()) {
            link.category_id = COMMON_CATEGORY_ID.to_string();
            reassigned += 1;
        }
    }
    reassigned
}

/// Deletes category `deleted_id`, moving its links to `common`.
pub fn cascade_category_delete(
    links: &[Link],
    categories: &[Category],
    deleted_id: &str,
) -> Result<(Vec<Link>, Vec<Category>), StoreError> {
    if deleted_id == COMMON_CATEGORY_ID {
        return Err(StoreError::ForbiddenOperation(
            "the common category cannot be deleted".to_string(),
        ));
    }
    if !categories.iter().any(|c| c.id == deleted_id) {
        return Err(StoreError::CategoryNotFound(deleted_id.to_string()));
    }

    let remaining: Vec<Category> = categories.iter().filter(|c| c.id != deleted_id).cloned().collect();
    let (next_categories, _) = ensure_common_first(&remaining);

    let next_links = links
        .iter()
        .map(|l| {
            let mut link = l.clone();
            if link.category_id == deleted_id {
                link.category_id = COMMON_CATEGORY_ID.to_string();
            }
            link
        })
        .collect();

    Ok((next_links, next_categories))
}

/// Result of merging imported data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub links: Vec<Link>,
    pub categories: Vec<Category>,
    pub categories_added: usize,
    pub links_added: usize,
    /// Imported links whose id clashed and was replaced.
    pub ids_reassigned: usize,
}

/// Merges imported links and categories into the existing set.
///
/// An incoming category is appended unless one with the same id or name
/// already exists; links of a name-matched category follow the existing
/// one. Links are appended without URL dedup. Clashing link ids are
/// replaced with ids from `fresh_id`, imported pinned links rank after the
/// existing pinned ones, and unresolvable categories fall back to `common`.
pub fn merge(
    existing_links: &[Link],
    existing_categories: &[Category],
    incoming_links: &[Link],
    incoming_categories: &[Category],
    mut fresh_id: impl FnMut() -> String,
) -> MergeOutcome {
    let (mut categories, _) = ensure_common_first(existing_categories);
    let mut category_alias: HashMap<String, String> = HashMap::new();
    let mut categories_added = 0;

    for incoming in incoming_categories {
        if categories.iter().any(|c| c.id == incoming.id) {
            continue;
        }
        if let Some(same_name) = categories.iter().find(|c| c.name == incoming.name) {
            category_alias.insert(incoming.id.clone(), same_name.id.clone());
            continue;
        }
        categories.push(incoming.clone());
        categories_added += 1;
    }

    let mut links = existing_links.to_vec();
    compact_pinned_orders(&mut links);
    let mut taken: HashSet<String> = links.iter().map(|l| l.id.clone()).collect();
    let pinned_offset = links.iter().filter(|l| l.pinned).count();
    let first_incoming = links.len();
    let mut ids_reassigned = 0;

    for incoming in incoming_links {
        let mut link = incoming.clone();
        if taken.contains(&link.id) || link.id.is_empty() {
            link.id = fresh_id();
            ids_reassigned += 1;
        }
        taken.insert(link.id.clone());

        if let Some(target) = category_alias.get(&link.category_id) {
            link.category_id = target.clone();
        }
        links.push(link);
    }

    // Imported pins keep their own relative order behind the existing block.
    let mut incoming_pins: Vec<usize> = (first_incoming..links.len()).filter(|&i| links[i].pinned).collect();
    incoming_pins.sort_by_key(|&i| links[i].pinned_order.unwrap_or(i64::MAX));
    for (rank, index) in incoming_pins.into_iter().enumerate() {
        links[index].pinned_order = Some((pinned_offset + rank) as i64);
    }

    reassign_orphans(&mut links, &categories);
    compact_pinned_orders(&mut links);
    sort_links(&mut links);

    MergeOutcome {
        links,
        categories,
        categories_added,
        links_added: incoming_links.len(),
        ids_reassigned,
    }
}
