//! Property-based tests for ordering invariants across random command sequences.
//!
//! After any mix of add / pin / delete / reorder / category delete / import:
//! - pinned ranks are exactly `0..n`
//! - `common` exists and is first
//! - every link points at an existing category

use proptest::prelude::*;

use linkdeck::database::MemoryStore;
use linkdeck::managers::link_store::{LinkStore, LinkStoreTrait};
use linkdeck::types::link::{Link, LinkDraft, COMMON_CATEGORY_ID};

#[derive(Debug, Clone)]
enum Op {
    Add { category: usize, pinned: bool },
    TogglePin(prop::sample::Index),
    Delete(prop::sample::Index),
    Reorder(prop::sample::Index, prop::sample::Index, bool),
    ReorderPinned(prop::sample::Index, prop::sample::Index),
    DeleteCategory(usize),
    Import { count: usize, pinned: bool },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..4, any::<bool>()).prop_map(|(category, pinned)| Op::Add { category, pinned }),
        3 => any::<prop::sample::Index>().prop_map(Op::TogglePin),
        2 => any::<prop::sample::Index>().prop_map(Op::Delete),
        3 => (any::<prop::sample::Index>(), any::<prop::sample::Index>(), any::<bool>())
            .prop_map(|(a, b, all)| Op::Reorder(a, b, all)),
        3 => (any::<prop::sample::Index>(), any::<prop::sample::Index>())
            .prop_map(|(a, b)| Op::ReorderPinned(a, b)),
        1 => (0usize..4).prop_map(Op::DeleteCategory),
        1 => (1usize..4, any::<bool>()).prop_map(|(count, pinned)| Op::Import { count, pinned }),
    ]
}

fn pick(links: &[Link], index: &prop::sample::Index) -> Option<Link> {
    if links.is_empty() {
        None
    } else {
        Some(links[index.index(links.len())].clone())
    }
}

fn apply(store: &mut LinkStore<MemoryStore>, op: &Op, step: usize) {
    let category_ids: Vec<String> = store.categories().iter().map(|c| c.id.clone()).collect();
    match op {
        Op::Add { category, pinned } => {
            let category_id = category_ids.get(*category).cloned();
            let _ = store.add_link(LinkDraft {
                url: format!("site{}.example", step),
                title: format!("Site {}", step),
                category_id,
                pinned: *pinned,
                ..Default::default()
            });
        }
        Op::TogglePin(index) => {
            if let Some(link) = pick(store.links(), index) {
                store.toggle_pin(&link.id).unwrap();
            }
        }
        Op::Delete(index) => {
            if let Some(link) = pick(store.links(), index) {
                store.delete_link(&link.id).unwrap();
            }
        }
        Op::Reorder(a, b, all) => {
            let (Some(active), Some(over)) = (pick(store.links(), a), pick(store.links(), b)) else {
                return;
            };
            let scope = if *all { "all".to_string() } else { active.category_id.clone() };
            store.reorder_links(&active.id, &over.id, &scope).unwrap();
        }
        Op::ReorderPinned(a, b) => {
            let pinned = store.pinned_links();
            if let (Some(active), Some(over)) = (pick(&pinned, a), pick(&pinned, b)) {
                store.reorder_pinned_links(&active.id, &over.id).unwrap();
            }
        }
        Op::DeleteCategory(index) => {
            if let Some(id) = category_ids.get(*index) {
                let _ = store.delete_category(id);
            }
        }
        Op::Import { count, pinned } => {
            let links = (0..*count)
                .map(|i| Link {
                    id: format!("import-{}", i),
                    url: format!("https://import{}.example", i),
                    title: format!("Imported {}", i),
                    description: None,
                    category_id: "somewhere-else".to_string(),
                    icon: None,
                    pinned: *pinned,
                    order: Some(i as i64),
                    pinned_order: if *pinned { Some(i as i64) } else { None },
                    created_at: 0,
                })
                .collect();
            store.import_data(links, Vec::new()).unwrap();
        }
    }
}

fn assert_invariants(store: &LinkStore<MemoryStore>) -> Result<(), TestCaseError> {
    let mut ranks: Vec<i64> = store
        .links()
        .iter()
        .filter(|l| l.pinned)
        .map(|l| l.pinned_order.unwrap_or(-1))
        .collect();
    ranks.sort_unstable();
    let expected: Vec<i64> = (0..ranks.len() as i64).collect();
    prop_assert_eq!(ranks, expected, "pinned ranks must be a 0..n permutation");

    prop_assert!(store
        .links()
        .iter()
        .filter(|l| !l.pinned)
        .all(|l| l.pinned_order.is_none()));

    prop_assert_eq!(store.categories()[0].id.as_str(), COMMON_CATEGORY_ID);
    for link in store.links() {
        prop_assert!(
            store.categories().iter().any(|c| c.id == link.category_id),
            "link {} points at missing category {}",
            link.id,
            link.category_id
        );
    }

    let pinned_prefix = store.links().iter().take_while(|l| l.pinned).count();
    prop_assert!(
        store.links()[pinned_prefix..].iter().all(|l| !l.pinned),
        "pinned links come first"
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_after_any_command_sequence(ops in proptest::collection::vec(arb_op(), 1..40)) {
        let mut store = LinkStore::open(MemoryStore::new());
        assert_invariants(&store)?;
        for (step, op) in ops.iter().enumerate() {
            apply(&mut store, op, step);
            assert_invariants(&store)?;
        }
    }

    #[test]
    fn reorder_pinned_swaps_adjacent_ranks(extra in 0usize..5) {
        let mut store = LinkStore::open(MemoryStore::new());
        for i in 0..extra + 1 {
            store
                .add_link(LinkDraft {
                    url: format!("pin{}.example", i),
                    title: format!("Pin {}", i),
                    pinned: true,
                    ..Default::default()
                })
                .unwrap();
        }
        let pinned = store.pinned_links();
        let (a, b) = (pinned[0].id.clone(), pinned[1].id.clone());

        store.reorder_pinned_links(&b, &a).unwrap();
        let after = store.pinned_links();
        prop_assert_eq!(&after[0].id, &b);
        prop_assert_eq!(&after[1].id, &a);
        assert_invariants(&store)?;
    }
}
