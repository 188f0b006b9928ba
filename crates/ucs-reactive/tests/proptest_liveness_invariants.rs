//! Property-based tests for reaction liveness and fan-out.
//!
//! 1. A bound listener contributes exactly one subscription per distinct
//!    field of each reaction's dependency set.
//! 2. Dropping the listener leaves zero subscriptions on every field.
//! 3. Changing a field runs exactly the reactions that depend on it, once
//!    each, in declaration order.

use std::cell::RefCell;

use proptest::prelude::*;
use ucs_reactive::{
    DependencySet, ReactionBinder, ReactionSlot, ReactiveField, ReactiveListener, Result, bind,
};

struct ShapeListener {
    fields: Vec<ReactiveField<i32>>,
    sets: Vec<Vec<usize>>,
    calls: RefCell<Vec<usize>>,
    slot: ReactionSlot,
}

impl ReactiveListener for ShapeListener {
    fn reaction_slot(&self) -> &ReactionSlot {
        &self.slot
    }

    fn declare_reactions(&self, binder: &mut ReactionBinder<Self>) -> Result<()> {
        for (reaction, set) in self.sets.iter().enumerate() {
            let mut deps = DependencySet::new();
            for (pos, &field) in set.iter().enumerate() {
                deps.insert(format!("p{pos}"), self.fields[field].clone());
            }
            binder.react(&format!("r{reaction}"), deps, move |l: &Self, _| {
                l.calls.borrow_mut().push(reaction);
            })?;
        }
        Ok(())
    }
}

// ── Strategies ────────────────────────────────────────────────────────────

fn shape_strategy() -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1usize..6).prop_flat_map(|fields| {
        let set = proptest::collection::vec(0..fields, 1..4);
        (Just(fields), proptest::collection::vec(set, 0..6))
    })
}

fn distinct(set: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    for &f in set {
        if !out.contains(&f) {
            out.push(f);
        }
    }
    out
}

fn fields(count: usize) -> Vec<ReactiveField<i32>> {
    (0..count)
        .map(|i| ReactiveField::new(format!("f{i}"), 0))
        .collect()
}

fn total_subscribers(fields: &[ReactiveField<i32>]) -> usize {
    fields.iter().map(ReactiveField::subscriber_count).sum()
}

// ═════════════════════════════════════════════════════════════════════════
// Liveness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subscriptions_follow_listener_lifetime((count, sets) in shape_strategy()) {
        let fields = fields(count);
        let expected: usize = sets.iter().map(|s| distinct(s).len()).sum();

        let listener = bind(ShapeListener {
            fields: fields.clone(),
            sets: sets.clone(),
            calls: RefCell::new(Vec::new()),
            slot: ReactionSlot::new(),
        })
        .unwrap();

        prop_assert_eq!(total_subscribers(&fields), expected);
        prop_assert_eq!(listener.slot.subscription_count(), expected);

        drop(listener);
        prop_assert_eq!(total_subscribers(&fields), 0);
    }

    #[test]
    fn change_runs_exactly_dependent_reactions(
        (count, sets) in shape_strategy(),
        target in 0usize..6,
    ) {
        let fields = fields(count);
        let target = target % count;
        let listener = bind(ShapeListener {
            fields: fields.clone(),
            sets: sets.clone(),
            calls: RefCell::new(Vec::new()),
            slot: ReactionSlot::new(),
        })
        .unwrap();

        fields[target].set(1);

        let expected: Vec<usize> = sets
            .iter()
            .enumerate()
            .filter(|(_, set)| set.contains(&target))
            .map(|(r, _)| r)
            .collect();
        prop_assert_eq!(&*listener.calls.borrow(), &expected);
    }

    #[test]
    fn two_listeners_are_independent((count, sets) in shape_strategy()) {
        let fields = fields(count);
        let make = || ShapeListener {
            fields: fields.clone(),
            sets: sets.clone(),
            calls: RefCell::new(Vec::new()),
            slot: ReactionSlot::new(),
        };
        let first = bind(make()).unwrap();
        let second = bind(make()).unwrap();
        let per_listener: usize = sets.iter().map(|s| distinct(s).len()).sum();

        prop_assert_eq!(total_subscribers(&fields), 2 * per_listener);
        drop(first);
        prop_assert_eq!(total_subscribers(&fields), per_listener);
        drop(second);
        prop_assert_eq!(total_subscribers(&fields), 0);
    }
}
