use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::HashSet;

/// 64 buckets over keys below 2048: each bucket gets ~32 fully colliding
/// keys, enough to push chains down to the overflow lists.
fn bucket(x: &u32) -> u32 {
    x % 64
}

const CMP: HashWith<fn(&u32) -> u32> = HashWith(bucket as fn(&u32) -> u32);

fn validate_set(s: &HashTrieSet<u32>, m: &HashSet<u32>) {
    let issues = s.verify(&CMP);
    assert!(issues.is_empty(), "structure issues: {issues:#?}\n{}", s.dump());

    let stats = s.stats();
    assert_eq!(stats.items, m.len(), "stats must count every item");
    assert_eq!(s.count(), m.len());
    assert_eq!(s.is_empty(), m.is_empty());

    let got: Vec<u32> = s.iter().copied().collect();
    assert_eq!(got.len(), m.len(), "iteration must yield each item once");
    assert_eq!(got.into_iter().collect::<HashSet<_>>(), *m);
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 10)]
    Insert(#[proptest(strategy = "0u32..2048")] u32),
    #[proptest(weight = 6)]
    Remove(#[proptest(strategy = "0u32..2048")] u32),
    #[proptest(weight = 4)]
    Contains(#[proptest(strategy = "0u32..2048")] u32),
    #[proptest(weight = 1)]
    Snapshot,
    /// Removes every item `x` with `x % m == 0` through an enumerator.
    #[proptest(weight = 1)]
    EnumRemove(#[proptest(strategy = "2u32..9")] u32),
    #[proptest(weight = 1)]
    ThawSnapshot,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=1500)
}

fn keys_strategy() -> impl Strategy<Value = HashSet<u32>> {
    prop::collection::hash_set(0u32..512, 0..=300)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut s: HashTrieSet<u32> = HashTrieSet::new();
        let mut m: HashSet<u32> = HashSet::new();
        let mut snapshots: Vec<(HashTrieSet<u32>, HashSet<u32>)> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(x) => {
                    prop_assert_eq!(s.insert(x, &CMP), m.insert(x));
                }
                Op::Remove(x) => {
                    let expected = m.take(&x);
                    prop_assert_eq!(s.remove(&x, &CMP), expected);
                }
                Op::Contains(x) => {
                    prop_assert_eq!(s.contains(&x, &CMP), m.contains(&x));
                }
                Op::Snapshot => {
                    if snapshots.len() == 4 {
                        snapshots.remove(0);
                    }
                    snapshots.push((s.clone_freeze(), m.clone()));
                }
                Op::EnumRemove(k) => {
                    let mut e = s.enumerator();
                    while e.move_next() {
                        if e.current().map_or(false, |x| x % k == 0) {
                            prop_assert!(e.remove_current().is_ok());
                        }
                    }
                    drop(e);
                    m.retain(|x| x % k != 0);
                }
                Op::ThawSnapshot => {
                    // Mutating a snapshot must not leak into the live set.
                    if let Some((snap, model)) = snapshots.last_mut() {
                        snap.insert(4095, &CMP);
                        model.insert(4095);
                    }
                }
            }
            prop_assert_eq!(s.contains(&4095, &CMP), false);
        }

        validate_set(&s, &m);
        for (snap, model) in &snapshots {
            validate_set(snap, model);
        }
    }

    #[test]
    fn prop_algebra(xs in keys_strategy(), ys in keys_strategy()) {
        let a = HashTrieSet::from_iter_with(xs.iter().copied(), &CMP);
        let b = HashTrieSet::from_iter_with(ys.iter().copied(), &CMP);

        let mut u = a.clone();
        u.union_with_set(&b, &CMP, false);
        validate_set(&u, &(&xs | &ys));

        let mut i = a.clone();
        i.intersect_with_set(&b, &CMP);
        validate_set(&i, &(&xs & &ys));

        let mut d = a.clone();
        d.except_with(ys.iter(), &CMP);
        validate_set(&d, &(&xs - &ys));

        let mut x = a.clone();
        x.symmetric_except_with(ys.iter().copied(), &CMP);
        validate_set(&x, &(&xs ^ &ys));

        let none = KnownCounts::default();
        prop_assert_eq!(a.is_subset_of(&b, &CMP, none), xs.is_subset(&ys));
        prop_assert_eq!(a.is_superset_of(&b, &CMP, none), xs.is_superset(&ys));
        prop_assert_eq!(a.overlaps(&b, &CMP, none), !xs.is_disjoint(&ys));
        prop_assert_eq!(a.set_equals(&b, &CMP, none), xs == ys);

        // Operands are snapshots; none of the above touched them.
        validate_set(&a, &xs);
        validate_set(&b, &ys);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

// Six keys sharing bucket 5: one more than a window holds, so every order
// forces a split chain down to the overflow list.
const COLLIDING: [u32; 6] = [5, 69, 133, 197, 261, 325];

#[test]
fn exhaustive_insert_order_colliding() {
    let expected: HashSet<u32> = COLLIDING.into_iter().collect();
    for_each_permutation(&COLLIDING, |perm| {
        let mut s = HashTrieSet::new();
        for x in perm {
            assert!(s.insert(x, &CMP));
        }
        validate_set(&s, &expected);
        assert!(s.stats().overflow_items > 0);
    });
}

#[test]
fn exhaustive_remove_order_colliding() {
    let base = HashTrieSet::from_iter_with(COLLIDING, &CMP);

    for_each_permutation(&COLLIDING, |perm| {
        let mut s = base.clone();
        let mut m: HashSet<u32> = COLLIDING.into_iter().collect();
        for x in perm {
            assert_eq!(s.remove(&x, &CMP), m.take(&x));
            validate_set(&s, &m);
        }
        assert!(s.root.is_none());
    });

    validate_set(&base, &COLLIDING.into_iter().collect());
}

#[test]
fn exhaustive_enumerator_removal_colliding() {
    let base = HashTrieSet::from_iter_with(COLLIDING, &CMP);

    // Each subset of the keys is removed by one enumerator pass.
    for mask in 0u32..(1 << COLLIDING.len()) {
        let doomed: HashSet<u32> = COLLIDING
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &x)| x)
            .collect();
        let mut s = base.clone();
        let mut e = s.enumerator();
        while e.move_next() {
            if e.current().map_or(false, |x| doomed.contains(x)) {
                e.remove_current().unwrap();
            }
        }
        drop(e);
        let left: HashSet<u32> = COLLIDING.into_iter().filter(|x| !doomed.contains(x)).collect();
        validate_set(&s, &left);
    }
}
