// ==============================================
// MAP MODEL TESTS (integration)
// ==============================================
//
// Arbitrary single-threaded operation sequences applied to both the store
// and the async value view, checked step by step against a HashMap model.

use std::collections::HashMap;
use std::sync::Arc;

use loadkit::error::CacheError;
use loadkit::executor::SameThreadExecutor;
use loadkit::map::ConcurrentMap;
use loadkit::pending::Pending;
use loadkit::store::ShardedHashMapStore;
use loadkit::view::AsyncValueView;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u16),
    PutIfAbsent(u8, u16),
    Remove(u8),
    RemoveValue(u8, u16),
    Replace(u8, u16),
    ReplaceValue(u8, u16, u16),
    ComputeIfAbsent(u8, Option<u16>),
    ComputeIfPresent(u8, Option<u16>),
    Compute(u8, Option<u16>),
    Merge(u8, u16),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..16, any::<u16>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (0u8..16, any::<u16>()).prop_map(|(k, v)| Op::PutIfAbsent(k, v)),
        2 => (0u8..16).prop_map(Op::Remove),
        2 => (0u8..16, 0u16..4).prop_map(|(k, v)| Op::RemoveValue(k, v)),
        1 => (0u8..16, any::<u16>()).prop_map(|(k, v)| Op::Replace(k, v)),
        2 => (0u8..16, 0u16..4, any::<u16>()).prop_map(|(k, o, n)| Op::ReplaceValue(k, o, n)),
        2 => (0u8..16, proptest::option::of(any::<u16>()))
            .prop_map(|(k, v)| Op::ComputeIfAbsent(k, v)),
        2 => (0u8..16, proptest::option::of(any::<u16>()))
            .prop_map(|(k, v)| Op::ComputeIfPresent(k, v)),
        2 => (0u8..16, proptest::option::of(any::<u16>())).prop_map(|(k, v)| Op::Compute(k, v)),
        2 => (0u8..16, 0u16..100).prop_map(|(k, v)| Op::Merge(k, v)),
        1 => Just(Op::Clear),
    ]
}

/// Applies `op` to `map` and returns a comparable observation.
fn apply<M: ConcurrentMap<u8, u16>>(map: &M, op: &Op) -> Option<u16> {
    match *op {
        Op::Put(k, v) => map.put(k, v),
        Op::PutIfAbsent(k, v) => map.put_if_absent(k, v),
        Op::Remove(k) => map.remove(&k),
        Op::RemoveValue(k, v) => map.remove_value(&k, &v).then_some(1),
        Op::Replace(k, v) => map.replace(k, v),
        Op::ReplaceValue(k, o, n) => map.replace_value(k, &o, n).then_some(1),
        Op::ComputeIfAbsent(k, v) => map.compute_if_absent(k, |_| Ok(v)).unwrap(),
        Op::ComputeIfPresent(k, v) => map.compute_if_present(k, |_, _| Ok(v)).unwrap(),
        Op::Compute(k, v) => map.compute(k, |_, _| Ok(v)).unwrap(),
        Op::Merge(k, v) => map
            .merge(k, v, |a, b| Ok(Some(a.wrapping_add(*b))))
            .unwrap(),
        Op::Clear => {
            map.clear();
            None
        },
    }
}

fn apply_model(model: &mut HashMap<u8, u16>, op: &Op) -> Option<u16> {
    match *op {
        Op::Put(k, v) => model.insert(k, v),
        Op::PutIfAbsent(k, v) => match model.get(&k) {
            Some(existing) => Some(*existing),
            None => {
                model.insert(k, v);
                None
            },
        },
        Op::Remove(k) => model.remove(&k),
        Op::RemoveValue(k, v) => {
            if model.get(&k) == Some(&v) {
                model.remove(&k);
                Some(1)
            } else {
                None
            }
        },
        Op::Replace(k, v) => {
            if model.contains_key(&k) {
                model.insert(k, v)
            } else {
                None
            }
        },
        Op::ReplaceValue(k, o, n) => {
            if model.get(&k) == Some(&o) {
                model.insert(k, n);
                Some(1)
            } else {
                None
            }
        },
        Op::ComputeIfAbsent(k, v) => match model.get(&k) {
            Some(existing) => Some(*existing),
            None => {
                if let Some(v) = v {
                    model.insert(k, v);
                }
                v
            },
        },
        Op::ComputeIfPresent(k, v) => {
            if !model.contains_key(&k) {
                return None;
            }
            match v {
                Some(v) => {
                    model.insert(k, v);
                    Some(v)
                },
                None => {
                    model.remove(&k);
                    None
                },
            }
        },
        Op::Compute(k, v) => {
            match v {
                Some(v) => {
                    model.insert(k, v);
                },
                None => {
                    model.remove(&k);
                },
            }
            v
        },
        Op::Merge(k, v) => {
            let merged = match model.get(&k) {
                Some(old) => old.wrapping_add(v),
                None => v,
            };
            model.insert(k, merged);
            Some(merged)
        },
        Op::Clear => {
            model.clear();
            None
        },
    }
}

fn assert_matches<M: ConcurrentMap<u8, u16>>(
    map: &M,
    model: &HashMap<u8, u16>,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(map.len(), model.len());
    let mut entries = map.entries();
    entries.sort_unstable();
    let mut expected: Vec<(u8, u16)> = model.iter().map(|(k, v)| (*k, *v)).collect();
    expected.sort_unstable();
    prop_assert_eq!(entries, expected);
    Ok(())
}

fn store<V>() -> ShardedHashMapStore<u8, V>
where
    V: Clone + Send + Sync + 'static,
{
    ShardedHashMapStore::new(4).with_executor(Arc::new(SameThreadExecutor))
}

proptest! {
    /// The store behaves like a HashMap for every operation.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let map = store::<u16>();
        let mut model = HashMap::new();
        for op in &ops {
            let observed = apply(&map, op);
            let expected = apply_model(&mut model, op);
            prop_assert_eq!(observed, expected, "op {:?}", op);
            assert_matches(&map, &model)?;
        }
    }

    /// With only completed computations, the view behaves like a HashMap.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_view_matches_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let view = AsyncValueView::new(Arc::new(store::<Pending<u16>>()));
        let mut model = HashMap::new();
        for op in &ops {
            let observed = apply(&view, op);
            let expected = apply_model(&mut model, op);
            prop_assert_eq!(observed, expected, "op {:?}", op);
            assert_matches(&view, &model)?;
        }
    }

    /// Failed computations read as absent and are superseded by writes.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_failed_entries_read_as_absent(
        failed in prop::collection::hash_set(0u8..16, 0..8),
        ops in prop::collection::vec(op_strategy(), 0..100)
    ) {
        let store = Arc::new(store::<Pending<u16>>());
        for key in &failed {
            store.put(*key, Pending::failed(CacheError::msg("failed")));
        }
        let view = AsyncValueView::new(store.clone());
        for key in &failed {
            prop_assert_eq!(view.get(key), None);
            prop_assert!(view.contains_key(key));
        }
        prop_assert!(view.values().is_empty());

        // Unconditional writes and removals supersede a failed computation;
        // conditional inserts see the key as occupied and are skipped here.
        let mut model = HashMap::new();
        let supersedes = |op: &&Op| {
            !matches!(op, Op::PutIfAbsent(..) | Op::ComputeIfAbsent(..) | Op::Replace(..))
        };
        for op in ops.iter().filter(supersedes) {
            apply(&view, op);
            apply_model(&mut model, op);
        }
        for key in 0u8..16 {
            prop_assert_eq!(view.get(&key), model.get(&key).copied(), "key {}", key);
        }
    }
}
