/*
 * iteration.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Iteration support for `for` loops.
//!
//! [`IterableSource`] resolves a value into one of the shapes a loop can
//! walk, once, at the point of coercion. [`LoopStatePolicy`] decides how the
//! `loop` metadata variable is maintained between iterations.

use super::scope::ScopeChain;
use crate::value::{Sequence, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Name under which loop metadata is bound.
pub const LOOP_VARIABLE: &str = "loop";

/// A value viewed as something a loop can walk.
#[derive(Debug, Clone, Copy)]
pub enum IterableSource<'a> {
    /// An empty list.
    Empty,
    /// A fixed-size list.
    List(&'a [Value]),
    /// A map, iterated as `{key, value}` entries.
    Pairs(&'a IndexMap<String, Value>),
    /// A lazy sequence with no known size.
    Sequence(&'a dyn Sequence),
}

impl<'a> IterableSource<'a> {
    /// Resolve `value` into an iterable shape, or `None` if it is not
    /// iterable.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::List(items) if items.is_empty() => Some(IterableSource::Empty),
            Value::List(items) => Some(IterableSource::List(items.as_slice())),
            Value::Map(map) => Some(IterableSource::Pairs(map.as_ref())),
            Value::Sequence(seq) => Some(IterableSource::Sequence(seq.as_ref())),
            _ => None,
        }
    }

    /// Number of elements. Sequences are counted by walking them.
    pub fn len(&self) -> usize {
        match self {
            IterableSource::Empty => 0,
            IterableSource::List(items) => items.len(),
            IterableSource::Pairs(map) => map.len(),
            IterableSource::Sequence(seq) => seq.iter().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            IterableSource::Empty => true,
            IterableSource::List(items) => items.is_empty(),
            IterableSource::Pairs(map) => map.is_empty(),
            IterableSource::Sequence(seq) => seq.iter().next().is_none(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Value> + 'a> {
        match *self {
            IterableSource::Empty => Box::new(std::iter::empty()),
            IterableSource::List(items) => Box::new(items.iter().cloned()),
            IterableSource::Pairs(map) => Box::new(map.iter().map(|(key, value)| {
                Value::map([("key", Value::from(key.as_str())), ("value", value.clone())])
            })),
            IterableSource::Sequence(seq) => seq.iter(),
        }
    }
}

/// The `loop` variable at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopMetadata {
    pub first: bool,
    pub last: bool,
    pub length: usize,
    pub index: usize,
    pub revindex: usize,
}

impl LoopMetadata {
    /// Metadata for position `index` of a loop over `length` elements.
    ///
    /// `index` must be less than `length`.
    pub fn at(index: usize, length: usize) -> Self {
        Self {
            first: index == 0,
            last: index + 1 == length,
            length,
            index,
            revindex: length - index - 1,
        }
    }

    pub fn to_value(self) -> Value {
        Value::map([
            ("first", Value::Bool(self.first)),
            ("last", Value::Bool(self.last)),
            ("length", Value::from(self.length)),
            ("index", Value::from(self.index)),
            ("revindex", Value::from(self.revindex)),
        ])
    }

    /// Read metadata back from a bound `loop` value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let usize_field =
            |name: &str| -> Option<usize> { usize::try_from(value.get_attribute(name)?.as_i64()?).ok() };
        let bool_field = |name: &str| match value.get_attribute(name) {
            Some(Value::Bool(b)) => Some(b),
            _ => None,
        };
        Some(Self {
            first: bool_field("first")?,
            last: bool_field("last")?,
            length: usize_field("length")?,
            index: usize_field("index")?,
            revindex: usize_field("revindex")?,
        })
    }
}

/// How loop state is carried from one iteration to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatePolicy {
    /// One metadata map, updated in place. Only safe when no iteration can
    /// outlive the step that produced it.
    Reuse,
    /// A new metadata map and a new copy of the loop frame per iteration.
    Fresh,
}

impl LoopStatePolicy {
    pub fn new_state(self, length: usize) -> Box<dyn LoopState> {
        match self {
            LoopStatePolicy::Reuse => Box::new(ReusedLoopState { length }),
            LoopStatePolicy::Fresh => Box::new(FreshLoopState { length }),
        }
    }
}

/// Binds the `loop` variable for each iteration.
pub trait LoopState {
    /// Bind metadata for position `index` in the innermost frame of `scopes`.
    fn bind(&mut self, scopes: &mut ScopeChain, index: usize);
}

#[derive(Debug)]
struct ReusedLoopState {
    length: usize,
}

impl LoopState for ReusedLoopState {
    fn bind(&mut self, scopes: &mut ScopeChain, index: usize) {
        if index > 0 {
            if let Some(Value::Map(map)) = scopes.current_mut().get_mut(LOOP_VARIABLE) {
                let map = Arc::make_mut(map);
                if index == 1 {
                    map.insert("first".to_string(), Value::Bool(false));
                }
                if index + 1 == self.length {
                    map.insert("last".to_string(), Value::Bool(true));
                }
                map.insert(
                    "revindex".to_string(),
                    Value::from(self.length - index - 1),
                );
                map.insert("index".to_string(), Value::from(index));
                return;
            }
        }
        // first iteration, or the body rebound `loop`
        scopes.put(
            LOOP_VARIABLE,
            LoopMetadata::at(index, self.length).to_value(),
        );
    }
}

#[derive(Debug)]
struct FreshLoopState {
    length: usize,
}

impl LoopState for FreshLoopState {
    fn bind(&mut self, scopes: &mut ScopeChain, index: usize) {
        scopes.detach_current();
        scopes.put(
            LOOP_VARIABLE,
            LoopMetadata::at(index, self.length).to_value(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Scope;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Countdown(i64);

    impl Sequence for Countdown {
        fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
            Box::new((1..=self.0).rev().map(Value::from))
        }
    }

    fn loop_metadata(scopes: &ScopeChain) -> LoopMetadata {
        LoopMetadata::from_value(scopes.get(LOOP_VARIABLE).unwrap()).unwrap()
    }

    #[test]
    fn test_source_shapes() {
        let empty = Value::list([]);
        assert!(matches!(
            IterableSource::from_value(&empty),
            Some(IterableSource::Empty)
        ));

        let list = Value::list([Value::from(1), Value::from(2)]);
        let source = IterableSource::from_value(&list).unwrap();
        assert_eq!(source.len(), 2);

        let seq = Value::Sequence(Arc::new(Countdown(3)));
        let source = IterableSource::from_value(&seq).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(
            source.iter().collect::<Vec<_>>(),
            vec![Value::from(3), Value::from(2), Value::from(1)]
        );

        assert!(IterableSource::from_value(&Value::from(5)).is_none());
        assert!(IterableSource::from_value(&Value::from("abc")).is_none());
    }

    #[test]
    fn test_map_iterates_as_entries() {
        let map = Value::map([("a", Value::from(1)), ("b", Value::from(2))]);
        let source = IterableSource::from_value(&map).unwrap();
        let entries: Vec<Value> = source.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get_attribute("key"), Some(Value::from("a")));
        assert_eq!(entries[1].get_attribute("value"), Some(Value::from(2)));
    }

    #[test]
    fn test_metadata_at_positions() {
        assert_eq!(
            LoopMetadata::at(0, 3),
            LoopMetadata {
                first: true,
                last: false,
                length: 3,
                index: 0,
                revindex: 2,
            }
        );
        let single = LoopMetadata::at(0, 1);
        assert!(single.first && single.last);
        assert_eq!(single.revindex, 0);
    }

    #[test]
    fn test_reused_state_matches_fresh_state() {
        for length in 1..5 {
            let mut reused = ScopeChain::new(Scope::new());
            let mut fresh = ScopeChain::new(Scope::new());
            let mut reused_state = LoopStatePolicy::Reuse.new_state(length);
            let mut fresh_state = LoopStatePolicy::Fresh.new_state(length);
            for index in 0..length {
                reused_state.bind(&mut reused, index);
                fresh_state.bind(&mut fresh, index);
                assert_eq!(loop_metadata(&reused), LoopMetadata::at(index, length));
                assert_eq!(loop_metadata(&fresh), LoopMetadata::at(index, length));
            }
        }
    }

    #[test]
    fn test_fresh_state_never_touches_captured_frames() {
        let mut scopes = ScopeChain::new(Scope::new());
        let mut state = LoopStatePolicy::Fresh.new_state(3);
        state.bind(&mut scopes, 0);
        let captured = scopes.fork();

        state.bind(&mut scopes, 1);
        assert!(!scopes.shares_current_with(&captured));
        assert_eq!(loop_metadata(&captured).index, 0);
        assert_eq!(loop_metadata(&scopes).index, 1);
    }

    #[test]
    fn test_reused_state_updates_in_place() {
        let mut scopes = ScopeChain::new(Scope::new());
        let mut state = LoopStatePolicy::Reuse.new_state(3);
        state.bind(&mut scopes, 0);
        let before = match scopes.get(LOOP_VARIABLE) {
            Some(Value::Map(map)) => Arc::as_ptr(map),
            other => panic!("unexpected loop value: {:?}", other),
        };
        state.bind(&mut scopes, 1);
        let after = match scopes.get(LOOP_VARIABLE) {
            Some(Value::Map(map)) => Arc::as_ptr(map),
            other => panic!("unexpected loop value: {:?}", other),
        };
        assert_eq!(before, after);
    }
}
