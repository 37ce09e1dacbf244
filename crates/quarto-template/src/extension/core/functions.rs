/*
 * functions.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in functions.

use crate::error::ExtensionError;
use crate::extension::{Arguments, Function};
use crate::value::{Sequence, Value};
use std::sync::Arc;

/// `range(start, end, step)`: the integers from `start` to `end`
/// inclusive. `step` defaults to 1 and may be negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeFunction;

impl Function for RangeFunction {
    fn argument_names(&self) -> &[&str] {
        &["start", "end", "step"]
    }

    fn execute(&self, args: &Arguments) -> Result<Value, ExtensionError> {
        let start = args.require_i64("start")?;
        let end = args.require_i64("end")?;
        let step = match args.get("step") {
            None | Some(Value::Null) => 1,
            Some(_) => args.require_i64("step")?,
        };
        if step == 0 {
            return Err(ExtensionError::new("range step must not be zero"));
        }
        Ok(Value::Sequence(Arc::new(RangeSequence { start, end, step })))
    }
}

/// A lazily produced integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSequence {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl Sequence for RangeSequence {
    fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        let RangeSequence { start, end, step } = *self;
        let values = std::iter::successors(Some(start), move |current| current.checked_add(step))
            .take_while(move |current| {
                if step > 0 {
                    *current <= end
                } else {
                    *current >= end
                }
            })
            .map(Value::Integer);
        Box::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(args: &[(&str, i64)]) -> Result<Vec<i64>, ExtensionError> {
        let args: Arguments = args
            .iter()
            .map(|(name, value)| (*name, Value::from(*value)))
            .collect();
        let Value::Sequence(seq) = RangeFunction.execute(&args)? else {
            panic!("range should return a sequence");
        };
        Ok(seq.iter().filter_map(|v| v.as_i64()).collect())
    }

    #[test]
    fn test_range_is_inclusive() {
        assert_eq!(range(&[("start", 1), ("end", 4)]).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(range(&[("start", 3), ("end", 1)]).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_range_with_step() {
        assert_eq!(
            range(&[("start", 0), ("end", 10), ("step", 5)]).unwrap(),
            vec![0, 5, 10]
        );
        assert_eq!(
            range(&[("start", 3), ("end", 1), ("step", -1)]).unwrap(),
            vec![3, 2, 1]
        );
        assert!(range(&[("start", 0), ("end", 1), ("step", 0)]).is_err());
    }

    #[test]
    fn test_range_stops_at_overflow() {
        let values = range(&[("start", i64::MAX - 1), ("end", i64::MAX)]).unwrap();
        assert_eq!(values, vec![i64::MAX - 1, i64::MAX]);
    }
}
