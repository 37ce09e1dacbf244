/*
 * proptest_loop.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property-based tests for `for` loop metadata.
 *
 * For any list, each iteration must see index and revindex adding up to
 * length - 1, with first and last set only on the ends. The same must hold
 * whether loop state is reused (no executor) or recreated per iteration
 * (executor attached).
 */

use proptest::prelude::*;
use quarto_template::{Engine, InlineExecutor, Template, Value};
use std::sync::Arc;

const SOURCE: &str = "{% for x in items %}\
    {{ loop.index }},{{ loop.revindex }},{{ loop.first }},{{ loop.last }},{{ loop.length }},{{ x }};\
    {% endfor %}";

fn template(engine: Engine) -> Template {
    engine.compile("metadata", SOURCE).unwrap()
}

/// Render `items` and return one row of fields per iteration.
fn rows(template: &Template, items: &[i64]) -> Vec<Vec<String>> {
    let list = Value::list(items.iter().copied().map(Value::from));
    let output = template.render([("items", list)]).unwrap();
    output
        .split_terminator(';')
        .map(|row| row.split(',').map(str::to_string).collect())
        .collect()
}

fn check_rows(rows: &[Vec<String>], items: &[i64]) -> Result<(), TestCaseError> {
    let length = items.len();
    prop_assert_eq!(rows.len(), length);
    for (i, row) in rows.iter().enumerate() {
        prop_assert_eq!(&row[0], &i.to_string());
        prop_assert_eq!(&row[1], &(length - i - 1).to_string());
        prop_assert_eq!(&row[2], &(i == 0).to_string());
        prop_assert_eq!(&row[3], &(i + 1 == length).to_string());
        prop_assert_eq!(&row[4], &length.to_string());
        prop_assert_eq!(&row[5], &items[i].to_string());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn loop_metadata_with_reused_state(items in prop::collection::vec(any::<i64>(), 1..40)) {
        let template = template(Engine::builder().build().unwrap());
        check_rows(&rows(&template, &items), &items)?;
    }

    #[test]
    fn loop_metadata_with_fresh_state(items in prop::collection::vec(any::<i64>(), 1..40)) {
        let engine = Engine::builder()
            .executor(Arc::new(InlineExecutor))
            .build()
            .unwrap();
        let template = template(engine);
        check_rows(&rows(&template, &items), &items)?;
    }

    #[test]
    fn reused_and_fresh_state_render_the_same(items in prop::collection::vec(-100i64..100, 0..20)) {
        let reused = template(Engine::builder().build().unwrap());
        let fresh = template(
            Engine::builder()
                .executor(Arc::new(InlineExecutor))
                .build()
                .unwrap(),
        );
        prop_assert_eq!(rows(&reused, &items), rows(&fresh, &items));
    }
}
