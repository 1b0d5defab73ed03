//! Property tests for the concise/verbose algebra
//!
//! - Concise collapse law: a concise view is a leaf exactly when every child
//!   agrees, and equals the verbose view otherwise
//! - Idempotent reads: reading twice without a write returns the same `Rc`
//! - Reset restores the initial value and clears dirtiness

use std::rc::Rc;

use impulse_form::{FlagSetter, FormNode, List, Monitor, Nested, Shape, Unit};
use proptest::prelude::*;
use serde_json::json;

fn flagged_shape(flags: &[bool]) -> Shape {
    Shape::new(
        flags
            .iter()
            .enumerate()
            .map(|(index, flag)| (format!("field_{index}"), Unit::builder(json!(index)).touched(*flag).build())),
    )
}

fn flagged_list(flags: &[bool]) -> List {
    List::new(
        flags
            .iter()
            .map(|flag| Unit::builder(json!(0)).touched(*flag).build()),
    )
}

fn all_agree(flags: &[bool]) -> Option<bool> {
    let first = *flags.first()?;
    flags.iter().all(|flag| *flag == first).then_some(first)
}

proptest! {
    /// Shapes collapse touched flags exactly when every field agrees
    #[test]
    fn shape_concise_collapse_law(flags in prop::collection::vec(any::<bool>(), 1..8)) {
        let shape = flagged_shape(&flags);
        let monitor = Monitor::new();
        let concise = shape.touched(&monitor);
        let verbose = shape.touched_verbose(&monitor);

        match all_agree(&flags) {
            Some(flag) => {
                prop_assert_eq!(&*concise, &Nested::Leaf(flag));
            }
            None => {
                prop_assert_eq!(&*concise, &*verbose);
            }
        }
        prop_assert!(matches!(&*verbose, Nested::Fields(fields) if fields.len() == flags.len()));
    }

    /// Lists follow the same law over positional elements
    #[test]
    fn list_concise_collapse_law(flags in prop::collection::vec(any::<bool>(), 1..8)) {
        let list = flagged_list(&flags);
        let monitor = Monitor::new();
        let concise = list.touched(&monitor);

        match all_agree(&flags) {
            Some(flag) => {
                prop_assert_eq!(&*concise, &Nested::Leaf(flag));
            }
            None => {
                let expected = Nested::items(flags.iter().map(|flag| Nested::Leaf(*flag)));
                prop_assert_eq!(&*concise, &expected);
            }
        }
    }

    /// Consecutive reads without writes return the same allocations
    #[test]
    fn reads_are_idempotent(flags in prop::collection::vec(any::<bool>(), 0..6)) {
        let shape = flagged_shape(&flags);
        let monitor = Monitor::new();

        prop_assert!(Rc::ptr_eq(&shape.touched(&monitor), &shape.touched(&monitor)));
        prop_assert!(Rc::ptr_eq(&shape.touched_verbose(&monitor), &shape.touched_verbose(&monitor)));
        prop_assert!(Rc::ptr_eq(&shape.input(&monitor), &shape.input(&monitor)));
        prop_assert!(Rc::ptr_eq(&shape.error(&monitor), &shape.error(&monitor)));
    }

    /// Writing the same flags again keeps the previous concise `Rc`
    #[test]
    fn equal_rewrite_keeps_reference(flags in prop::collection::vec(any::<bool>(), 1..6)) {
        let shape = flagged_shape(&flags);
        let monitor = Monitor::new();
        let before = shape.touched(&monitor);

        let names: Vec<String> = (0..flags.len()).map(|index| format!("field_{index}")).collect();
        shape.set_touched(FlagSetter::fields(names.into_iter().zip(flags.iter().copied())));

        prop_assert!(Rc::ptr_eq(&before, &shape.touched(&monitor)));
    }

    /// Reset restores any input to the initial value
    #[test]
    fn reset_restores_initial(values in prop::collection::vec(any::<i32>(), 1..6)) {
        let list = List::new(values.iter().map(|_| Unit::new(json!(0))));
        let monitor = Monitor::new();

        list.set_input(json!(values));
        list.reset();

        prop_assert_eq!(list.input(&monitor), list.initial(&monitor));
        prop_assert_eq!(&*list.dirty(&monitor), &Nested::Leaf(false));
    }
}
