//! Tests for template renaming.

use crate::rig::{RenameOptions, RigError, rename, rename_preview};

fn options(start: u64, step: u64, pad: bool, pad_width: usize, template: &str) -> RenameOptions {
    RenameOptions {
        start,
        step,
        pad,
        pad_width,
        template: template.to_owned(),
    }
}

#[test]
fn test_auto_width_comes_from_largest_number() {
    let names = ["b0", "b1", "b2"];
    let renamed = rename(&names, &options(0, 2, true, 0, "%s_%i")).expect("rename");
    // Largest number is 4: one digit, nothing to pad.
    assert_eq!(renamed, vec!["b0_0", "b1_2", "b2_4"]);

    let many: Vec<String> = (0..6).map(|i| format!("b{i}")).collect();
    let renamed = rename(&many, &options(0, 2, true, 0, "%s_%i")).expect("rename");
    // Largest number is 10: two digits.
    assert_eq!(renamed[0], "b0_00");
    assert_eq!(renamed[5], "b5_10");
}

#[test]
fn test_auto_width_equals_digits_of_last_number() {
    let names: Vec<String> = (0..12).map(|i| format!("bone{i}")).collect();
    let opts = options(95, 1, true, 0, "%i");
    let renamed = rename(&names, &opts).expect("rename");
    let last = renamed.last().expect("non-empty");
    assert_eq!(last, "106");
    assert!(renamed.iter().all(|name| name.len() == last.len()));
    assert_eq!(renamed[0], "095");
}

#[test]
fn test_explicit_width_and_no_padding() {
    let names = ["a", "b"];
    assert_eq!(
        rename(&names, &options(1, 1, true, 3, "P_%i")).expect("rename"),
        vec!["P_001", "P_002"]
    );
    assert_eq!(
        rename(&names, &options(1, 1, false, 3, "P_%i")).expect("rename"),
        vec!["P_1", "P_2"]
    );
}

#[test]
fn test_rename_is_deterministic() {
    let names = ["HP_a", "HP_b", "HP_c", "HP_d"];
    let opts = options(7, 3, true, 0, "%s.%i.%s");
    assert_eq!(rename(&names, &opts), rename(&names, &opts));
    assert_eq!(rename(&names, &opts).expect("rename")[1], "HP_b.10.HP_b");
}

#[test]
fn test_preview_matches_first_name() {
    let names = ["first", "second", "third"];
    let opts = RenameOptions::default();
    assert_eq!(
        rename_preview("first", &opts, names.len()).expect("preview"),
        rename(&names, &opts).expect("rename")[0]
    );
    assert_eq!(rename_preview("x", &opts, 0).as_deref(), Ok("x_0"));
}

#[test]
fn test_empty_input_gives_empty_output() {
    let names: [&str; 0] = [];
    assert_eq!(rename(&names, &RenameOptions::default()), Ok(Vec::new()));
}

#[test]
fn test_numbers_overflowing_u64_are_an_error() {
    let names = ["a", "b"];
    let result = rename(&names, &options(u64::MAX, 1, true, 0, "%s_%i"));
    assert!(matches!(result, Err(RigError::InvalidInput { .. })));

    let result = rename(&names, &options(2, u64::MAX, false, 0, "%i"));
    assert!(matches!(result, Err(RigError::InvalidInput { .. })));

    // A single item at the very top still fits.
    assert_eq!(
        rename(&["a"], &options(u64::MAX, 1, false, 0, "%i")),
        Ok(vec![u64::MAX.to_string()])
    );
    assert!(rename_preview("a", &options(u64::MAX, 1, true, 0, "%s_%i"), 2).is_err());
}
