use crunch_core::hash;

#[test]
fn combine_matches_the_reference_rule() {
    let mut h = 0u64;
    hash::combine(&mut h, 1);
    // 0 ^ (1 + 0x9e3779b9 + 0 + 0)
    assert_eq!(h, 0x9e37_79ba);
}

#[test]
fn fold_bytes_reduces_then_combines() {
    let mut direct = 0u64;
    hash::combine(&mut direct, 1);
    let mut folded = 0u64;
    hash::fold_bytes(&mut folded, &[1]);
    assert_eq!(direct, folded);
}

#[test]
fn folding_is_order_sensitive() {
    let mut ab = 0u64;
    hash::fold_str(&mut ab, "a");
    hash::fold_str(&mut ab, "b");

    let mut ba = 0u64;
    hash::fold_str(&mut ba, "b");
    hash::fold_str(&mut ba, "a");

    assert_ne!(ab, ba);
}

#[test]
fn concatenation_differs_from_separate_folds() {
    let mut joined = 0u64;
    hash::fold_str(&mut joined, "ab");

    let mut split = 0u64;
    hash::fold_str(&mut split, "a");
    hash::fold_str(&mut split, "b");

    assert_ne!(joined, split);
}

#[test]
fn empty_input_still_perturbs_the_hash() {
    let mut h = 0u64;
    hash::fold_bytes(&mut h, &[]);
    assert_eq!(h, 0x9e37_79b9);
}

#[test]
fn folds_are_deterministic() {
    let run = || {
        let mut h = 0u64;
        hash::fold_str(&mut h, "crunch");
        hash::fold_bytes(&mut h, &[0, 1, 2, 255]);
        hash::combine(&mut h, 42);
        h
    };
    assert_eq!(run(), run());
}
