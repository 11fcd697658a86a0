#![cfg(feature = "serde")]

use detflow::{DetError, DetManip, Roll, Snapshot, StabilityPolicy};

type Kern = fn(&f64, &f64) -> f64;

fn kern(x: &f64, y: &f64) -> f64 {
    let d = x - y;
    3.0 * (-10.0 * d * d).exp() + 0.3 * (x + 2.0 * y).sin()
}

fn engine() -> DetManip<f64, f64, f64, Kern> {
    let pts = [0.0, 1.0, 2.0, 3.0];
    let mut d = DetManip::from_values(kern as Kern, pts.to_vec(), pts.to_vec())
        .unwrap()
        .with_policy(StabilityPolicy::default().with_check_interval(40));
    d.insert(1, 3, 5.0, 5.0).unwrap();
    d.remove(0, 0).unwrap();
    d.roll_matrix(Roll::Left);
    d.swap_row(0, 2);
    d
}

#[test]
fn json_roundtrip_restores_state() {
    let d = engine();
    let json = serde_json::to_string(&d.snapshot()).unwrap();
    let snap: Snapshot<f64, f64, f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(snap, d.snapshot());

    let mut r = DetManip::restore(kern as Kern, snap).unwrap();
    assert!(r.is_idle());
    assert_eq!(r.size(), d.size());
    assert_eq!(r.capacity(), 2 * d.size());
    assert_eq!(r.determinant(), d.determinant());
    assert_eq!(r.sign(), d.sign());
    assert_eq!(r.matrix(), d.matrix());
    assert_eq!(r.inverse_matrix(), d.inverse_matrix());
    assert_eq!(r.check_interval(), 40);
    assert_eq!(r.operations_since_check(), d.operations_since_check());

    // the restored engine keeps working
    let before = r.determinant();
    let ratio = r.insert_at_end(9.0, 9.0).unwrap();
    assert!((r.determinant() - before * ratio).abs() < 1e-12);
    r.regenerate_and_check().unwrap();
}

#[test]
fn pending_proposal_is_not_saved() {
    let mut d = engine();
    let snap = d.snapshot();
    d.try_insert(0, 0, 8.0, 8.0);
    assert_eq!(d.snapshot(), snap);
    d.reject_last_try();
}

#[test]
fn empty_roundtrip() {
    let d = DetManip::new(kern as Kern, 4);
    let json = serde_json::to_string(&d.snapshot()).unwrap();
    let snap: Snapshot<f64, f64, f64> = serde_json::from_str(&json).unwrap();
    let r = DetManip::restore(kern as Kern, snap).unwrap();
    assert!(r.is_empty());
    assert_eq!(r.determinant(), 1.0);
}

#[test]
fn corrupt_snapshots_are_rejected() {
    let d = engine();

    let mut s = d.snapshot();
    s.row_slots[0] = s.row_slots[1];
    assert!(matches!(
        DetManip::restore(kern as Kern, s),
        Err(DetError::Corrupt(_))
    ));

    let mut s = d.snapshot();
    s.x_values.pop();
    assert!(matches!(
        DetManip::restore(kern as Kern, s),
        Err(DetError::Corrupt(_))
    ));

    let mut s = d.snapshot();
    s.sign = 0;
    assert!(matches!(
        DetManip::restore(kern as Kern, s),
        Err(DetError::Corrupt(_))
    ));

    let json = r#"{"nrows":2,"ncols":2,"data":[1.0]}"#;
    assert!(serde_json::from_str::<detflow::DynMatrix<f64>>(json).is_err());
}

#[test]
fn policy_serializes() {
    let p = StabilityPolicy::default().with_error_tolerance(1e-6);
    let json = serde_json::to_string(&p).unwrap();
    let back: StabilityPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}
