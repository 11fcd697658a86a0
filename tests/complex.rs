#![cfg(feature = "complex")]

use detflow::linalg::{determinant, inverse};
use detflow::{DetManip, DynMatrix, Roll};
use num_complex::Complex;

type C = Complex<f64>;

const TOL: f64 = 1e-10;

fn kern(x: &f64, y: &f64) -> C {
    let d = x - y;
    C::new(3.0 * (-10.0 * d * d).exp(), 0.0) + C::from_polar(0.3, x + 2.0 * y)
}

type Kern = fn(&f64, &f64) -> C;

fn assert_complex_near(a: C, b: C, tol: f64, msg: &str) {
    assert!(
        (a - b).norm() <= tol * (1.0 + b.norm()),
        "{}: {:?} vs {:?}",
        msg,
        a,
        b
    );
}

fn assert_consistent(d: &DetManip<f64, f64, C, Kern>) {
    let m = d.matrix();
    assert_complex_near(d.determinant(), determinant(&m), TOL, "determinant");
    if d.size() == 0 {
        return;
    }
    let direct: DynMatrix<C> = inverse(&m).unwrap();
    let inv = d.inverse_matrix();
    for i in 0..d.size() {
        for j in 0..d.size() {
            assert_complex_near(inv[(i, j)], direct[(i, j)], TOL, "inverse");
        }
    }
}

#[test]
fn complex_rank1_sequence() {
    let mut d: DetManip<f64, f64, C, Kern> = DetManip::new(kern as Kern, 1);

    let r = d.insert_at_end(0.0, 0.0).unwrap();
    assert_complex_near(r, kern(&0.0, &0.0), 1e-15, "first insert");

    for (a, &(i, j)) in [(0, 1), (1, 0), (2, 2), (0, 3)].iter().enumerate() {
        let p = 1.0 + a as f64;
        let before = determinant(&d.matrix());
        let r = d.insert(i, j, p, p + 0.03).unwrap();
        assert_complex_near(r, determinant(&d.matrix()) / before, TOL, "insert ratio");
        assert_consistent(&d);
    }

    let before = determinant(&d.matrix());
    let r = d.change_row(2, d.get_x(2) + 0.05).unwrap();
    assert_complex_near(r, determinant(&d.matrix()) / before, TOL, "change_row ratio");

    let before = determinant(&d.matrix());
    let r = d.change_col(4, d.get_y(4) - 0.05).unwrap();
    assert_complex_near(r, determinant(&d.matrix()) / before, TOL, "change_col ratio");
    assert_consistent(&d);

    // row 0 holds x = 4, whose partner column is 3
    assert_eq!(*d.get_x(0), 4.0);
    let before = determinant(&d.matrix());
    let r = d.remove(0, 3).unwrap();
    assert_complex_near(r, determinant(&d.matrix()) / before, TOL, "remove ratio");
    assert_consistent(&d);
}

#[test]
fn complex_change_row_col_and_roll() {
    let pts = [0.0, 1.0, 2.0, 3.0];
    let mut d: DetManip<f64, f64, C, Kern> =
        DetManip::from_values(kern as Kern, pts.to_vec(), pts.to_vec()).unwrap();

    let det = d.determinant();
    assert_eq!(d.roll_matrix(Roll::Down), -1);
    assert_complex_near(d.determinant(), -det, 1e-15, "roll sign");
    assert_consistent(&d);

    // after the roll, row 1 holds x = 0 and column 0 holds y = 0
    let before = d.determinant();
    let r = d.change_row_col(1, 0, 7.0, 7.01).unwrap();
    assert_complex_near(r, d.determinant() / before, TOL, "change_row_col ratio");
    assert_consistent(&d);
}

#[test]
fn complex_rank_k() {
    let pts = [0.0, 1.0, 2.0];
    let mut d: DetManip<f64, f64, C, Kern> =
        DetManip::from_values(kern as Kern, pts.to_vec(), pts.to_vec()).unwrap();

    let before = determinant(&d.matrix());
    let r = d
        .insert_k(&[4, 0, 2], &[1, 5, 3], &[5.0, 6.0, 7.0], &[5.0, 6.0, 7.0])
        .unwrap();
    assert_complex_near(r, determinant(&d.matrix()) / before, TOL, "insert_k ratio");
    assert_consistent(&d);

    let mid = determinant(&d.matrix());
    let r = d.remove_k(&[4, 0, 2], &[1, 5, 3]).unwrap();
    assert_complex_near(r, determinant(&d.matrix()) / mid, TOL, "remove_k ratio");
    assert_consistent(&d);
    assert_eq!(d.x_values(), pts.to_vec());
}

#[test]
fn complex_refill() {
    let mut d: DetManip<f64, f64, C, Kern> = DetManip::new(kern as Kern, 2);
    d.insert_at_end(0.5, 0.5).unwrap();
    let old = d.determinant();
    let r = d.refill(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]).unwrap();
    assert_complex_near(r, d.determinant() / old, TOL, "refill ratio");
    assert_consistent(&d);
}
