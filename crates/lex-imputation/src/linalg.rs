//! Dense linear algebra used by the regression-based estimators.
//!
//! Matrices are row-major `Vec<Vec<f64>>`. Every function is pure; shape
//! mismatches return `None` instead of panicking.

/// Row-major dense matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Pivots with an absolute value below this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-10;

fn is_rectangular(m: &[Vec<f64>]) -> bool {
    m.first()
        .is_none_or(|first| m.iter().all(|row| row.len() == first.len()))
}

/// Transpose a matrix.
pub fn transpose(m: &[Vec<f64>]) -> Matrix {
    let rows = m.len();
    let cols = m.first().map_or(0, Vec::len);
    let mut out = vec![vec![0.0; rows]; cols];
    for (i, row) in m.iter().enumerate() {
        for (j, &value) in row.iter().enumerate().take(cols) {
            out[j][i] = value;
        }
    }
    out
}

/// Multiply `a (n×k)` by `b (k×m)`.
pub fn mat_mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Option<Matrix> {
    if !is_rectangular(a) || !is_rectangular(b) {
        return None;
    }
    let inner = a.first().map_or(0, Vec::len);
    if inner != b.len() {
        return None;
    }
    let cols = b.first().map_or(0, Vec::len);

    let mut out = vec![vec![0.0; cols]; a.len()];
    for (i, row) in a.iter().enumerate() {
        for (k, &a_ik) in row.iter().enumerate() {
            if a_ik == 0.0 {
                continue;
            }
            for (j, &b_kj) in b[k].iter().enumerate() {
                out[i][j] += a_ik * b_kj;
            }
        }
    }
    Some(out)
}

/// Multiply `m (n×k)` by the vector `v (k)`.
pub fn mat_vec_mul(m: &[Vec<f64>], v: &[f64]) -> Option<Vec<f64>> {
    if m.iter().any(|row| row.len() != v.len()) {
        return None;
    }
    Some(
        m.iter()
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect(),
    )
}

/// Solve the square system `Ax = b` by Gaussian elimination with partial
/// pivoting.
///
/// Returns `None` when the system is (near-)singular, i.e. the best pivot of
/// some column is below [`PIVOT_EPSILON`] in absolute value, or when the
/// shapes are inconsistent.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    // Augmented working copy [A | b].
    let mut aug: Matrix = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&x, &y| aug[x][col].abs().total_cmp(&aug[y][col].abs()))
            .unwrap_or(col);
        let pivot = aug[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() < PIVOT_EPSILON {
            return None;
        }
        aug.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                aug[row][k] -= factor * aug[col][k];
            }
        }
    }

    // Back substitution.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| aug[i][j] * x[j]).sum();
        x[i] = (aug[i][n] - tail) / aug[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "expected {:?}, got {:?}", expected, actual);
        }
    }

    #[test]
    fn test_transpose() {
        let m = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let t = transpose(&m);
        assert_eq!(t, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
        assert_eq!(transpose(&t), m);
    }

    #[test]
    fn test_transpose_empty() {
        let empty: Matrix = Vec::new();
        assert!(transpose(&empty).is_empty());
    }

    #[test]
    fn test_mat_mul() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let b = vec![vec![5.0, 6.0], vec![7.0, 8.0]];
        assert_eq!(
            mat_mul(&a, &b).unwrap(),
            vec![vec![19.0, 22.0], vec![43.0, 50.0]]
        );
    }

    #[test]
    fn test_mat_mul_shape_mismatch() {
        let a = vec![vec![1.0, 2.0, 3.0]];
        let b = vec![vec![1.0], vec![2.0]];
        assert!(mat_mul(&a, &b).is_none());
    }

    #[test]
    fn test_mat_vec_mul() {
        let m = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        assert_eq!(mat_vec_mul(&m, &[1.0, 1.0]).unwrap(), vec![3.0, 7.0, 11.0]);
        assert!(mat_vec_mul(&m, &[1.0]).is_none());
    }

    #[test]
    fn test_solve_identity() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_close(&solve(&a, &[3.0, -2.0]).unwrap(), &[3.0, -2.0]);
    }

    #[test]
    fn test_solve_three_by_three() {
        // 2x + y - z = 8, -3x - y + 2z = -11, -2x + y + 2z = -3
        let a = vec![
            vec![2.0, 1.0, -1.0],
            vec![-3.0, -1.0, 2.0],
            vec![-2.0, 1.0, 2.0],
        ];
        let x = solve(&a, &[8.0, -11.0, -3.0]).unwrap();
        assert_close(&x, &[2.0, 3.0, -1.0]);
    }

    #[test]
    fn test_solve_requires_pivoting() {
        // Zero in the leading position forces a row swap.
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert_close(&solve(&a, &[4.0, 5.0]).unwrap(), &[5.0, 4.0]);
    }

    #[test]
    fn test_solve_singular_returns_none() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(&a, &[3.0, 6.0]).is_none());
    }

    #[test]
    fn test_solve_near_singular_returns_none() {
        let a = vec![vec![1.0, 1.0], vec![1.0, 1.0 + 1e-13]];
        assert!(solve(&a, &[2.0, 2.0]).is_none());
    }

    #[test]
    fn test_solve_shape_mismatch() {
        let a = vec![vec![1.0, 2.0]];
        assert!(solve(&a, &[1.0]).is_none());
        assert!(solve(&[], &[]).is_none());
    }

    #[test]
    fn test_normal_equations_recover_line() {
        // y = 2x + 1 with an intercept column.
        let x: Matrix = (1..=4).map(|v| vec![1.0, v as f64]).collect();
        let y: Vec<f64> = (1..=4).map(|v| 2.0 * v as f64 + 1.0).collect();
        let xt = transpose(&x);
        let xtx = mat_mul(&xt, &x).unwrap();
        let xty = mat_vec_mul(&xt, &y).unwrap();
        assert_close(&solve(&xtx, &xty).unwrap(), &[1.0, 2.0]);
    }
}
