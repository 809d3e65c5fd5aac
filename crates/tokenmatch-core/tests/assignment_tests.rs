//! Hungarian solver checked against exhaustive search

use tokenmatch_core::{solve, AssignmentError, CostMatrix};

/// Small deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    /// Uniform in [0, 1)
    fn unit(&mut self) -> f64 {
        (self.next() % 1_000_000) as f64 / 1_000_000.0
    }

    /// Small integers, to force ties
    fn small(&mut self) -> f64 {
        (self.next() % 4) as f64
    }
}

fn random_matrix(rng: &mut Lcg, rows: usize, cols: usize, ties: bool) -> CostMatrix {
    let data = (0..rows * cols)
        .map(|_| if ties { rng.small() } else { rng.unit() })
        .collect();
    CostMatrix::from_vec(rows, cols, data).unwrap()
}

/// Minimum cost over every injective mapping of the smaller side
fn brute_force(costs: &CostMatrix) -> f64 {
    fn search(
        costs: &CostMatrix,
        row: usize,
        used: &mut Vec<bool>,
        acc: f64,
        best: &mut f64,
        transpose: bool,
    ) {
        let (rows, cols) = if transpose {
            (costs.cols(), costs.rows())
        } else {
            (costs.rows(), costs.cols())
        };
        if row == rows {
            *best = best.min(acc);
            return;
        }
        for col in 0..cols {
            if used[col] {
                continue;
            }
            used[col] = true;
            let cost = if transpose {
                costs.at(col, row)
            } else {
                costs.at(row, col)
            };
            search(costs, row + 1, used, acc + cost, best, transpose);
            used[col] = false;
        }
    }

    let transpose = costs.rows() > costs.cols();
    let width = if transpose { costs.rows() } else { costs.cols() };
    let mut best = f64::INFINITY;
    search(costs, 0, &mut vec![false; width], 0.0, &mut best, transpose);
    best
}

fn assert_valid(costs: &CostMatrix, pairs: &[(usize, usize)]) {
    assert_eq!(pairs.len(), costs.rows().min(costs.cols()));
    let mut rows_seen = vec![false; costs.rows()];
    let mut cols_seen = vec![false; costs.cols()];
    for &(r, c) in pairs {
        assert!(!rows_seen[r], "row {} assigned twice", r);
        assert!(!cols_seen[c], "column {} assigned twice", c);
        rows_seen[r] = true;
        cols_seen[c] = true;
    }
}

#[test]
fn test_square_matches_brute_force() {
    let mut rng = Lcg(42);
    for n in 1..=6 {
        for round in 0..20 {
            let costs = random_matrix(&mut rng, n, n, round % 2 == 0);
            let assignment = solve(&costs).unwrap();
            assert_valid(&costs, &assignment.pairs);

            let expected = brute_force(&costs);
            assert!(
                (assignment.total_cost - expected).abs() < 1e-9,
                "n={} round={}: solver {} vs brute force {}",
                n,
                round,
                assignment.total_cost,
                expected
            );
        }
    }
}

#[test]
fn test_rectangular_matches_brute_force() {
    let mut rng = Lcg(7);
    for (rows, cols) in [(1, 3), (2, 5), (3, 4), (4, 2), (6, 3), (5, 1)] {
        for round in 0..10 {
            let costs = random_matrix(&mut rng, rows, cols, round % 3 == 0);
            let assignment = solve(&costs).unwrap();
            assert_valid(&costs, &assignment.pairs);
            assert!((assignment.total_cost - brute_force(&costs)).abs() < 1e-9);
        }
    }
}

#[test]
fn test_total_cost_is_sum_of_pairs() {
    let mut rng = Lcg(99);
    let costs = random_matrix(&mut rng, 5, 5, false);
    let assignment = solve(&costs).unwrap();
    let sum = assignment.pairs.iter().fold(0.0, |acc, &(r, c)| acc + costs.at(r, c));
    assert_eq!(sum, assignment.total_cost);
}

#[test]
fn test_deterministic_across_runs() {
    let mut rng = Lcg(3);
    for _ in 0..10 {
        let costs = random_matrix(&mut rng, 6, 6, true);
        let first = solve(&costs).unwrap();
        let second = solve(&costs).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_invalid_matrix_rejected_before_solving() {
    let costs = CostMatrix::from_rows(vec![vec![0.1, 0.2], vec![-0.5, 0.3]]).unwrap();
    assert_eq!(
        solve(&costs),
        Err(AssignmentError::InvalidCostMatrix {
            row: 1,
            col: 0,
            value: -0.5
        })
    );
}

#[test]
fn test_large_matrix_stays_valid() {
    let mut rng = Lcg(2024);
    let n = 150;
    let costs = random_matrix(&mut rng, n, n, false);
    let assignment = solve(&costs).unwrap();
    assert_valid(&costs, &assignment.pairs);

    let diagonal: f64 = (0..n).fold(0.0, |acc, i| acc + costs.at(i, i));
    let anti: f64 = (0..n).fold(0.0, |acc, i| acc + costs.at(i, n - 1 - i));
    assert!(assignment.total_cost <= diagonal.min(anti));
}

#[test]
fn test_tied_integer_matrices_up_to_seven() {
    let mut rng = Lcg(11);
    for _ in 0..30 {
        let costs = random_matrix(&mut rng, 7, 7, true);
        let assignment = solve(&costs).unwrap();
        assert_valid(&costs, &assignment.pairs);
        assert_eq!(assignment.total_cost, brute_force(&costs));
    }
}
