//! Assignment solver (Kuhn–Munkres)
//!
//! Finds a minimum-cost perfect matching on a dense cost matrix with the
//! Hungarian algorithm. Rectangular inputs are padded with zero-cost dummy
//! rows or columns; dummy pairs are dropped from the result.
//!
//! Zeros are discovered in row-major order and the working state (row and
//! column offsets, covers, stars and primes) belongs to a single solve call,
//! so the same input always yields the same matching. A solve is `O(n^3)`.

use crate::error::AssignmentError;
use tracing::trace;

/// Dense row-major cost matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap a row-major buffer
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, AssignmentError> {
        if data.len() != rows * cols {
            return Err(AssignmentError::Shape {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows; all rows must have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AssignmentError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(AssignmentError::Shape {
                    rows: n_rows,
                    cols: n_cols,
                    len: data.len() + row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// First NaN, infinite or negative cell, in row-major order
    fn validate(&self) -> Result<(), AssignmentError> {
        for (idx, &value) in self.data.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(AssignmentError::InvalidCostMatrix {
                    row: idx / self.cols.max(1),
                    col: idx % self.cols.max(1),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Square copy padded with zeros
    fn padded(&self) -> (usize, Vec<f64>) {
        let n = self.rows.max(self.cols);
        let mut data = vec![0.0; n * n];
        for r in 0..self.rows {
            let src = &self.data[r * self.cols..(r + 1) * self.cols];
            data[r * n..r * n + self.cols].copy_from_slice(src);
        }
        (n, data)
    }
}

/// Optimal matching of rows to columns
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// (row, col) pairs sorted by row, dummy pairs excluded
    pub pairs: Vec<(usize, usize)>,
    /// Sum of the input costs of `pairs`
    pub total_cost: f64,
}

impl Assignment {
    /// Column assigned to `row`, if it was matched to a real column
    pub fn col_for(&self, row: usize) -> Option<usize> {
        self.pairs
            .binary_search_by_key(&row, |&(r, _)| r)
            .ok()
            .map(|idx| self.pairs[idx].1)
    }
}

/// Solve the assignment problem for `costs`
pub fn solve(costs: &CostMatrix) -> Result<Assignment, AssignmentError> {
    costs.validate()?;

    if costs.rows == 0 || costs.cols == 0 {
        return Ok(Assignment {
            pairs: Vec::new(),
            total_cost: 0.0,
        });
    }

    let (n, data) = costs.padded();
    let mut munkres = Munkres::new(n, data);
    let col_of_row = munkres.run();

    let pairs: Vec<(usize, usize)> = col_of_row
        .into_iter()
        .enumerate()
        .filter(|&(r, c)| r < costs.rows && c < costs.cols)
        .collect();
    let total_cost = pairs.iter().fold(0.0, |acc, &(r, c)| acc + costs.at(r, c));

    Ok(Assignment { pairs, total_cost })
}

/// Working state for one solve
///
/// The reduced matrix is never written back: cell `(i, j)` is
/// `c[i][j] - u[i] - v[j]`. Each uncovered row keeps its smallest reduced
/// cost over the uncovered columns, so finding a zero or the adjustment
/// value is a pass over rows, and one augmentation is `O(n^2)`.
struct Munkres {
    n: usize,
    c: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
    star_in_row: Vec<Option<usize>>,
    star_in_col: Vec<Option<usize>>,
    prime_in_row: Vec<Option<usize>>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    /// Smallest reduced cost of each uncovered row over uncovered columns
    slack: Vec<f64>,
    /// Column holding that cost, lowest index on ties
    slack_col: Vec<usize>,
}

impl Munkres {
    fn new(n: usize, c: Vec<f64>) -> Self {
        Self {
            n,
            c,
            u: vec![0.0; n],
            v: vec![0.0; n],
            star_in_row: vec![None; n],
            star_in_col: vec![None; n],
            prime_in_row: vec![None; n],
            row_covered: vec![false; n],
            col_covered: vec![false; n],
            slack: vec![f64::INFINITY; n],
            slack_col: vec![0; n],
        }
    }

    #[inline]
    fn reduced(&self, row: usize, col: usize) -> f64 {
        (self.c[row * self.n + col] - self.u[row]) - self.v[col]
    }

    /// Returns the column assigned to each row
    fn run(&mut self) -> Vec<usize> {
        self.reduce();
        self.star_initial_zeros();

        let mut augmentations = 0usize;
        let mut adjustments = 0usize;

        while self.cover_starred_columns() < self.n {
            self.init_slack();

            // Prime zeros until an augmenting path starts
            let (row, col) = loop {
                match self.find_uncovered_zero() {
                    Some((row, col)) => {
                        self.prime_in_row[row] = Some(col);
                        match self.star_in_row[row] {
                            Some(star_col) => {
                                self.row_covered[row] = true;
                                self.uncover_col(star_col);
                            }
                            None => break (row, col),
                        }
                    }
                    None => {
                        self.adjust_by_min_uncovered();
                        adjustments += 1;
                    }
                }
            };

            self.augment(row, col);
            augmentations += 1;
        }

        trace!(n = self.n, augmentations, adjustments, "assignment solved");

        (0..self.n)
            .map(|row| self.star_in_row[row].unwrap_or(row))
            .collect()
    }

    /// Subtract each row minimum, then each column minimum
    fn reduce(&mut self) {
        let n = self.n;
        for row in 0..n {
            self.u[row] = self.c[row * n..(row + 1) * n]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
        }
        for col in 0..n {
            self.v[col] = (0..n)
                .map(|row| self.c[row * n + col] - self.u[row])
                .fold(f64::INFINITY, f64::min);
        }
    }

    fn star(&mut self, row: usize, col: usize) {
        self.star_in_row[row] = Some(col);
        self.star_in_col[col] = Some(row);
    }

    /// Star zeros greedily, row-major, so no two share a row or column
    fn star_initial_zeros(&mut self) {
        for row in 0..self.n {
            for col in 0..self.n {
                if self.star_in_row[row].is_none()
                    && self.star_in_col[col].is_none()
                    && self.reduced(row, col) == 0.0
                {
                    self.star(row, col);
                }
            }
        }
    }

    /// Uncover all rows, cover every column holding a star; returns the
    /// number covered
    fn cover_starred_columns(&mut self) -> usize {
        self.row_covered.fill(false);
        let mut covered = 0;
        for col in 0..self.n {
            let starred = self.star_in_col[col].is_some();
            self.col_covered[col] = starred;
            covered += usize::from(starred);
        }
        covered
    }

    /// Offer `(row, col)` as the row's smallest uncovered cell
    #[inline]
    fn consider(&mut self, row: usize, col: usize) {
        let cost = self.reduced(row, col);
        if cost < self.slack[row] || (cost == self.slack[row] && col < self.slack_col[row]) {
            self.slack[row] = cost;
            self.slack_col[row] = col;
        }
    }

    fn init_slack(&mut self) {
        self.slack.fill(f64::INFINITY);
        self.slack_col.fill(0);
        for row in 0..self.n {
            for col in 0..self.n {
                if !self.col_covered[col] {
                    self.consider(row, col);
                }
            }
        }
    }

    fn uncover_col(&mut self, col: usize) {
        self.col_covered[col] = false;
        for row in 0..self.n {
            if !self.row_covered[row] {
                self.consider(row, col);
            }
        }
    }

    /// First uncovered zero in row-major order
    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        (0..self.n)
            .find(|&row| !self.row_covered[row] && self.slack[row] <= 0.0)
            .map(|row| (row, self.slack_col[row]))
    }

    /// Add the smallest uncovered value to covered rows and subtract it from
    /// uncovered columns. Stars and primes are kept.
    fn adjust_by_min_uncovered(&mut self) {
        let h = (0..self.n)
            .filter(|&row| !self.row_covered[row])
            .map(|row| self.slack[row])
            .fold(f64::INFINITY, f64::min);

        for row in 0..self.n {
            if self.row_covered[row] {
                self.u[row] -= h;
            } else {
                self.slack[row] -= h;
            }
        }
        for col in 0..self.n {
            if !self.col_covered[col] {
                self.v[col] += h;
            }
        }
    }

    /// Flip stars and primes along the alternating path starting at the
    /// primed zero (row, col), then drop the remaining primes
    fn augment(&mut self, row: usize, col: usize) {
        let mut path = vec![(row, col)];
        loop {
            let (_, col) = path[path.len() - 1];
            let Some(star_row) = self.star_in_col[col] else {
                break;
            };
            path.push((star_row, col));
            // A starred row on the path was covered by priming, so it holds a prime
            let Some(prime_col) = self.prime_in_row[star_row] else {
                break;
            };
            path.push((star_row, prime_col));
        }

        for &(r, c) in path.iter().skip(1).step_by(2) {
            self.star_in_row[r] = None;
            self.star_in_col[c] = None;
        }
        for &(r, c) in path.iter().step_by(2) {
            self.star(r, c);
        }

        self.prime_in_row.fill(None);
    }
}
