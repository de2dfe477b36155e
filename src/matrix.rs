//! Cost matrix and the marking primitives of the Munkres algorithm.
//!
//! A [`CostMatrix`] always has at most as many rows as columns; tall inputs are
//! transposed on construction and mapped back when the assignment is extracted.

use std::ops::{AddAssign, SubAssign};

use nalgebra::DMatrix;
use num_traits::Float;

use crate::error::{AssignmentError, Result};
use crate::score::ScoreProvider;

/// Element type of a cost matrix.
pub trait Cost: nalgebra::Scalar + Float + AddAssign + SubAssign {}

impl<T> Cost for T where T: nalgebra::Scalar + Float + AddAssign + SubAssign {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    None,
    Star,
    Prime,
}

/// What [`CostMatrix::prime_and_augment`] did with a primed zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeOutcome {
    /// The row already held a star: the row is now covered and the star's column uncovered.
    Covered,
    /// An augmenting path was flipped; the matching grew by one.
    Augmented,
}

#[derive(Debug, Clone)]
pub struct CostMatrix<T: Cost> {
    costs: DMatrix<T>,
    marks: DMatrix<Mark>,
    covered_rows: Vec<bool>,
    covered_cols: Vec<bool>,
    transposed: bool,
}

impl<T: Cost> CostMatrix<T> {
    /// Builds the matrix of negated scores for every `(left, right)` pair.
    pub fn build<A, B, P>(left: &[A], right: &[B], provider: &P) -> Result<Self>
    where
        P: ScoreProvider<A, B, T> + ?Sized,
    {
        let mut costs = DMatrix::from_element(left.len(), right.len(), T::zero());
        for (row, a) in left.iter().enumerate() {
            for (col, b) in right.iter().enumerate() {
                let score = provider.score(a, b);
                if !score.is_finite() {
                    return Err(AssignmentError::ScoreProvider {
                        row,
                        col,
                        value: score.to_f64().unwrap_or(f64::NAN),
                    });
                }
                costs[(row, col)] = -score;
            }
        }

        Ok(Self::oriented(costs))
    }

    /// Adopts `costs` as-is (no negation). Every entry must be finite.
    pub fn from_costs(costs: DMatrix<T>) -> Result<Self> {
        // storage is column-major
        if let Some(index) = costs.iter().position(|c| !c.is_finite()) {
            let (row, col) = (index % costs.nrows(), index / costs.nrows());
            return Err(AssignmentError::InvalidInput(format!(
                "cost at ({row}, {col}) is not finite"
            )));
        }

        Ok(Self::oriented(costs))
    }

    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().position(|r| r.len() != width) {
            return Err(AssignmentError::InvalidInput(format!(
                "row {row} has {} entries, expected {width}",
                rows[row].len()
            )));
        }

        Self::from_costs(DMatrix::from_fn(rows.len(), width, |i, j| rows[i][j]))
    }

    fn oriented(costs: DMatrix<T>) -> Self {
        let transposed = costs.nrows() > costs.ncols();
        let costs = if transposed { costs.transpose() } else { costs };
        let (rows, cols) = costs.shape();

        Self {
            costs,
            marks: DMatrix::from_element(rows, cols, Mark::None),
            covered_rows: vec![false; rows],
            covered_cols: vec![false; cols],
            transposed,
        }
    }

    /// Number of assignments a complete matching holds.
    pub fn rows(&self) -> usize {
        self.costs.nrows()
    }

    pub fn cols(&self) -> usize {
        self.costs.ncols()
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    pub fn costs(&self) -> &DMatrix<T> {
        &self.costs
    }

    pub fn mark(&self, row: usize, col: usize) -> Mark {
        self.marks[(row, col)]
    }

    pub fn star_count(&self) -> usize {
        self.marks.iter().filter(|&&m| m == Mark::Star).count()
    }

    pub fn is_row_covered(&self, row: usize) -> bool {
        self.covered_rows[row]
    }

    pub fn is_col_covered(&self, col: usize) -> bool {
        self.covered_cols[col]
    }

    /// Subtracts each row's minimum from the row, leaving at least one zero per row.
    pub fn reduce_rows(&mut self) {
        for mut row in self.costs.row_iter_mut() {
            let min = row.iter().fold(T::infinity(), |acc, &c| acc.min(c));
            row.iter_mut().for_each(|c| *c -= min);
        }
    }

    /// Greedily stars zeroes on distinct rows and columns, scanning row by row.
    pub fn star_zeroes(&mut self) {
        let (h, w) = self.costs.shape();
        let mut starred_rows = vec![false; h];
        let mut starred_cols = vec![false; w];

        for row in 0..h {
            for col in 0..w {
                if starred_rows[row] || starred_cols[col] {
                    continue;
                }

                if self.costs[(row, col)].is_zero() {
                    self.marks[(row, col)] = Mark::Star;
                    starred_rows[row] = true;
                    starred_cols[col] = true;
                }
            }
        }
    }

    /// Covers exactly the columns that hold a star and returns how many there are.
    pub fn cover_starred_columns(&mut self) -> Result<usize> {
        let (h, w) = self.marks.shape();
        let mut stars_per_row = vec![0usize; h];

        for col in 0..w {
            let mut stars = 0;
            for row in 0..h {
                if self.marks[(row, col)] == Mark::Star {
                    stars += 1;
                    stars_per_row[row] += 1;
                }
            }

            if stars > 1 {
                return Err(AssignmentError::InternalInvariant(format!(
                    "column {col} holds {stars} starred zeroes"
                )));
            }
            self.covered_cols[col] = stars == 1;
        }

        if let Some(row) = stars_per_row.iter().position(|&n| n > 1) {
            return Err(AssignmentError::InternalInvariant(format!(
                "row {row} holds {} starred zeroes",
                stars_per_row[row]
            )));
        }

        Ok(self.covered_cols.iter().filter(|&&c| c).count())
    }

    pub fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        let (h, w) = self.costs.shape();
        for row in 0..h {
            if self.covered_rows[row] {
                continue;
            }

            for col in 0..w {
                if self.covered_cols[col] {
                    continue;
                }

                if self.costs[(row, col)].is_zero() {
                    return Some((row, col));
                }
            }
        }

        None
    }

    /// Primes the uncovered zero at `(row, col)`.
    ///
    /// If the row holds a star the prime only shifts coverage. Otherwise the prime
    /// starts an augmenting path: prime, star in its column, prime in that star's
    /// row, and so on until a column without a star. Every star on the path is
    /// removed, every prime on it becomes a star, and all primes and coverage are
    /// cleared.
    pub fn prime_and_augment(&mut self, (row, col): (usize, usize)) -> Result<PrimeOutcome> {
        self.marks[(row, col)] = Mark::Prime;

        if let Some(star_col) = self.find_in_row(row, Mark::Star) {
            self.covered_rows[row] = true;
            self.covered_cols[star_col] = false;
            return Ok(PrimeOutcome::Covered);
        }

        let max_len = 2 * self.rows() + 1;
        let mut path = vec![(row, col)];
        let mut current_col = col;
        while let Some(star_row) = self.find_in_col(current_col, Mark::Star) {
            let prime_col = self.find_in_row(star_row, Mark::Prime).ok_or_else(|| {
                AssignmentError::InternalInvariant(format!(
                    "star at ({star_row}, {current_col}) has no primed zero in its row"
                ))
            })?;

            path.push((star_row, current_col));
            path.push((star_row, prime_col));
            if path.len() > max_len {
                return Err(AssignmentError::InternalInvariant(
                    "augmenting path revisits a row".to_string(),
                ));
            }
            current_col = prime_col;
        }

        for cell in path {
            let flipped = match self.marks[cell] {
                Mark::Star => Mark::None,
                Mark::Prime => Mark::Star,
                Mark::None => Mark::None,
            };
            self.marks[cell] = flipped;
        }

        self.marks
            .iter_mut()
            .filter(|m| **m == Mark::Prime)
            .for_each(|m| *m = Mark::None);
        self.covered_rows.fill(false);
        self.covered_cols.fill(false);

        Ok(PrimeOutcome::Augmented)
    }

    /// Adds the smallest uncovered cost to every covered row and subtracts it from
    /// every uncovered column. Returns the amount applied.
    pub fn adjust_uncovered(&mut self) -> Result<T> {
        let (h, w) = self.costs.shape();
        let mut min: Option<T> = None;
        for row in 0..h {
            if self.covered_rows[row] {
                continue;
            }

            for col in 0..w {
                if self.covered_cols[col] {
                    continue;
                }

                let curr = self.costs[(row, col)];
                min = Some(min.map_or(curr, |m| m.min(curr)));
            }
        }

        let delta = min.ok_or_else(|| {
            AssignmentError::InternalInvariant("no uncovered cell left to adjust".to_string())
        })?;
        if !(delta > T::zero() && delta.is_finite()) {
            return Err(AssignmentError::InternalInvariant(format!(
                "uncovered minimum {delta:?} is not a positive finite value"
            )));
        }

        for row in 0..h {
            if self.covered_rows[row] {
                self.costs.row_mut(row).iter_mut().for_each(|c| *c += delta);
            }
        }

        for col in 0..w {
            if !self.covered_cols[col] {
                self.costs.column_mut(col).iter_mut().for_each(|c| *c -= delta);
            }
        }

        Ok(delta)
    }

    /// Starred cells as `(left, right)` indices in the caller's orientation,
    /// ordered by the left index.
    pub fn extract_assignments(&self) -> Vec<(usize, usize)> {
        let (h, w) = self.marks.shape();
        let mut assignments: Vec<(usize, usize)> = (0..h)
            .flat_map(|row| (0..w).map(move |col| (row, col)))
            .filter(|&cell| self.marks[cell] == Mark::Star)
            .map(|(row, col)| if self.transposed { (col, row) } else { (row, col) })
            .collect();
        assignments.sort_unstable();
        assignments
    }

    fn find_in_row(&self, row: usize, mark: Mark) -> Option<usize> {
        (0..self.cols()).find(|&col| self.marks[(row, col)] == mark)
    }

    fn find_in_col(&self, col: usize, mark: Mark) -> Option<usize> {
        (0..self.rows()).find(|&row| self.marks[(row, col)] == mark)
    }
}
