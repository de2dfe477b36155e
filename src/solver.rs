//! Phase-driven Munkres solver.
//!
//! The algorithm is a finite-state machine over [`Phase`]; [`step`] performs a
//! single transition on a [`CostMatrix`] so each phase can be exercised on its own.

use nalgebra::DMatrix;
use tracing::{debug, trace};

use crate::error::{AssignmentError, Result};
use crate::matrix::{Cost, CostMatrix, PrimeOutcome};
use crate::score::ScoreProvider;

#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Reduce,
    Star,
    Cover,
    Augment,
    Adjust,
    Done,
}

/// Runs one phase against `matrix` and returns the next phase.
#[doc(hidden)]
pub fn step<T: Cost>(phase: Phase, matrix: &mut CostMatrix<T>) -> Result<Phase> {
    let next = match phase {
        Phase::Init if matrix.rows() == 0 => Phase::Done,
        Phase::Init => Phase::Reduce,
        Phase::Reduce => {
            matrix.reduce_rows();
            Phase::Star
        }
        Phase::Star => {
            matrix.star_zeroes();
            Phase::Cover
        }
        Phase::Cover => {
            let covered = matrix.cover_starred_columns()?;
            trace!(covered, needed = matrix.rows(), "covered starred columns");
            if covered == matrix.rows() {
                Phase::Done
            } else {
                Phase::Augment
            }
        }
        Phase::Augment => match matrix.find_uncovered_zero() {
            Some(zero) => match matrix.prime_and_augment(zero)? {
                PrimeOutcome::Covered => Phase::Augment,
                PrimeOutcome::Augmented => Phase::Cover,
            },
            None => Phase::Adjust,
        },
        Phase::Adjust => {
            let delta = matrix.adjust_uncovered()?;
            trace!(?delta, "adjusted uncovered costs");
            Phase::Augment
        }
        Phase::Done => Phase::Done,
    };

    trace!(from = ?phase, to = ?next, "phase transition");
    Ok(next)
}

// Each of the at most `rows` matching rounds takes O(rows) steps.
fn step_budget(rows: usize) -> usize {
    4 * (rows + 1) * (rows + 1) + 8
}

fn run<T: Cost>(matrix: &mut CostMatrix<T>) -> Result<()> {
    let budget = step_budget(matrix.rows());
    let mut phase = Phase::Init;
    let mut steps = 0;

    while phase != Phase::Done {
        if steps == budget {
            return Err(AssignmentError::InternalInvariant(format!(
                "no complete matching after {steps} phase steps"
            )));
        }
        phase = step(phase, matrix)?;
        steps += 1;
    }

    debug!(
        rows = matrix.rows(),
        cols = matrix.cols(),
        transposed = matrix.is_transposed(),
        steps,
        "found optimal matching"
    );
    Ok(())
}

/// One pairing of the optimal assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a, A, B> {
    pub left_index: usize,
    pub right_index: usize,
    pub left: &'a A,
    pub right: &'a B,
}

impl<'a, A, B> Assignment<'a, A, B> {
    pub fn pair(&self) -> (&'a A, &'a B) {
        (self.left, self.right)
    }

    pub fn indices(&self) -> (usize, usize) {
        (self.left_index, self.right_index)
    }
}

/// Optimal assignment and the total score of its pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<'a, A, B, T> {
    pub score: T,
    /// Ordered by `left_index`.
    pub assignments: Vec<Assignment<'a, A, B>>,
}

impl<'a, A, B, T> Solution<'a, A, B, T> {
    pub fn pairs(&self) -> impl Iterator<Item = (&'a A, &'a B)> + '_ {
        self.assignments.iter().map(Assignment::pair)
    }
}

/// Pairs every entity of the shorter of `left` and `right` with a distinct entity
/// of the other so that the summed score is maximal.
///
/// Either side may be empty, in which case the solution is empty with a score of zero.
///
/// ```
/// use assignment_solver::{solve, SuitabilityScore};
///
/// let addresses = ["44 Fake Dr", "123 Elm St"];
/// let drivers = ["Daniel Davidson", "Ellen Grey", "Kurt Vonnegut"];
/// let solution = solve(&addresses, &drivers, &SuitabilityScore).unwrap();
/// assert_eq!(solution.assignments.len(), 2);
/// ```
pub fn solve<'a, A, B, T, P>(
    left: &'a [A],
    right: &'a [B],
    provider: &P,
) -> Result<Solution<'a, A, B, T>>
where
    T: Cost,
    P: ScoreProvider<A, B, T> + ?Sized,
{
    let mut matrix = CostMatrix::build(left, right, provider)?;
    run(&mut matrix)?;

    let assignments: Vec<_> = matrix
        .extract_assignments()
        .into_iter()
        .map(|(i, j)| Assignment {
            left_index: i,
            right_index: j,
            left: &left[i],
            right: &right[j],
        })
        .collect();

    let score = assignments
        .iter()
        .fold(T::zero(), |acc, a| acc + provider.score(a.left, a.right));

    debug!(
        left = left.len(),
        right = right.len(),
        assigned = assignments.len(),
        score = ?score,
        "solved assignment"
    );
    Ok(Solution { score, assignments })
}

/// Minimum-cost assignment of a raw cost matrix.
///
/// Returns `(row, col)` pairs in the orientation of `costs`, one per row when the
/// matrix is wide and one per column when it is tall.
pub fn minimize<T: Cost>(costs: DMatrix<T>) -> Result<Vec<(usize, usize)>> {
    let mut matrix = CostMatrix::from_costs(costs)?;
    run(&mut matrix)?;
    Ok(matrix.extract_assignments())
}

#[cfg(test)]
mod test {
    use nalgebra::DMatrix;

    use super::*;
    use crate::matrix::Mark;
    use crate::score::SuitabilityScore;

    fn assert_costs(
        costs: &DMatrix<f64>,
        assignments: &[(usize, usize)],
        cost_expected: f64,
        epsilon: f64,
    ) -> bool {
        (assignments
            .iter()
            .map(|&a| costs.get(a).expect("within cost bounds"))
            .sum::<f64>()
            - cost_expected)
            .abs()
            < epsilon
    }

    fn assert_feasible(m: &CostMatrix<f64>) {
        for row in 0..m.rows() {
            let stars = (0..m.cols()).filter(|&c| m.mark(row, c) == Mark::Star).count();
            assert!(stars <= 1, "row {row} holds {stars} stars");
        }
        for col in 0..m.cols() {
            let stars = (0..m.rows()).filter(|&r| m.mark(r, col) == Mark::Star).count();
            assert!(stars <= 1, "column {col} holds {stars} stars");
        }
    }

    #[test]
    fn basic_two() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(2, 2,
            &[
                1., 2.,
                2., 1.,
            ]
        );
        let assignments = minimize(costs.clone()).unwrap();
        assert!(assert_costs(&costs, &assignments, 2., f64::EPSILON));
    }

    #[test]
    fn basic_two_rev() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(2, 2,
            &[
                1., 2.,
                2., 100.
            ]
        );
        let assignments = minimize(costs.clone()).unwrap();
        assert!(assert_costs(&costs, &assignments, 4., f64::EPSILON));
    }

    #[test]
    fn basic_four() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(4, 4,
            &[
                82., 83., 69., 92.,
                77., 37., 49., 92.,
                11., 69.,  5., 86.,
                 8.,  9., 98., 23.,
            ]
        );
        let assignments = minimize(costs.clone()).unwrap();
        assert!(assert_costs(&costs, &assignments, 140., f64::EPSILON));
    }

    #[test]
    fn basic_five() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(5, 5,
            &[
                10., 5.,13.,15.,16.,
                 3., 9.,18.,13., 6.,
                10., 7., 2., 2., 2.,
                 7.,11., 9., 7.,12.,
                 7., 9.,10., 4.,12.,
            ]
        );
        let assignments = minimize(costs.clone()).unwrap();
        assert!(assert_costs(&costs, &assignments, 23., f64::EPSILON));
    }

    #[test]
    fn basic_five_2() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(5, 5,
            &[
                20., 15., 18., 20., 25.,
                18., 20., 12., 14., 15.,
                21., 23., 25., 27., 25.,
                17., 18., 21., 23., 20.,
                18., 18., 16., 19., 20.,
            ]
        );
        let assignments = minimize(costs.clone()).unwrap();
        assert_eq!(assignments.len(), 5);
        assert!(assert_costs(&costs, &assignments, 86., f64::EPSILON));
    }

    #[test]
    fn tall_matrix_is_answered_in_caller_orientation() {
        #[rustfmt::skip]
        let costs = DMatrix::from_row_slice(3, 2,
            &[
                4., 1.,
                2., 8.,
                3., 3.,
            ]
        );
        let assignments = minimize(costs.clone()).unwrap();
        assert_eq!(assignments, vec![(0, 1), (1, 0)]);
        assert!(assert_costs(&costs, &assignments, 3., f64::EPSILON));
    }

    #[test]
    fn single_precision_costs() {
        let costs = DMatrix::<f32>::from_row_slice(2, 2, &[3., 1., 1., 3.]);
        assert_eq!(minimize(costs).unwrap(), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn empty_left_side_is_vacuously_solved() {
        let addresses: [&str; 0] = [];
        let drivers = ["Moe", "Larry"];
        let solution = solve(&addresses, &drivers, &SuitabilityScore).unwrap();

        assert!(solution.assignments.is_empty());
        assert_eq!(solution.score, 0.);
    }

    #[test]
    fn empty_right_side_is_vacuously_solved() {
        let addresses = ["main", "elm"];
        let drivers: [&str; 0] = [];
        let solution = solve(&addresses, &drivers, &SuitabilityScore).unwrap();

        assert!(solution.assignments.is_empty());
        assert_eq!(solution.score, 0.);
    }

    #[test]
    fn init_finishes_immediately_without_rows() {
        let mut m = CostMatrix::<f64>::from_rows(&[]).unwrap();
        assert_eq!(step(Phase::Init, &mut m).unwrap(), Phase::Done);
        assert_eq!(step(Phase::Done, &mut m).unwrap(), Phase::Done);
    }

    #[test]
    fn rectangular_pairing_leaves_extra_driver_unmatched() {
        let addresses = ["main", "elm"];
        let drivers = ["Moe", "Larry", "Curly"];
        let costs = [[1., 2., 3.], [2., 4., 6.]];
        // lower cost means a better score
        let provider = |a: &&str, d: &&str| {
            let i = addresses.iter().position(|x| x == a).expect("known address");
            let j = drivers.iter().position(|x| x == d).expect("known driver");
            -costs[i][j]
        };

        let solution = solve(&addresses, &drivers, &provider).unwrap();
        let pairs: Vec<_> = solution.pairs().map(|(a, d)| (*a, *d)).collect();

        assert_eq!(pairs, vec![("main", "Larry"), ("elm", "Moe")]);
        assert_eq!(solution.score, -4.);
    }

    #[test]
    fn multiple_augmentations_grow_the_matching() {
        #[rustfmt::skip]
        let mut m = CostMatrix::from_rows(&[
            vec![0., 0., 0.],
            vec![0., 4., 6.],
            vec![0., 7., 3.],
        ]).unwrap();

        let mut phase = Phase::Init;
        let mut cover_counts = Vec::new();
        let mut augmentations = 0;
        let mut steps = 0;
        while phase != Phase::Done {
            let next = step(phase, &mut m).unwrap();
            match (phase, next) {
                (Phase::Star, _) => assert_feasible(&m),
                (Phase::Cover, _) => cover_counts.push(m.star_count()),
                (Phase::Augment, Phase::Cover) => {
                    augmentations += 1;
                    assert_feasible(&m);
                }
                _ => {}
            }
            phase = next;
            steps += 1;
            assert!(steps < 64, "solver did not converge");
        }

        assert_eq!(augmentations, 2);
        assert_eq!(cover_counts, vec![1, 2, 3]);
        assert_eq!(m.extract_assignments(), vec![(0, 1), (1, 0), (2, 2)]);
    }

    #[test]
    fn coverage_grows_between_cover_visits() {
        #[rustfmt::skip]
        let mut m = CostMatrix::from_rows(&[
            vec![10., 5., 13., 15., 16.],
            vec![ 3., 9., 18., 13.,  6.],
            vec![10., 7.,  2.,  2.,  2.],
            vec![ 7., 11., 9.,  7., 12.],
            vec![ 7., 9., 10.,  4., 12.],
        ]).unwrap();

        let mut phase = Phase::Init;
        let mut counts = Vec::new();
        while phase != Phase::Done {
            let next = step(phase, &mut m).unwrap();
            if phase == Phase::Cover {
                counts.push((0..m.cols()).filter(|&c| m.is_col_covered(c)).count());
            }
            phase = next;
        }

        assert_eq!(counts.last(), Some(&5));
        assert!(counts.windows(2).all(|w| w[0] < w[1]), "{counts:?}");
    }

    #[test]
    fn tall_input_maps_back_to_original_sides() {
        let addresses = ["main", "elm", "forest lane"];
        let drivers = ["Huck", "Tom"];
        let solution = solve(&addresses, &drivers, &SuitabilityScore).unwrap();

        assert_eq!(solution.assignments.len(), 2);
        let mut drivers_used: Vec<_> = solution.assignments.iter().map(|a| a.right_index).collect();
        drivers_used.sort_unstable();
        assert_eq!(drivers_used, vec![0, 1]);

        let best = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]
            .iter()
            .map(|&(huck, tom)| {
                SuitabilityScore::suitability(addresses[huck], "Huck")
                    + SuitabilityScore::suitability(addresses[tom], "Tom")
            })
            .fold(f64::MIN, f64::max);
        assert!((solution.score - best).abs() < 1e-9);
    }

    #[test]
    fn score_is_recomputed_from_the_provider() {
        let addresses = ["44 Fake Dr", "123 Elm St", "7 Oak Ave"];
        let drivers = ["Daniel Davidson", "Ellen Grey", "Kurt Vonnegut"];
        let solution = solve(&addresses, &drivers, &SuitabilityScore).unwrap();

        let expected: f64 = solution
            .pairs()
            .map(|(a, d)| SuitabilityScore::suitability(a, d))
            .sum();
        assert_eq!(solution.score, expected);
    }

    #[test]
    fn non_finite_scores_abort() {
        let left = [1, 2];
        let right = [3, 4];
        let provider = |a: &i32, b: &i32| if a + b == 6 { f64::INFINITY } else { 1. };

        assert!(matches!(
            solve(&left, &right, &provider),
            Err(AssignmentError::ScoreProvider { .. })
        ));
    }

    #[test]
    fn raw_costs_must_be_finite() {
        let costs = DMatrix::from_row_slice(1, 2, &[f64::NAN, 1.]);
        assert!(matches!(
            minimize(costs),
            Err(AssignmentError::InvalidInput(_))
        ));
    }
}
