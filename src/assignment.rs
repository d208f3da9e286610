//! Optimal one-to-one matching between discovered and target colors
//!
//! Matching is the assignment problem on a square cost matrix of RGB
//! distances. Two solvers sit behind [`AssignmentSolver`]:
//!
//! - [`Exhaustive`] tries every permutation, O(k!·k). Ties resolve to the
//!   first minimum in lexicographic order. Only usable for small palettes.
//! - [`Hungarian`] is Kuhn-Munkres with row/column potentials, O(k³).
//!   Equally optimal in total cost; ties may resolve differently.

use crate::error::TileError;
use crate::palette::Rgb;
use crate::remap::ColorMapping;

/// Largest palette [`Strategy::Auto`] hands to the exhaustive search (8! = 40320)
pub const EXHAUSTIVE_LIMIT: usize = 8;

/// Totals closer than this count as equal, so summation order cannot
/// break a tie
const TIE_TOLERANCE: f64 = 1e-9;

/// Square matrix of assignment costs, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    costs: Vec<f64>,
}

impl CostMatrix {
    /// Euclidean distance from every `rows` color to every `cols` color
    pub fn from_colors(rows: &[Rgb], cols: &[Rgb]) -> Result<Self, TileError> {
        if rows.len() != cols.len() {
            return Err(TileError::PaletteSizeMismatch {
                discovered: rows.len(),
                target: cols.len(),
            });
        }

        let costs = rows
            .iter()
            .flat_map(|r| cols.iter().map(move |c| r.distance(c)))
            .collect();

        Ok(Self {
            size: rows.len(),
            costs,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.costs[row * self.size + col]
    }

    /// Total cost of assigning row `i` to column `assignment[i]`
    pub fn total(&self, assignment: &[usize]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .map(|(row, &col)| self.get(row, col))
            .sum()
    }
}

/// Solves the minimum-cost perfect matching on a square cost matrix.
///
/// The returned vector maps each row index to a distinct column index.
pub trait AssignmentSolver {
    fn solve(&self, costs: &CostMatrix) -> Vec<usize>;
}

/// Brute-force permutation search
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl AssignmentSolver for Exhaustive {
    fn solve(&self, costs: &CostMatrix) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..costs.size()).collect();
        let mut best = perm.clone();
        let mut best_cost = f64::INFINITY;

        loop {
            let cost = costs.total(&perm);
            if cost < best_cost - TIE_TOLERANCE {
                best_cost = cost;
                best.copy_from_slice(&perm);
            }
            if !next_permutation(&mut perm) {
                break;
            }
        }

        best
    }
}

/// Advance to the next permutation in lexicographic order.
/// Returns false once the last permutation has been visited.
fn next_permutation(perm: &mut [usize]) -> bool {
    if perm.len() < 2 {
        return false;
    }

    let Some(pivot) = (0..perm.len() - 1).rev().find(|&i| perm[i] < perm[i + 1]) else {
        return false;
    };

    let successor = (pivot + 1..perm.len())
        .rev()
        .find(|&j| perm[j] > perm[pivot])
        .unwrap_or(pivot + 1);

    perm.swap(pivot, successor);
    perm[pivot + 1..].reverse();
    true
}

/// Kuhn-Munkres (Hungarian) algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct Hungarian;

impl AssignmentSolver for Hungarian {
    fn solve(&self, costs: &CostMatrix) -> Vec<usize> {
        let n = costs.size();
        if n == 0 {
            return Vec::new();
        }

        // 1-based bookkeeping; index 0 is the virtual root column.
        // col_owner[j] = row currently matched to column j (0 = free)
        let mut row_pot = vec![0.0f64; n + 1];
        let mut col_pot = vec![0.0f64; n + 1];
        let mut col_owner = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for row in 1..=n {
            col_owner[0] = row;
            let mut col = 0;
            let mut min_slack = vec![f64::INFINITY; n + 1];
            let mut used = vec![false; n + 1];

            loop {
                used[col] = true;
                let owner = col_owner[col];
                let mut delta = f64::INFINITY;
                let mut next_col = 0;

                for j in 1..=n {
                    if used[j] {
                        continue;
                    }
                    let slack = costs.get(owner - 1, j - 1) - row_pot[owner] - col_pot[j];
                    if slack < min_slack[j] {
                        min_slack[j] = slack;
                        way[j] = col;
                    }
                    if min_slack[j] < delta {
                        delta = min_slack[j];
                        next_col = j;
                    }
                }

                for j in 0..=n {
                    if used[j] {
                        row_pot[col_owner[j]] += delta;
                        col_pot[j] -= delta;
                    } else {
                        min_slack[j] -= delta;
                    }
                }

                col = next_col;
                if col_owner[col] == 0 {
                    break;
                }
            }

            // Flip the augmenting path back to the root
            loop {
                let prev = way[col];
                col_owner[col] = col_owner[prev];
                col = prev;
                if col == 0 {
                    break;
                }
            }
        }

        let mut assignment = vec![0usize; n];
        for j in 1..=n {
            assignment[col_owner[j] - 1] = j - 1;
        }
        assignment
    }
}

/// Which solver [`match_palettes`] uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    Exhaustive,
    Hungarian,
    /// Exhaustive up to [`EXHAUSTIVE_LIMIT`] colors, Hungarian above
    #[default]
    Auto,
}

impl Strategy {
    fn solver(self, size: usize) -> &'static dyn AssignmentSolver {
        match self {
            Strategy::Exhaustive => &Exhaustive,
            Strategy::Hungarian => &Hungarian,
            Strategy::Auto if size <= EXHAUSTIVE_LIMIT => &Exhaustive,
            Strategy::Auto => &Hungarian,
        }
    }
}

/// Pair each discovered color with a distinct target color so that the
/// summed RGB distance is globally minimal.
pub fn match_palettes(
    discovered: &[Rgb],
    target: &[Rgb],
    strategy: Strategy,
) -> Result<ColorMapping, TileError> {
    let costs = CostMatrix::from_colors(discovered, target)?;
    let assignment = strategy.solver(costs.size()).solve(&costs);

    tracing::debug!(
        "Matched {} colors ({:?}), total distance {:.2}",
        costs.size(),
        strategy,
        costs.total(&assignment)
    );

    Ok(assignment
        .iter()
        .enumerate()
        .map(|(i, &j)| (discovered[i], target[j]))
        .collect())
}
