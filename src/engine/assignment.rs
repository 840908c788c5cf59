// Copyright © 2024 blitzbeaver contributors

//! Minimum cost bipartite assignment (Hungarian method with potentials).

/// Assigns rows to columns so that the total cost is minimal.
///
/// Every row of `costs` must have the same length. The smaller side is fully
/// assigned; the returned vector maps each row to its column, or `None` when
/// there are more rows than columns and the row was left out. The result is a
/// pure function of `costs`.
pub fn min_cost_assignment(costs: &[Vec<f64>]) -> Vec<Option<usize>> {
    let num_rows = costs.len();
    let num_cols = costs.first().map_or(0, Vec::len);
    if num_rows == 0 || num_cols == 0 {
        return vec![None; num_rows];
    }
    debug_assert!(costs.iter().all(|row| row.len() == num_cols));

    if num_rows <= num_cols {
        solve(num_rows, num_cols, |i, j| costs[i][j])
    } else {
        let by_col = solve(num_cols, num_rows, |i, j| costs[j][i]);
        let mut by_row = vec![None; num_rows];
        for (col, row) in by_col.into_iter().enumerate() {
            if let Some(row) = row {
                by_row[row] = Some(col);
            }
        }
        by_row
    }
}

/// Hungarian method for `n <= m`, indices shifted by one so that 0 is a
/// sentinel column.
fn solve(n: usize, m: usize, cost: impl Fn(usize, usize) -> f64) -> Vec<Option<usize>> {
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; m + 1];
    let mut owner = vec![0_usize; m + 1];
    let mut way = vec![0_usize; m + 1];

    for row in 1..=n {
        owner[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[col0] = true;
            let row0 = owner[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0;
            for col in 1..=m {
                if used[col] {
                    continue;
                }
                let slack = cost(row0 - 1, col - 1) - u[row0] - v[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }
            for col in 0..=m {
                if used[col] {
                    u[owner[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }
            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }
        loop {
            let col1 = way[col0];
            owner[col0] = owner[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![None; n];
    for col in 1..=m {
        if owner[col] != 0 {
            assignment[owner[col] - 1] = Some(col - 1);
        }
    }
    assignment
}
