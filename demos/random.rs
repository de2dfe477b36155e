use assignment_solver::minimize;

const ROWS: usize = 48;
const COLS: usize = 64;
const N: usize = 100;

fn main() -> assignment_solver::Result<()> {
    let mut total_cost = 0.;
    for _ in 0..N {
        let costs = nalgebra::DMatrix::<f64>::new_random(ROWS, COLS);
        let assignments = minimize(costs.clone())?;
        total_cost += assignments.iter().map(|&a| costs[a]).sum::<f64>();
    }

    println!("total: {total_cost}");
    Ok(())
}
