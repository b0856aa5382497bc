//! Rendering of solutions for people and for other programs.

use std::fmt::Write;

use crate::error::Result;
use crate::models::Solution;

/// Renders `solution` as plain text.
///
/// One block per vehicle with its stops and arc distance, followed by the
/// fleet total. Unused vehicles are listed too, as a depot-to-depot route.
///
/// # Examples
///
/// ```
/// use u_vrp::models::{Route, Solution, Visit};
/// use u_vrp::report::to_text;
///
/// let mut route = Route::new(0);
/// for (node, index) in [(0, 0), (2, 2), (0, 3)] {
///     route.push_visit(Visit { node, index, cumuls: vec![] });
/// }
/// route.set_cost(18);
/// let mut solution = Solution::new(Vec::new());
/// solution.add_route(route);
/// solution.set_objective(18);
///
/// let text = to_text(&solution);
/// assert!(text.contains("Route for vehicle 0:\n 0 -> 2 -> 0\n"));
/// assert!(text.ends_with("Total distance of all routes: 18m\n"));
/// ```
pub fn to_text(solution: &Solution) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_text(&mut out, solution);
    out
}

fn write_text(out: &mut String, solution: &Solution) -> std::fmt::Result {
    writeln!(out, "Objective: {}", solution.objective())?;
    for route in solution.routes() {
        writeln!(out, "Route for vehicle {}:", route.vehicle_id())?;
        let stops: Vec<String> = route.nodes().iter().map(usize::to_string).collect();
        writeln!(out, " {}", stops.join(" -> "))?;
        for (d, name) in solution.dimension_names().iter().enumerate() {
            if let Some(value) = route.end_cumul(d) {
                writeln!(out, "{name} at route end: {value}")?;
            }
        }
        writeln!(out, "Distance of the route: {}m", route.cost())?;
        writeln!(out)?;
    }
    if solution.num_unperformed() > 0 {
        let dropped: Vec<String> = solution.unperformed().iter().map(usize::to_string).collect();
        writeln!(out, "Dropped nodes: {}", dropped.join(" "))?;
    }
    writeln!(out, "Total distance of all routes: {}m", solution.total_cost())
}

/// Renders `solution` as pretty-printed JSON.
pub fn to_json(solution: &Solution) -> Result<String> {
    Ok(serde_json::to_string_pretty(solution)?)
}
