//! End-to-end scenarios S1-S6 from the governing specification's §8.

#[test]
fn s1_single_linear_equation()
{
    let (_, soln) = nexsys::solve("x + 1 = 0", 1e-4, 100).unwrap();
    assert!((soln["x"] - (-1.0)).abs() < 1e-4);
}

#[test]
fn s2_quadratic_picks_root_nearest_guess()
{
    let (_, positive) = nexsys::solve("x^2 - 4 = 0\nguess 1 for x", 1e-4, 100).unwrap();
    assert!((positive["x"] - 2.0).abs() < 1e-4);

    let (_, negative) = nexsys::solve("x^2 - 4 = 0\nguess -1 for x", 1e-4, 100).unwrap();
    assert!((negative["x"] - (-2.0)).abs() < 1e-4);
}

#[test]
fn s3_two_by_two_linear_system()
{
    let (_, soln) = nexsys::solve("x + y = 3\nx - y = 1", 1e-4, 100).unwrap();
    assert!((soln["x"] - 2.0).abs() < 1e-4);
    assert!((soln["y"] - 1.0).abs() < 1e-4);
}

#[test]
fn s4_chained_single_unknown_solves()
{
    let (_, soln) = nexsys::solve("const g = 9.81\nf = g * m\nm = 2", 1e-4, 100).unwrap();
    assert!((soln["m"] - 2.0).abs() < 1e-4);
    assert!((soln["f"] - 19.62).abs() < 1e-3);
}

#[test]
fn s5_comment_and_domain_directive()
{
    let system = "// find positive root\nkeep x on [0, 10]\nx^2 - 4 = 0";
    let (_, soln) = nexsys::solve(system, 1e-4, 200).unwrap();
    assert!((soln["x"] - 2.0).abs() < 1e-4);
}

#[test]
fn s6_conditional_selects_branch_from_guess()
{
    let system = "if [ a < 0 ]\n-a = 5\nelse\na = 5\nend\nguess -1 for a";
    let (_, soln) = nexsys::solve(system, 1e-4, 200).unwrap();
    assert!((soln["a"] - (-5.0)).abs() < 1e-3);
}

#[test]
fn determinism_same_input_yields_identical_output_across_runs()
{
    let system = "x + y = 3\nx - y = 1\nz = x + y";
    let (_, first) = nexsys::solve(system, 1e-9, 200).unwrap();
    let (_, second) = nexsys::solve(system, 1e-9, 200).unwrap();

    let mut first_keys: Vec<&String> = first.keys().collect();
    let mut second_keys: Vec<&String> = second.keys().collect();
    first_keys.sort();
    second_keys.sort();
    assert_eq!(first_keys, second_keys);

    for key in first_keys
    {
        assert_eq!(first[key], second[key]);
    }
}

#[test]
fn underconstrained_input_reports_the_stuck_equation()
{
    let err = nexsys::solve("x + y = 3", 1e-9, 100).unwrap_err();
    assert!(err.to_string().contains("x + y = 3"));
}

#[test]
fn overconstrained_input_is_still_solved_from_the_consistent_subset()
{
    // Third equation is redundant (x - y = 1 follows from the first two) so
    // the system is still fully determined by the first two equations.
    let system = "x + y = 3\nx - y = 1\nx + y = 3";
    let (_, soln) = nexsys::solve(system, 1e-4, 100).unwrap();
    assert!((soln["x"] - 2.0).abs() < 1e-4);
    assert!((soln["y"] - 1.0).abs() < 1e-4);
}
