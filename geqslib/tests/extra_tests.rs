use geqslib::shunting::new_context;
use geqslib::solve_equation_with_context;

#[test]
fn solves_simple_equation_through_the_crate_entry_point()
{
    let ctx = new_context();
    let value = solve_equation_with_context("x + 2 = 0", &ctx, 1.0, f64::NEG_INFINITY, f64::INFINITY, 1e-9, 100)
        .unwrap()
        .unwrap();
    assert!((value - (-2.0)).abs() < 1e-4);
}

#[test]
fn two_unknowns_returns_none_rather_than_erroring()
{
    let ctx = new_context();
    let result = solve_equation_with_context("x + y = 0", &ctx, 1.0, f64::NEG_INFINITY, f64::INFINITY, 1e-9, 100).unwrap();
    assert!(result.is_none());
}

#[test]
fn domain_clamp_keeps_guess_inside_bounds_while_converging()
{
    let ctx = new_context();
    let value = solve_equation_with_context("x^2 - 9 = 0", &ctx, 10.0, 0.0, 10.0, 1e-9, 200)
        .unwrap()
        .unwrap();
    assert!((value - 3.0).abs() < 1e-4);
}

#[test]
fn builtin_functions_and_constants_compose_in_one_equation()
{
    let ctx = new_context();
    let value = solve_equation_with_context("sin(x) - 0.5 = 0", &ctx, 0.5, 0.0, 1.6, 1e-9, 100)
        .unwrap()
        .unwrap();
    assert!((value - std::f64::consts::FRAC_PI_6).abs() < 1e-4);
}

#[test]
fn malformed_equation_is_a_parse_error_not_a_none()
{
    let ctx = new_context();
    assert!(solve_equation_with_context("x + = 0", &ctx, 1.0, f64::NEG_INFINITY, f64::INFINITY, 1e-9, 100).is_err());
}
