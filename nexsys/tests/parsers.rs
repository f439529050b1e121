//! Coverage for the preprocessor pipeline in isolation (`nexsys::parsing`).

use geqslib::shunting::new_context;
use nexsys::parsing::{compile, DeclaredMap};

#[test]
fn comments_const_domain_and_guess_all_strip_their_lines()
{
    let system = "// comment\nconst g = 9.81\nkeep x on [0, 10]\nguess 3 for y\nx + y = g";
    let mut ctx = new_context();
    let mut declared = DeclaredMap::new();

    let compiled = compile(system, &mut ctx, &mut declared).unwrap();

    assert!(!compiled.contains("comment"));
    assert!(!compiled.contains("const"));
    assert!(!compiled.contains("keep"));
    assert!(!compiled.contains("guess"));
    assert!(compiled.contains("x + y"));

    assert!(ctx.contains_key("g"));
    assert_eq!(declared["x"][1], 0.0);
    assert_eq!(declared["x"][2], 10.0);
    assert_eq!(declared["y"][0], 3.0);
}

#[test]
fn conditional_block_compiles_to_a_single_equation_line()
{
    let system = "if [ a >= 0 ]\na - 1 = 0\nelse\na + 1 = 0\nend";
    let mut ctx = new_context();
    let mut declared = DeclaredMap::new();

    let compiled = compile(system, &mut ctx, &mut declared).unwrap();

    let equation_lines: Vec<&str> = compiled.lines().filter(|l| l.contains('=')).collect();
    assert_eq!(equation_lines.len(), 1);
    assert!(equation_lines[0].starts_with("if("));
}

#[test]
fn multiple_directives_can_target_the_same_variable()
{
    let system = "keep x on [-5, 5]\nguess 2 for x\nx^2 - 4 = 0";
    let mut ctx = new_context();
    let mut declared = DeclaredMap::new();

    compile(system, &mut ctx, &mut declared).unwrap();

    assert_eq!(declared["x"], [2.0, -5.0, 5.0]);
}

#[test]
fn case_is_normalized_to_lowercase()
{
    let system = "CONST G = 9.81\nF = G * M";
    let mut ctx = new_context();
    let mut declared = DeclaredMap::new();

    let compiled = compile(system, &mut ctx, &mut declared).unwrap();

    assert!(ctx.contains_key("g"));
    assert!(compiled.to_lowercase().contains("f = g * m"));
}
