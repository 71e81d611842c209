//! Property tests over randomly generated formulas.
//!
//! A bounded-depth generator produces expression pairs; every pair is
//! cross-checked against exhaustive truth-table evaluation and the
//! symmetry/involution laws of `is_equiv`.

use std::collections::HashMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use eqcheck::context::Context;
use eqcheck::reference::Ref;
use eqcheck::script::Runner;

const TERM_NAMES: [&str; 3] = ["a", "b", "c"];

fn random_expr(
    ctx: &mut Context<String>,
    terms: &[Ref],
    rng: &mut ChaCha8Rng,
    depth: usize,
) -> Ref {
    if depth == 0 || rng.gen_bool(0.3) {
        let t = terms[rng.gen_range(0..terms.len())];
        return if rng.gen_bool(0.5) { -t } else { t };
    }
    match rng.gen_range(0..5) {
        0 => {
            let a = random_expr(ctx, terms, rng, depth - 1);
            let b = random_expr(ctx, terms, rng, depth - 1);
            ctx.get_or([a, b])
        }
        1 => {
            let a = random_expr(ctx, terms, rng, depth - 1);
            let b = random_expr(ctx, terms, rng, depth - 1);
            ctx.get_and([a, b])
        }
        2 => {
            let i = random_expr(ctx, terms, rng, depth - 1);
            let t = random_expr(ctx, terms, rng, depth - 1);
            let e = random_expr(ctx, terms, rng, depth - 1);
            ctx.ifelse(i, t, e)
        }
        3 => {
            let a = random_expr(ctx, terms, rng, depth - 1);
            let b = random_expr(ctx, terms, rng, depth - 1);
            ctx.get_eq(a, b)
        }
        _ => -random_expr(ctx, terms, rng, depth - 1),
    }
}

/// Exhaustive truth-table equality over the three atoms.
fn truth_table_equiv(ctx: &Context<String>, a: Ref, b: Ref) -> bool {
    for bits in 0..(1u32 << TERM_NAMES.len()) {
        let assignment: HashMap<String, bool> = TERM_NAMES
            .iter()
            .enumerate()
            .map(|(k, name)| (name.to_string(), (bits >> k) & 1 == 1))
            .collect();
        if ctx.evaluate(a, &assignment) != ctx.evaluate(b, &assignment) {
            return false;
        }
    }
    true
}

#[test]
fn is_equiv_matches_truth_tables() {
    let mut rng = ChaCha8Rng::seed_from_u64(20240831);
    let mut ctx = Context::new();
    let terms: Vec<Ref> = TERM_NAMES
        .iter()
        .map(|n| ctx.get_term(n.to_string()))
        .collect();

    for _ in 0..60 {
        let a = random_expr(&mut ctx, &terms, &mut rng, 3);
        let b = random_expr(&mut ctx, &terms, &mut rng, 3);

        let expected = truth_table_equiv(&ctx, a, b);
        assert_eq!(ctx.is_equiv(a, b), expected, "truth table disagrees");
        // The laws must survive the recorded equivalences.
        assert_eq!(ctx.is_equiv(-a, -b), expected);
        assert_eq!(ctx.is_equiv(b, a), expected);
    }
}

#[test]
fn is_equiv_agrees_with_is_unsat() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut ctx = Context::new();
    let terms: Vec<Ref> = TERM_NAMES
        .iter()
        .map(|n| ctx.get_term(n.to_string()))
        .collect();

    for _ in 0..40 {
        let a = random_expr(&mut ctx, &terms, &mut rng, 3);
        let b = random_expr(&mut ctx, &terms, &mut rng, 3);

        // is_unsat on the negated biconditional is the definition of
        // equivalence; check it before is_equiv records anything.
        let eq = ctx.get_eq(a, b);
        let expected = ctx.is_unsat(-eq);
        assert_eq!(ctx.is_equiv(a, b), expected);
    }
}

#[test]
fn unsat_matches_equivalence_to_constants() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut ctx = Context::new();
    let terms: Vec<Ref> = TERM_NAMES
        .iter()
        .map(|n| ctx.get_term(n.to_string()))
        .collect();
    let f = ctx.get_false();
    let t = ctx.get_true();

    for _ in 0..40 {
        let a = random_expr(&mut ctx, &terms, &mut rng, 3);

        let unsat = ctx.is_unsat(a);
        assert_eq!(ctx.is_equiv(a, f), unsat);
        let taut = ctx.is_unsat(-a);
        assert_eq!(ctx.is_equiv(a, t), taut);

        // is_unsat is idempotent.
        assert_eq!(ctx.is_unsat(a), unsat);
    }
}

fn random_expr_text(rng: &mut ChaCha8Rng, depth: usize) -> String {
    if depth == 0 || rng.gen_bool(0.3) {
        let name = TERM_NAMES[rng.gen_range(0..TERM_NAMES.len())];
        return if rng.gen_bool(0.5) {
            format!("~{}", name)
        } else {
            name.to_string()
        };
    }
    match rng.gen_range(0..5) {
        0 => format!(
            "(or {} {})",
            random_expr_text(rng, depth - 1),
            random_expr_text(rng, depth - 1)
        ),
        1 => format!(
            "(and {} {})",
            random_expr_text(rng, depth - 1),
            random_expr_text(rng, depth - 1)
        ),
        2 => format!(
            "(ifelse {} {} {})",
            random_expr_text(rng, depth - 1),
            random_expr_text(rng, depth - 1),
            random_expr_text(rng, depth - 1)
        ),
        3 => format!(
            "(eq {} {})",
            random_expr_text(rng, depth - 1),
            random_expr_text(rng, depth - 1)
        ),
        _ => format!("(not {})", random_expr_text(rng, depth - 1)),
    }
}

#[test]
fn print_parse_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(4711);

    for round in 0..30 {
        let mut runner = Runner::new(format!("round-{}", round));
        for name in TERM_NAMES {
            runner.run_line(&format!("def {}", name)).unwrap();
        }
        let text = random_expr_text(&mut rng, 3);
        runner.run_line(&format!("def x {}", text)).unwrap();
        let original = runner.node("x").unwrap();

        let mut printed = String::new();
        runner.context().print(&mut printed, original).unwrap();

        // Feed the def lines back; the last line is the root expression.
        let mut lines: Vec<&str> = printed.lines().collect();
        let root = lines.pop().unwrap();
        for line in lines {
            runner.run_line(line).unwrap();
        }
        runner.run_line(&format!("def roundtrip {}", root)).unwrap();
        let reparsed = runner.node("roundtrip").unwrap();

        assert_eq!(reparsed, original, "round {} failed on: {}", round, printed);
    }
}
