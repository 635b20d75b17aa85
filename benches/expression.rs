//! Benchmarks for expression parsing and pattern matching strategies
//!
//! Three groups are benchmarked:
//! 1. Calculator - a recursive operator-table grammar over characters
//! 2. Tokens - the same calculator over a lexed token stream
//! 3. Matching - direct pattern matching against derivative simulation
//!
//! Run with: cargo bench --bench expression

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use knotwork::lexer::terminals::{integer, operator};
use knotwork::prelude::*;

// ============================================================================
// Grammars
// ============================================================================

fn char_calculator() -> Parser<i64> {
    let ws = scanners::whitespaces().optional();
    let token = |text: &str| scanners::string(text).skip(ws.clone());
    let number = scanners::pattern(Pattern::integer(), "number")
        .source()
        .skip(ws.clone())
        .map(|s| s.parse::<i64>().unwrap_or(0));

    let expr: Reference<i64> = Reference::new();
    let atom = number.or(expr.lazy().between(token("("), token(")")));
    let table = OperatorTable::new()
        .prefix(token("-"), 100, |x: i64| -x)
        .infixl(token("*"), 20, |a, b| a.wrapping_mul(b))
        .infixl(token("+"), 10, |a, b| a.wrapping_add(b))
        .infixl(token("-"), 10, |a, b| a.wrapping_sub(b));
    expr.set(table.build(atom).unwrap()).unwrap();
    ws.then(expr.lazy())
}

fn token_calculator() -> (Lexer, Parser<i64>) {
    let lexer = Lexer::builder().operators(["+", "-", "*", "(", ")"]).build();
    let number = integer().map(|s| s.parse::<i64>().unwrap_or(0));

    let expr: Reference<i64> = Reference::new();
    let atom = number.or(expr.lazy().between(operator("("), operator(")")));
    let table = OperatorTable::new()
        .prefix(operator("-"), 100, |x: i64| -x)
        .infixl(operator("*"), 20, |a, b| a.wrapping_mul(b))
        .infixl(operator("+"), 10, |a, b| a.wrapping_add(b))
        .infixl(operator("-"), 10, |a, b| a.wrapping_sub(b));
    expr.set(table.build(atom).unwrap()).unwrap();
    (lexer, expr.lazy())
}

fn expression_input(terms: usize) -> String {
    (0..terms)
        .map(|i| match i % 3 {
            0 => format!("({} + {})", i, i + 1),
            1 => format!("-{}", i),
            _ => i.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" * 2 + ")
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_calculator(c: &mut Criterion) {
    let grammar = char_calculator();
    let small = expression_input(4);
    let large = expression_input(200);

    let mut g = c.benchmark_group("calculator");
    g.bench_function("small", |b| b.iter(|| grammar.parse(black_box(&small))));
    g.bench_function("large", |b| b.iter(|| grammar.parse(black_box(&large))));
    g.bench_function("large_derivative", |b| {
        b.iter(|| {
            let params = RunParameters::new().with_matching(MatchMode::Derivative);
            grammar.parse_with(black_box(&large), params)
        })
    });
    g.finish();
}

fn bench_tokens(c: &mut Criterion) {
    let (lexer, grammar) = token_calculator();
    let large = expression_input(200);
    let tokens = lexer.tokenize(&large).unwrap();

    let mut g = c.benchmark_group("tokens");
    g.bench_function("lex", |b| b.iter(|| lexer.tokenize(black_box(&large))));
    g.bench_function("parse_lexed", |b| {
        b.iter(|| grammar.parse_token_stream(&large, black_box(&tokens), RunParameters::new()))
    });
    g.bench_function("lex_and_parse", |b| {
        b.iter(|| grammar.parse_tokens(black_box(&large), &lexer))
    });
    g.finish();
}

fn bench_matching(c: &mut Criterion) {
    let string = Pattern::double_quote_string();
    let input = format!("\"{}\"", "abc\\\"def ".repeat(100));
    let scientific = Pattern::scientific();

    let mut g = c.benchmark_group("matching");
    g.bench_function("string_direct", |b| {
        b.iter(|| string.match_at(black_box(&input), 0, input.len()))
    });
    g.bench_function("string_derivative", |b| {
        b.iter(|| string.simulate(black_box(&input)))
    });
    g.bench_function("scientific_direct", |b| {
        b.iter(|| scientific.match_at(black_box("12345.678e-9"), 0, 12))
    });
    g.bench_function("scientific_derivative", |b| {
        b.iter(|| scientific.simulate(black_box("12345.678e-9")))
    });
    g.finish();
}

criterion_group!(benches, bench_calculator, bench_tokens, bench_matching);
criterion_main!(benches);
