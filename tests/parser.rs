use rox as lox;

use lox::ast::{Expr, Stmt};
use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::parser::Parser;
use lox::scanner::scan_tokens;

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, errors) = scan_tokens(source.as_bytes());
    assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
    Parser::new(tokens).parse()
}

fn printed(source: &str) -> String {
    let program = parse(source).expect("Parse should work on valid program");
    AstPrinter::print_program(&program)
}

fn messages(source: &str) -> Vec<String> {
    parse(source)
        .expect_err("Parse should fail")
        .iter()
        .map(|e| e.to_string())
        .collect()
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(printed("1 + 2 * 3;"), "(; (+ 1.0 (* 2.0 3.0)))");
    assert_eq!(printed("1 - 2 - 3;"), "(; (- (- 1.0 2.0) 3.0))");
    assert_eq!(printed("-(1 + 2) / 4;"), "(; (/ (- (group (+ 1.0 2.0))) 4.0))");
    assert_eq!(
        printed("a == b < c != !d;"),
        "(; (!= (== a (< b c)) (! d)))"
    );
    assert_eq!(printed("a or b and c;"), "(; (or a (and b c)))");
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(printed("a = b = 3;"), "(; (= a (= b 3.0)))");
}

#[test]
fn test_chained_calls() {
    assert_eq!(printed("f(1, 2)(x)();"), "(; (call (call (call f 1.0 2.0) x)))");
}

#[test]
fn test_statements() {
    assert_eq!(
        printed("var a; var b = \"s\"; { print a; } if (a) print 1; else print 2;"),
        "(var a)\n(var b s)\n(block (print a))\n(if a (print 1.0) (print 2.0))"
    );
    assert_eq!(
        printed("fun add(a, b) { return a + b; } fun f() { return; }"),
        "(fun add (a b) (return (+ a b)))\n(fun f () (return))"
    );
}

#[test]
fn test_for_loop_desugars_to_while() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
    );

    // No initializer, no increment, no condition.
    assert_eq!(printed("for (;;) print 1;"), "(while true (print 1.0))");
}

#[test]
fn test_use_sites_get_distinct_ids() {
    let program = parse("a; a;").unwrap();

    let ids: Vec<_> = program
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            other => panic!("unexpected statement {:?}", other),
        })
        .collect();

    assert_ne!(ids[0], ids[1]);
}

#[test]
fn test_error_locations() {
    assert_eq!(
        messages("print 1"),
        vec!["[line 1] Error at end: Expect ';' after value."]
    );
    assert_eq!(
        messages("var = 1;"),
        vec!["[line 1] Error at '=': Expect variable name."]
    );
}

#[test]
fn test_panic_mode_reports_independent_errors() {
    let errors = messages("var = 1;\nprint 2;\nprint (3;\nvar ok = 4;\n1 +;");

    assert_eq!(
        errors,
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 3] Error at ';': Expect ')' after expression.",
            "[line 5] Error at ';': Expect expression.",
        ]
    );
}

#[test]
fn test_errors_inside_blocks_recover_locally() {
    let errors = messages("{ var 1; print 2; }\nfun f( { }");

    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("Expect variable name."));
    assert!(errors[1].contains("Expect parameter name."));
}

#[test]
fn test_invalid_assignment_target_is_not_fatal() {
    let errors = messages("1 + 2 = 3; print 4 = 5;");

    // Both statements are still parsed to their end, so both get reported.
    assert_eq!(
        errors,
        vec![
            "[line 1] Error at '=': Invalid assignment target.",
            "[line 1] Error at '=': Invalid assignment target.",
        ]
    );
}

#[test]
fn test_argument_cap_is_reported_but_not_fatal() {
    let args = vec!["1"; 256].join(", ");
    let errors = messages(&format!("f({}); print 1 +;", args));

    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("Can't have more than 255 arguments."));
    assert!(errors[1].contains("Expect expression."));
}

#[test]
fn test_parameter_cap_is_fatal_to_the_declaration() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let errors = messages(&format!("fun f({}) {{}}", params.join(", ")));

    assert!(errors[0].contains("Can't have more than 255 parameters."));
}

#[test]
fn test_255_arguments_are_fine() {
    let args = vec!["1"; 255].join(", ");
    assert!(parse(&format!("f({});", args)).is_ok());
}

#[test]
fn test_missing_eof_is_supplied() {
    let (mut tokens, _) = scan_tokens(b"print 1;");
    tokens.pop();

    assert_eq!(Parser::new(tokens).parse().unwrap().len(), 1);
}

#[test]
fn test_deep_grouping_is_rejected() {
    let source = format!("print {}1{};", "(".repeat(50_000), ")".repeat(50_000));

    assert_eq!(
        messages(&source),
        vec!["[line 1] Error at '(': Too much nesting."]
    );
}

#[test]
fn test_deep_unary_is_rejected() {
    let source = format!("print {}1;", "-".repeat(200_000));

    assert_eq!(
        messages(&source),
        vec!["[line 1] Error at '-': Too much nesting."]
    );
}

#[test]
fn test_long_operator_chain_is_rejected() {
    let source = format!("print 1{};", " + 1".repeat(5_000));

    assert_eq!(
        messages(&source),
        vec!["[line 1] Error at '1': Too much nesting."]
    );
}

#[test]
fn test_deep_blocks_and_functions_are_rejected() {
    let blocks = format!("{}print 1;{}", "{".repeat(20_000), "}".repeat(20_000));
    let errors = messages(&blocks);
    assert!(errors[0].ends_with("Too much nesting."), "{:?}", errors);

    let funs = format!("{}{}", "fun f() {".repeat(5_000), "}".repeat(5_000));
    let errors = messages(&funs);
    assert!(errors[0].ends_with("Too much nesting."), "{:?}", errors);

    let ifs = format!("{}print 1;", "if (true) ".repeat(5_000));
    let errors = messages(&ifs);
    assert!(errors[0].ends_with("Too much nesting."), "{:?}", errors);
}

#[test]
fn test_nesting_below_the_limit_parses() {
    let grouped = format!("print {}1{};", "(".repeat(500), ")".repeat(500));
    assert!(parse(&grouped).is_ok());

    let chained = format!("print 1{};", " + 1".repeat(1_000));
    assert!(parse(&chained).is_ok());

    let blocks = format!("{}print 1;{}", "{".repeat(500), "}".repeat(500));
    assert!(parse(&blocks).is_ok());
}
