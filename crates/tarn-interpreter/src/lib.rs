//! Tarn interpreter: evaluates AST nodes with a simple tree-walking
//! interpreter.
//!
//! This crate provides the runtime evaluation system for the Tarn
//! programming language: runtime values, the scope arena and call-depth
//! accounting, the embedded-function registry, and the evaluator itself.

pub mod embedded;
pub mod flow;
pub mod interpreter;
pub mod scope;
pub mod value;

pub use embedded::{Arity, EmbeddedFn, EmbeddedFunction, EmbeddedRegistry};
pub use interpreter::{Interpreter, DEFAULT_MAX_RECURSION_DEPTH};
pub use scope::{CallStack, ScopeArena, ScopeId, ScopeVariable};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_lexer::Lexer;
    use tarn_parser::Parser;
    use tarn_syntax::Position;

    fn build(input: &str) -> Result<Interpreter, String> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize().map_err(|e| format!("Lex error: {}", e))?;
        let mut parser = Parser::new(tokens);
        let program = parser
            .parse_program()
            .map_err(|e| format!("Parse error: {}", e))?;
        Ok(Interpreter::new(program, EmbeddedRegistry::standard()))
    }

    fn run_program(input: &str) -> Result<Option<Value>, String> {
        build(input)?
            .run()
            .map_err(|e| format!("Runtime error: {}", e))
    }

    fn call(input: &str, name: &str, args: Vec<Value>) -> Result<Option<Value>, String> {
        build(input)?
            .call_function(name, args, Position::default())
            .map_err(|e| format!("Runtime error: {}", e))
    }

    fn expect_value(input: &str, expected: Value) {
        match run_program(input) {
            Ok(Some(actual)) => assert_eq!(actual, expected, "Program: {}", input),
            Ok(None) => panic!("Expected a value but got none for: {}", input),
            Err(e) => panic!("Program failed: {}\nInput: {}", e, input),
        }
    }

    fn expect_error(input: &str, fragment: &str) {
        match run_program(input) {
            Ok(_) => panic!("Expected an error but program succeeded: {}", input),
            Err(e) => assert!(
                e.contains(fragment),
                "expected error containing '{}', got: {}\nInput: {}",
                fragment,
                e,
                input
            ),
        }
    }

    #[test]
    fn test_add_scenario() {
        // add(1, 2) yields 3
        let result = call(
            "add(a, b int) int { return a + b }",
            "add",
            vec![Value::Int(1), Value::Int(2)],
        );
        assert_eq!(result, Ok(Some(Value::Int(3))));
    }

    #[test]
    fn test_return_skips_following_statements() {
        // the while branch must never execute; its condition would divide
        // by zero if it did
        expect_value(
            r#"
main() int {
    if true {
        return 42
    }
    while 1 / 0 == 1 {
        return 82
    }
    return 0
}
"#,
            Value::Int(42),
        );
    }

    #[test]
    fn test_division_by_zero() {
        expect_error("main() { int x := 5 / 0 }", "division by zero");
        expect_error("main() { float x := 5.0 / 0.0 }", "division by zero");
    }

    #[test]
    fn test_declared_type_is_enforced() {
        expect_error(
            "main() { int a := 5\n a = \"text\" }",
            "type mismatch",
        );
        expect_error(
            "main() { int a := 5\n int a := 6 }",
            "already declared",
        );
        expect_error("main() { int a := \"text\" }", "type mismatch");
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        expect_value("main() int { return 2 + 3 * 4 }", Value::Int(14));
        expect_value("main() int { return (2 + 3) * 4 }", Value::Int(20));
        expect_value("main() float { return 1.5 + 2.5 }", Value::Float(4.0));
        expect_value(
            "main() string { return \"foo\" + \"bar\" }",
            Value::Str("foobar".to_string()),
        );
        expect_value("main() int { return -3 + 5 }", Value::Int(2));
        expect_error("main() int { return 1 + 2.0 }", "cannot combine int and float");
    }

    #[test]
    fn test_comparisons() {
        expect_value("main() bool { return 5 > 3 }", Value::Bool(true));
        expect_value("main() bool { return 2.5 <= 2.5 }", Value::Bool(true));
        expect_value("main() bool { return 5 == 5 }", Value::Bool(true));
        expect_value("main() bool { return \"a\" != \"b\" }", Value::Bool(true));
        expect_error("main() bool { return 1 < 1.0 }", "cannot combine");
        expect_error("main() bool { return 1 == \"1\" }", "cannot compare");
        expect_error("main() bool { return \"a\" < \"b\" }", "cannot combine");
    }

    #[test]
    fn test_short_circuit_laws() {
        // the right operand would divide by zero if evaluated
        expect_value(
            "main() bool { return false and 1 / 0 == 0 }",
            Value::Bool(false),
        );
        expect_value(
            "main() bool { return true or 1 / 0 == 0 }",
            Value::Bool(true),
        );
        expect_value("main() bool { return true and false }", Value::Bool(false));
        expect_value("main() bool { return false or true }", Value::Bool(true));
        expect_error("main() bool { return 1 and true }", "'and' expects bool");
        expect_error("main() bool { return true and 1 }", "'and' expects bool");
    }

    #[test]
    fn test_conditions_must_be_bool() {
        expect_error("main() { if 1 { } }", "must be bool");
        expect_error("main() { while \"yes\" { } }", "must be bool");
    }

    #[test]
    fn test_casts() {
        expect_value("main() int { return 2.9 -> int }", Value::Int(2));
        expect_value("main() int { return -2.9 -> int }", Value::Int(-2));
        expect_value("main() int { return true -> int }", Value::Int(1));
        expect_value("main() float { return 3 -> float }", Value::Float(3.0));
        expect_value("main() float { return false -> float }", Value::Float(0.0));
        expect_value("main() bool { return 2 -> bool }", Value::Bool(true));
        expect_value("main() bool { return 0.0 -> bool }", Value::Bool(false));
        expect_value(
            "main() string { return 10 -> string }",
            Value::Str("10".to_string()),
        );
        expect_value("main() int { return \"42\" -> int }", Value::Int(42));
        expect_value("main() bool { return \"true\" -> bool }", Value::Bool(true));
        expect_error("main() int { return \"4x\" -> int }", "cannot cast");
        expect_error("main() bool { return \"yes\" -> bool }", "cannot cast");
    }

    #[test]
    fn test_cast_round_trips() {
        expect_value(
            "main() int { return 10 -> string -> int }",
            Value::Int(10),
        );
        expect_value(
            "main() bool { return true -> string -> bool }",
            Value::Bool(true),
        );
    }

    #[test]
    fn test_block_scoping_laws() {
        // a variable declared inside a branch is invisible after it
        expect_error(
            r#"
main() int {
    if true {
        int inner := 1
    }
    return inner
}
"#,
            "undefined variable 'inner'",
        );
        // an enclosing variable stays visible and mutable inside a branch
        expect_value(
            r#"
main() int {
    int total := 0
    if true {
        total = total + 5
    }
    return total
}
"#,
            Value::Int(5),
        );
        // shadowing in a nested block leaves the outer binding alone
        expect_value(
            r#"
main() int {
    int x := 1
    if true {
        int x := 99
        x = 100
    }
    return x
}
"#,
            Value::Int(1),
        );
    }

    #[test]
    fn test_call_boundary_law() {
        expect_error(
            r#"
peek() int { return hidden }
main() int {
    int hidden := 7
    return peek()
}
"#,
            "undefined variable 'hidden'",
        );
    }

    #[test]
    fn test_arguments_evaluate_in_caller_scope() {
        expect_value(
            r#"
double(n int) int { return n * 2 }
main() int {
    int n := 21
    return double(n)
}
"#,
            Value::Int(42),
        );
    }

    #[test]
    fn test_while_loop() {
        expect_value(
            r#"
main() int {
    int i := 0
    int total := 0
    while i < 5 {
        total = total + i
        i = i + 1
    }
    return total
}
"#,
            Value::Int(10),
        );
    }

    #[test]
    fn test_while_scope_is_reused_across_iterations() {
        // the loop scope is created once, so a declaration in the body
        // collides with itself on the second pass
        expect_error(
            r#"
main() {
    int i := 0
    while i < 2 {
        int x := i
        i = i + 1
    }
}
"#,
            "already declared",
        );
    }

    #[test]
    fn test_recursion_guard() {
        let result = call("spin() { spin() }", "spin", Vec::new());
        match result {
            Err(e) => {
                assert!(e.contains("maximum recursion depth"), "got: {}", e);
                assert!(e.contains("'spin'"), "got: {}", e);
            }
            Ok(_) => panic!("expected the recursion guard to fire"),
        }
    }

    #[test]
    fn test_bounded_recursion_is_fine() {
        expect_value(
            r#"
fact(n int) int {
    if n <= 1 {
        return 1
    }
    return n * fact(n - 1)
}
main() int { return fact(10) }
"#,
            Value::Int(3628800),
        );
    }

    #[test]
    fn test_function_errors() {
        expect_error("main() { missing() }", "undefined function 'missing'");
        expect_error(
            "f(a int) int { return a }\nmain() { int x := f(1, 2) }",
            "expects 1 argument(s), got 2",
        );
        expect_error(
            "f(a int) int { return a }\nmain() { int x := f(\"one\") }",
            "expects int, got string",
        );
    }

    #[test]
    fn test_return_type_checking() {
        expect_error(
            "f() int { return true }\nmain() { f() }",
            "invalid return type",
        );
        expect_error(
            "f() int { return }\nmain() { f() }",
            "invalid return type",
        );
        expect_error(
            "f() { return 1 }\nmain() { f() }",
            "invalid return type",
        );
    }

    #[test]
    fn test_void_call_in_expression_position_fails() {
        expect_error(
            "f() { }\nmain() { int x := f() }",
            "produced no value",
        );
        // a typed function that falls off the end produces no value either
        expect_error(
            "f() int { int x := 1 }\nmain() { int y := f() }",
            "produced no value",
        );
    }

    #[test]
    fn test_user_functions_shadow_embedded() {
        expect_value(
            "sqrt(x float) float { return 0.0 }\nmain() float { return sqrt(9.0) }",
            Value::Float(0.0),
        );
    }

    #[test]
    fn test_embedded_functions() {
        expect_value("main() bool { return modulo(10, 2) }", Value::Bool(true));
        expect_value("main() bool { return modulo(10, 3) }", Value::Bool(false));
        expect_value("main() float { return sqrt(16.0) }", Value::Float(4.0));
        expect_value(
            "main() float { return power(2.0, 10.0) }",
            Value::Float(1024.0),
        );
        expect_error("main() bool { return modulo(1, 0) }", "modulo by zero");
        expect_error("main() float { return sqrt(-1.0) }", "negative");
        expect_error(
            "main() float { return sqrt(2.0, 3.0) }",
            "expects 1 argument(s), got 2",
        );
    }

    #[test]
    fn test_switch_on_subject_value() {
        expect_value(
            r#"
classify(n int) string {
    string label := "none"
    switch n {
        > 100 => { label = "large" },
        42 => { label = "the answer" },
        default => { label = "small" }
    }
    return label
}
main() string { return classify(42) }
"#,
            Value::Str("the answer".to_string()),
        );
        expect_value(
            "main() string { string l := \"x\"\n switch 500 { > 100 => { l = \"large\" }, default => { l = \"other\" } }\n return l }",
            Value::Str("large".to_string()),
        );
    }

    #[test]
    fn test_switch_default_and_no_match() {
        // no match, no default: the switch is a no-op
        expect_value(
            "main() int { int r := 1\n switch 9 { 1 => { r = 2 } }\n return r }",
            Value::Int(1),
        );
        // no match with a default
        expect_value(
            "main() int { int r := 1\n switch 9 { 1 => { r = 2 }, default => { r = 3 } }\n return r }",
            Value::Int(3),
        );
    }

    #[test]
    fn test_switch_declaration_guards_are_conditions() {
        expect_value(
            r#"
main() string {
    string label := "none"
    switch int a := 3, int b := 5 {
        a > b => { label = "descending" },
        a < b => { label = "ascending" },
        default => { label = "equal" }
    }
    return label
}
"#,
            Value::Str("ascending".to_string()),
        );
    }

    #[test]
    fn test_switch_single_declaration_is_the_subject() {
        expect_value(
            r#"
main() string {
    string label := "none"
    switch int code := 7 {
        < 10 => { label = "unit: " + code -> string },
        default => { label = "big" }
    }
    return label
}
"#,
            Value::Str("unit: 7".to_string()),
        );
    }

    #[test]
    fn test_switch_errors() {
        expect_error(
            "main() { switch 1 { default => { }, default => { } } }",
            "more than one default",
        );
        expect_error(
            "main() { switch int a := 1, int b := 2 { > 1 => { } } }",
            "requires a switch subject",
        );
        expect_error(
            "main() { switch int a := 1, int b := 2 { a + b => { } } }",
            "must be bool",
        );
    }

    #[test]
    fn test_switch_guard_variables_stay_inside_the_switch() {
        expect_error(
            "main() int { switch int a := 1 { default => { } }\n return a }",
            "undefined variable 'a'",
        );
    }

    #[test]
    fn test_switch_return_propagates() {
        expect_value(
            r#"
pick(n int) int {
    switch n {
        > 0 => { return 1 },
        default => { return -1 }
    }
}
main() int { return pick(5) }
"#,
            Value::Int(1),
        );
    }

    #[test]
    fn test_no_main_is_an_error() {
        expect_error("helper() { }", "no 'main' function");
    }

    #[test]
    fn test_undefined_variable() {
        expect_error("main() int { return ghost }", "undefined variable 'ghost'");
        expect_error("main() { ghost = 1 }", "undefined variable 'ghost'");
    }

    #[test]
    fn test_negate() {
        expect_value("main() int { int n := 5\n return -n }", Value::Int(-5));
        expect_value("main() float { return -2.5 }", Value::Float(-2.5));
        expect_error("main() { bool b := -true }", "cannot negate");
    }
}
