// Parser robustness tests.
//
// Table-driven suites that feed malformed and well-formed source through the
// lexer and parser, checking that structural violations are rejected with the
// expected message and that nothing panics.

use spud::error::SpudError;
use spud::lexer::{Lexer, TokenKind};
use spud::parser::Parser;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ok {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  FAIL {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  CRASH {}: {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case, catching panics so a crash is reported rather
/// than aborting the whole suite
fn run_single_test(test: &TestCase) -> TestResult {
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => {
                if let Some(expected) = &test.expected_error_contains {
                    if error.message.contains(expected) {
                        TestResult::Pass
                    } else {
                        TestResult::Fail(format!(
                            "Error message '{}' doesn't contain expected text '{}'",
                            error.message, expected
                        ))
                    }
                } else {
                    TestResult::Pass // Any error is acceptable
                }
            }
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

/// Lex and parse input; an Invalid token surfaces as a lex error, the same
/// boundary the entry points enforce
fn parse_input(input: &str) -> Result<spud::ast::Program, SpudError> {
    let tokens = Lexer::new(input.to_string()).scan();
    if let Some(bad) = tokens.iter().find(|t| t.kind == TokenKind::Invalid) {
        return Err(SpudError::lex(bad.pos, bad.span, bad.lexeme.clone()));
    }
    Parser::new(tokens).parse()
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    // Unmatched opening parentheses
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "print (1 + 2;",
        "Expected ')' after expression",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren_nested",
        "print ((1 + 2);",
        "Expected ')' after expression",
    ));

    // Unmatched closing parentheses
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "print 1 + 2);",
        "Expected ';' after print statement, got RightParen",
    ));

    // Empty parentheses hit the primary parser
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "print ();",
        "Expected expression, got RightParen",
    ));

    // Unmatched closing brace
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_brace",
        "let x = 1; }",
        "Expected expression, got RightBrace",
    ));

    // Unmatched opening brace
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_brace",
        "{ let x = 1;",
        "Expected '}' after block, got Eof",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    // Empty input
    suite.add_test(TestCase::should_succeed("empty_input", ""));

    // Only whitespace and comments
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comment", "// nothing here\n"));

    // EOF conditions
    suite.add_test(TestCase::should_fail_with_message(
        "unexpected_eof_after_operator",
        "print 1 +",
        "Expected expression, got Eof",
    ));
    suite.add_test(TestCase::should_fail("unexpected_eof_in_expression", "print 1 + (;"));
    suite.add_test(TestCase::should_fail("bare_semicolon", ";"));

    // Very deeply nested expressions
    let deep_parens = format!("print {}1{};", "(".repeat(100), ")".repeat(100));
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    // Missing operands
    suite.add_test(TestCase::should_fail("missing_left_operand", "print + 1;"));
    suite.add_test(TestCase::should_fail("missing_right_operand", "print 1 +;"));

    // Chained unary minus folds into the term
    suite.add_test(TestCase::should_succeed("double_minus", "print 1 -- 2;"));
    suite.add_test(TestCase::should_succeed("mixed_operators", "print 1 +- 2;"));
    suite.add_test(TestCase::should_succeed("bang_chain", "print !!true;"));

    // Two-character operators
    suite.add_test(TestCase::should_succeed("comparison_equal", "print 1 == 2;"));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", "print 1 != 2;"));
    suite.add_test(TestCase::should_succeed("comparison_less_equal", "print 1 <= 2;"));
    suite.add_test(TestCase::should_succeed("comparison_greater_equal", "print 1 >= 2;"));
    suite.add_test(TestCase::should_succeed("logical_mix", "print 1 < 2 and 3 < 4 or false;"));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Tests");

    // If statements require parenthesized conditions
    suite.add_test(TestCase::should_succeed("valid_if", "if (true) { print 1; }"));
    suite.add_test(TestCase::should_succeed(
        "valid_if_else",
        "if (true) { print 1; } else { print 2; }",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "if_missing_paren",
        "if true { print 1; }",
        "Expected '(' after 'if'",
    ));
    suite.add_test(TestCase::should_fail("if_missing_body", "if (true)"));

    // While loops
    suite.add_test(TestCase::should_succeed("valid_while", "while (true) { print 1; }"));
    suite.add_test(TestCase::should_fail_with_message(
        "while_missing_paren",
        "while true { print 1; }",
        "Expected '(' after 'while'",
    ));

    // Semicolons are mandatory terminators
    suite.add_test(TestCase::should_fail_with_message(
        "missing_semicolon_print",
        "print 1",
        "Expected ';' after print statement",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_semicolon_expression",
        "1 + 2",
        "Expected ';' after expression",
    ));

    // Return
    suite.add_test(TestCase::should_succeed("bare_return", "return;"));
    suite.add_test(TestCase::should_succeed("return_with_value", "return 1 + 2;"));
    suite.add_test(TestCase::should_fail_with_message(
        "return_missing_semicolon",
        "return 1",
        "Expected ';' after return value",
    ));

    suite
}

fn create_declaration_tests() -> TestSuite {
    let mut suite = TestSuite::new("Declaration Tests");

    // let requires a mandatory initializer
    suite.add_test(TestCase::should_succeed("valid_let", "let x = 1;"));
    suite.add_test(TestCase::should_fail_with_message(
        "let_without_initializer",
        "let x;",
        "Expected '=' after variable name",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "let_without_name",
        "let = 1;",
        "Expected identifier after 'let'",
    ));

    // Function declarations
    suite.add_test(TestCase::should_succeed("fun_no_params", "fun f() { return; }"));
    suite.add_test(TestCase::should_succeed(
        "fun_with_params",
        "fun add(a, b) { return a + b; }",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "fun_missing_name",
        "fun () {}",
        "Expected function name after 'fun'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "fun_missing_body_brace",
        "fun f() return 1;",
        "Expected '{' before function body",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "fun_unterminated_body",
        "fun f() { return 1;",
        "Expected '}' after function body",
    ));

    // Declarations nest inside blocks
    suite.add_test(TestCase::should_succeed(
        "declarations_in_block",
        "{ let x = 1; fun f() { return x; } }",
    ));

    // Imports take a string literal or a bare identifier
    suite.add_test(TestCase::should_succeed("import_string", "import \"utils\";"));
    suite.add_test(TestCase::should_succeed("import_identifier", "import utils;"));
    suite.add_test(TestCase::should_fail_with_message(
        "import_number",
        "import 42;",
        "Expected module name after 'import'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "import_missing_semicolon",
        "import utils",
        "Expected ';' after import statement",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    // Valid literals
    suite.add_test(TestCase::should_succeed("integer_literal", "print 42;"));
    suite.add_test(TestCase::should_succeed("decimal_literal", "print 3.14;"));
    suite.add_test(TestCase::should_succeed("string_literal", "print \"hello\";"));
    suite.add_test(TestCase::should_succeed("string_with_escapes", "print \"a\\n\\t\\\"b\\\\\";"));
    suite.add_test(TestCase::should_succeed("boolean_true", "print true;"));
    suite.add_test(TestCase::should_succeed("boolean_false", "print false;"));
    suite.add_test(TestCase::should_succeed("nil_literal", "print nil;"));

    // There is no dot token, so a trailing dot is an unexpected character
    suite.add_test(TestCase::should_fail_with_message(
        "trailing_dot",
        "print 42.;",
        "Unexpected character: '.'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "leading_dot",
        "print .42;",
        "Unexpected character: '.'",
    ));

    // Unterminated strings are lex errors at the opening quote
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "print \"hello;",
        "Unterminated string",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string_with_newline",
        "print \"hello\nworld\";",
        "Unterminated string",
    ));

    // Unknown characters
    suite.add_test(TestCase::should_fail_with_message(
        "unexpected_character",
        "print 1 @ 2;",
        "Unexpected character: '@'",
    ));

    suite
}

fn create_function_call_tests() -> TestSuite {
    let mut suite = TestSuite::new("Function Call Tests");

    // Valid function calls
    suite.add_test(TestCase::should_succeed("simple_function_call", "foo();"));
    suite.add_test(TestCase::should_succeed("function_call_with_args", "foo(1, 2, 3);"));
    suite.add_test(TestCase::should_succeed("chained_call", "foo()();"));
    suite.add_test(TestCase::should_succeed("call_in_expression", "print foo(1) + bar(2);"));

    // Invalid function calls
    suite.add_test(TestCase::should_fail_with_message(
        "missing_closing_paren",
        "foo(1, 2;",
        "Expected ')' after arguments",
    ));
    suite.add_test(TestCase::should_fail("trailing_comma", "foo(1, 2,);"));

    suite
}

fn create_assignment_tests() -> TestSuite {
    let mut suite = TestSuite::new("Assignment Tests");

    // Assignment is a statement, recognized by identifier-then-equals lookahead
    suite.add_test(TestCase::should_succeed("simple_assignment", "x = 1;"));
    suite.add_test(TestCase::should_succeed("assignment_with_expression", "x = 1 + 2;"));
    suite.add_test(TestCase::should_fail("missing_value", "x = ;"));

    // `1 = x` is not assignment: it parses as expression `1` and then
    // fails on the stray equals
    suite.add_test(TestCase::should_fail("invalid_target", "1 = x;"));

    suite
}

fn create_positive_tests() -> TestSuite {
    let mut suite = TestSuite::new("Positive Tests");

    suite.add_test(TestCase::should_succeed("simple_arithmetic", "print 1 + 2 * 3;"));
    suite.add_test(TestCase::should_succeed("parentheses", "print (1 + 2) * 3;"));
    suite.add_test(TestCase::should_succeed("string_concatenation", "print \"hello\" + \" world\";"));
    suite.add_test(TestCase::should_succeed("boolean_operations", "print true and false;"));
    suite.add_test(TestCase::should_succeed(
        "full_program",
        "let total = 0;\n\
         let i = 1;\n\
         while (i <= 10) {\n\
             total = total + i;\n\
             i = i + 1;\n\
         }\n\
         print total;",
    ));
    suite.add_test(TestCase::should_succeed(
        "closure_program",
        "fun counter() { let n = 0; fun inc() { n = n + 1; return n; } return inc; }\n\
         let c = counter();\n\
         print c();",
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let mut all_passed = true;

    let suites = vec![
        create_malformed_expressions_tests(),
        create_edge_case_tests(),
        create_operator_tests(),
        create_statement_tests(),
        create_declaration_tests(),
        create_literal_tests(),
        create_function_call_tests(),
        create_assignment_tests(),
        create_positive_tests(),
    ];

    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            all_passed = false;
        }
    }

    assert!(all_passed, "some parser robustness suites failed; see output above");
}
