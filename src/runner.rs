use crate::error::SpudError;
use crate::evaluator::Evaluator;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::parser::Parser;
use std::io::Write;

/// Surfaces the first `Invalid` token as a lex error; the lexer itself never
/// fails, so this check is the pipeline's lex-error boundary.
fn check_lex(tokens: &[Token]) -> Result<(), SpudError> {
    match tokens.iter().find(|t| t.kind == TokenKind::Invalid) {
        Some(bad) => Err(SpudError::lex(bad.pos, bad.span, bad.lexeme.clone())),
        None => Ok(()),
    }
}

/// Diagnostic mode: lex and parse `source`, printing the fully parenthesized
/// prefix form of the tree to `out`. Returns 0 on success; lex and parse
/// failures are reported on `err` with their positions and return 1.
pub fn parse_only(source: &str, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    let tokens = Lexer::new(source.to_string()).scan();
    if let Err(e) = check_lex(&tokens) {
        let _ = writeln!(err, "{}", e);
        return 1;
    }

    match Parser::new(tokens).parse() {
        Ok(program) => {
            let _ = writeln!(out, "{}", program);
            0
        }
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            1
        }
    }
}

/// Executes `source` in a fresh interpreter session with the global `input`
/// variable pre-bound to the supplied text. Program output goes to `out`;
/// failures of any kind are reported on `err` and turn into status 1.
pub fn run_script(source: &str, input: &str, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    let tokens = Lexer::new(source.to_string()).scan();
    if let Err(e) = check_lex(&tokens) {
        let _ = writeln!(err, "{}", e);
        return 1;
    }

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            return 1;
        }
    };

    let mut evaluator = Evaluator::new(out, input);
    match evaluator.run(&program) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            1
        }
    }
}
