use crate::ast::Stmt;
use crate::error::SpudError;
use crate::evaluator::Evaluator;
use crate::lexer::{Lexer, TokenKind};
use crate::parser::Parser;
use std::io::{self, BufRead, Write};

pub fn start() {
    println!("spud v0.1.0");
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    // One session for the whole loop, so bindings persist between lines
    let mut out = io::stdout();
    let mut evaluator = Evaluator::new(&mut out, "");

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                run_line(line, &mut evaluator);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_line(source: &str, evaluator: &mut Evaluator) {
    let tokens = Lexer::new(source.to_string()).scan();
    if let Some(bad) = tokens.iter().find(|t| t.kind == TokenKind::Invalid) {
        SpudError::lex(bad.pos, bad.span, bad.lexeme.clone()).report(source, None);
        return;
    }

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // A lone expression statement echoes its value
    if program.statements.len() == 1 {
        if let Stmt::Expression { expr } = &program.statements[0] {
            match evaluator.evaluate_expression(expr) {
                Ok(value) => println!("{}", value),
                Err(error) => error.report(source, None),
            }
            return;
        }
    }

    if let Err(error) = evaluator.run(&program) {
        error.report(source, None);
    }
}
