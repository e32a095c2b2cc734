use crate::ast::{BinaryOp, Expr, FunctionDecl, LogicalOp, Program, Stmt, UnaryOp};
use crate::error::SpudError;
use crate::lexer::{Token, TokenKind};
use crate::value::Value;
use std::rc::Rc;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the full program. Stops at the first structural violation and
    /// never returns a partial tree.
    pub fn parse(&mut self) -> Result<Program, SpudError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        Ok(Program { statements })
    }

    /// Declarations (`import`, `fun`, `let`) are valid anywhere a statement
    /// is; everything else falls through to `statement`.
    fn declaration(&mut self) -> Result<Stmt, SpudError> {
        if self.match_kind(TokenKind::Import) {
            self.import_statement()
        } else if self.match_kind(TokenKind::Fun) {
            self.function_declaration()
        } else if self.match_kind(TokenKind::Let) {
            self.let_statement()
        } else {
            self.statement()
        }
    }

    fn statement(&mut self) -> Result<Stmt, SpudError> {
        if self.match_kind(TokenKind::LeftBrace) {
            Ok(Stmt::Block {
                statements: self.block()?,
            })
        } else if self.match_kind(TokenKind::If) {
            self.if_statement()
        } else if self.match_kind(TokenKind::While) {
            self.while_statement()
        } else if self.match_kind(TokenKind::Return) {
            self.return_statement()
        } else if self.check(TokenKind::Identifier) && self.check_next(TokenKind::Equal) {
            self.assign_statement()
        } else if self.match_kind(TokenKind::Print) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn import_statement(&mut self) -> Result<Stmt, SpudError> {
        let (module, quoted) = if self.match_kind(TokenKind::String) {
            (self.previous().lexeme.clone(), true)
        } else {
            let name = self
                .consume(TokenKind::Identifier, "Expected module name after 'import'")?
                .lexeme
                .clone();
            (name, false)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after import statement")?;
        Ok(Stmt::Import { module, quoted })
    }

    fn let_statement(&mut self) -> Result<Stmt, SpudError> {
        let name = self
            .consume(TokenKind::Identifier, "Expected identifier after 'let'")?
            .lexeme
            .clone();
        self.consume(TokenKind::Equal, "Expected '=' after variable name")?;
        let init = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after let statement")?;
        Ok(Stmt::Let { name, init })
    }

    fn function_declaration(&mut self) -> Result<Stmt, SpudError> {
        let name = self
            .consume(TokenKind::Identifier, "Expected function name after 'fun'")?
            .lexeme
            .clone();
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param = self
                    .consume(TokenKind::Identifier, "Expected parameter name")?
                    .lexeme
                    .clone();
                params.push(param);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        self.consume(TokenKind::LeftBrace, "Expected '{' before function body")?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after function body")?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn print_statement(&mut self) -> Result<Stmt, SpudError> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after print statement")?;
        Ok(Stmt::Print { expr })
    }

    fn assign_statement(&mut self) -> Result<Stmt, SpudError> {
        let name = self
            .consume(TokenKind::Identifier, "Expected identifier")?
            .lexeme
            .clone();
        self.consume(TokenKind::Equal, "Expected '=' in assignment")?;
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after assignment")?;
        Ok(Stmt::Assign { name, value })
    }

    fn return_statement(&mut self) -> Result<Stmt, SpudError> {
        if self.match_kind(TokenKind::Semicolon) {
            return Ok(Stmt::Return { value: None });
        }
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after return value")?;
        Ok(Stmt::Return { value: Some(value) })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SpudError> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt, SpudError> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, SpudError> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> Result<Stmt, SpudError> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after expression")?;
        Ok(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Result<Expr, SpudError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.and()?;

        while self.match_kind(TokenKind::Or) {
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.equality()?;

        while self.match_kind(TokenKind::And) {
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.comparison()?;

        while self.match_kinds(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            let operator = match self.previous().kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                _ => BinaryOp::NotEqual,
            };
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.term()?;

        while self.match_kinds(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let operator = match self.previous().kind {
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                TokenKind::Less => BinaryOp::Less,
                _ => BinaryOp::LessEqual,
            };
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.factor()?;

        while self.match_kinds(&[TokenKind::Plus, TokenKind::Minus]) {
            let operator = match self.previous().kind {
                TokenKind::Plus => BinaryOp::Add,
                _ => BinaryOp::Subtract,
            };
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.unary()?;

        while self.match_kinds(&[TokenKind::Star, TokenKind::Slash]) {
            let operator = match self.previous().kind {
                TokenKind::Star => BinaryOp::Multiply,
                _ => BinaryOp::Divide,
            };
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, SpudError> {
        if self.match_kinds(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = match self.previous().kind {
                TokenKind::Bang => UnaryOp::Not,
                _ => UnaryOp::Negate,
            };
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, SpudError> {
        let mut expr = self.primary()?;

        while self.match_kind(TokenKind::LeftParen) {
            let mut args = Vec::new();
            if !self.check(TokenKind::RightParen) {
                loop {
                    args.push(self.expression()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, SpudError> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    SpudError::parse(token.pos, token.span, "Invalid number".to_string())
                })?;
                Ok(Expr::Literal {
                    value: Value::Number(value),
                    raw: Some(token.lexeme),
                })
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Str(token.lexeme),
                    raw: None,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Bool(true),
                    raw: None,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Bool(false),
                    raw: None,
                })
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Nil,
                    raw: None,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Variable { name: token.lexeme })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                })
            }
            _ => Err(SpudError::parse(
                token.pos,
                token.span,
                format!("Expected expression, got {}", token.kind.name()),
            )),
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        if self.current + 1 >= self.tokens.len() {
            return false;
        }
        self.tokens[self.current + 1].kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, SpudError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(SpudError::parse(
                found.pos,
                found.span,
                format!("{}, got {}", message, found.kind.name()),
            ))
        }
    }
}
