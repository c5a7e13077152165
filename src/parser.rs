use std::error::Error;
use std::fmt;

use crate::ast::{Expression, Program, Statement};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assign,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        Assign | PlusAssign | MinusAssign | AsteriskAssign | SlashAssign | PercentAssign => {
            Precedence::Assign
        }
        Eq | NotEq => Precedence::Equals,
        Lt | Gt | Lte | Gte => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Slash | Asterisk | Percent => Precedence::Product,
        LParen => Precedence::Call,
        LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn is_assignment_operator(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Assign | PlusAssign | MinusAssign | AsteriskAssign | SlashAssign | PercentAssign
    )
}

/// Hand-rolled Pratt parser: holds the lexer plus one token of lookahead on
/// top of the current token, and accumulates syntax errors rather than
/// failing on the first one so that later statements can still be attempted.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();
        Self {
            lexer,
            cur_token,
            peek_token,
            errors: vec![],
        }
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek_token.kind)
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(self.cur_token.kind)
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_token.kind == kind {
            self.next_token();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn peek_error(&mut self, expected: TokenKind) {
        self.errors.push(format!(
            "expected next token to be {expected:?}, got {:?}",
            self.peek_token.kind
        ));
    }

    /// Parses the whole input, returning the accumulated statements and any
    /// errors encountered. A non-empty error list means the program is not
    /// well-formed and must not be evaluated.
    pub fn parse_program(mut self) -> (Program, Vec<String>) {
        let mut program = vec![];
        while self.cur_token.kind != TokenKind::Eof {
            match self.parse_statement() {
                Some(stmt) => program.push(stmt),
                None => self.skip_to_statement_boundary(),
            }
            self.next_token();
        }
        (program, self.errors)
    }

    fn skip_to_statement_boundary(&mut self) {
        while self.cur_token.kind != TokenKind::Semicolon && self.cur_token.kind != TokenKind::Eof
        {
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Break => {
                if self.peek_token.kind == TokenKind::Semicolon {
                    self.next_token();
                }
                Some(Statement::Break)
            }
            TokenKind::Continue => {
                if self.peek_token.kind == TokenKind::Semicolon {
                    self.next_token();
                }
                Some(Statement::Continue)
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.kind == TokenKind::Semicolon {
            self.next_token();
        }

        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        if self.peek_token.kind == TokenKind::Semicolon {
            self.next_token();
            return Some(Statement::Return(None));
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.kind == TokenKind::Semicolon {
            self.next_token();
        }
        Some(Statement::Return(Some(value)))
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;

        Some(Statement::While { condition, body })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token.kind == TokenKind::Semicolon {
            self.next_token();
        }
        Some(Statement::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Option<Vec<Statement>> {
        let mut stmts = vec![];
        self.next_token();

        while self.cur_token.kind != TokenKind::RBrace && self.cur_token.kind != TokenKind::Eof {
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.skip_to_statement_boundary(),
            }
            self.next_token();
        }

        if self.cur_token.kind != TokenKind::RBrace {
            self.errors
                .push("expected next token to be RBrace, got Eof".into());
            return None;
        }

        Some(stmts)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while self.peek_token.kind != TokenKind::Semicolon && precedence < self.peek_precedence()
        {
            if is_assignment_operator(self.peek_token.kind) {
                self.next_token();
                left = self.parse_assign(left)?;
                continue;
            }
            match self.peek_token.kind {
                TokenKind::LParen => {
                    self.next_token();
                    left = self.parse_call_expression(left)?;
                }
                TokenKind::LBracket => {
                    self.next_token();
                    left = self.parse_index_expression(left)?;
                }
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::Asterisk
                | TokenKind::Percent
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Lte
                | TokenKind::Gte => {
                    self.next_token();
                    left = self.parse_infix_expression(left)?;
                }
                _ => return Some(left),
            }
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.cur_token.kind {
            TokenKind::Ident => Some(Expression::Identifier(self.cur_token.literal.clone())),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::Str => Some(Expression::StringLiteral(self.cur_token.literal.clone())),
            TokenKind::True => Some(Expression::Boolean(true)),
            TokenKind::False => Some(Expression::Boolean(false)),
            TokenKind::Null => Some(Expression::Null),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            other => {
                self.errors
                    .push(format!("no prefix parse function for {other:?} found"));
                None
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.cur_token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.errors.push(format!(
                    "could not parse {:?} as integer",
                    self.cur_token.literal
                ));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = self.cur_token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.cur_token.literal.clone();
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_assign(&mut self, target: Expression) -> Option<Expression> {
        let operator = self.cur_token.literal.clone();
        self.next_token();
        // Parsing the right-hand side at Lowest (rather than Assign) makes
        // chained assignment right-associative: `a = b = 3` parses as
        // `a = (b = 3)`.
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expression::Assign {
            target: Box::new(target),
            operator,
            value: Box::new(value),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token.kind == TokenKind::Else {
            self.next_token();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;

        Some(Expression::FunctionLiteral { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut params = vec![];

        if self.peek_token.kind == TokenKind::RParen {
            self.next_token();
            return Some(params);
        }

        self.next_token();
        params.push(self.cur_token.literal.clone());

        while self.peek_token.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            params.push(self.cur_token.literal.clone());
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(params)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expression::IndexExpression {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::ArrayLiteral(elements))
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = vec![];

        while self.peek_token.kind != TokenKind::RBrace {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek_token.kind != TokenKind::RBrace && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }

        Some(Expression::HashLiteral(pairs))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = vec![];

        if self.peek_token.kind == end {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }
}

/// Parses `source` into a program. The caller must check `errors` before
/// evaluating: a non-empty list means the whole program is malformed.
pub fn parse(source: &str) -> (Program, Vec<String>) {
    Parser::new(source).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        program
    }

    #[test]
    fn test_let_statements() {
        let program = parse_ok("let x = 5; let y = true; let foobar = y;");
        assert_eq!(program.len(), 3);
        assert_eq!(
            program[0],
            Statement::Let {
                name: "x".into(),
                value: Expression::IntegerLiteral(5)
            }
        );
    }

    #[test]
    fn test_return_statement() {
        let program = parse_ok("return 5;");
        assert_eq!(
            program[0],
            Statement::Return(Some(Expression::IntegerLiteral(5)))
        );
    }

    #[test]
    fn test_operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
            ("a % b", "(a % b)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
        ];
        for (src, expected) in cases {
            let program = parse_ok(&format!("{src};"));
            assert_eq!(program[0].to_string(), expected, "input was {src}");
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let program = parse_ok("a = b = 3;");
        assert_eq!(program[0].to_string(), "a = b = 3");
    }

    #[test]
    fn test_compound_assignment_parses() {
        let program = parse_ok("x += 1;");
        match &program[0] {
            Statement::Expression(Expression::Assign { operator, .. }) => {
                assert_eq!(operator, "+=");
            }
            other => panic!("expected assign expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_if_else_expression() {
        let program = parse_ok("if (x < y) { x } else { y }");
        match &program[0] {
            Statement::Expression(Expression::If { alternative, .. }) => {
                assert!(alternative.is_some());
            }
            other => panic!("expected if expression, got {other:?}"),
        }
    }

    #[test]
    fn test_function_literal_parameters() {
        let program = parse_ok("fn(x, y) { x + y; }");
        match &program[0] {
            Statement::Expression(Expression::FunctionLiteral { parameters, .. }) => {
                assert_eq!(parameters, &vec!["x".to_string(), "y".to_string()]);
            }
            other => panic!("expected function literal, got {other:?}"),
        }
    }

    #[test]
    fn test_call_expression_arguments() {
        let program = parse_ok("add(1, 2 * 3, 4 + 5);");
        match &program[0] {
            Statement::Expression(Expression::Call { arguments, .. }) => {
                assert_eq!(arguments.len(), 3);
            }
            other => panic!("expected call expression, got {other:?}"),
        }
    }

    #[test]
    fn test_while_statement() {
        let program = parse_ok("while (x < 10) { x = x + 1; }");
        match &program[0] {
            Statement::While { body, .. } => assert_eq!(body.len(), 1),
            other => panic!("expected while statement, got {other:?}"),
        }
    }

    #[test]
    fn test_hash_literal() {
        let program = parse_ok(r#"{"one": 1, "two": 2}"#);
        match &program[0] {
            Statement::Expression(Expression::HashLiteral(pairs)) => assert_eq!(pairs.len(), 2),
            other => panic!("expected hash literal, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_closing_paren_reports_error() {
        let (_, errors) = parse("let x = (1 + 2;");
        assert!(!errors.is_empty());
    }
}
