pub mod ast;
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod token;

use std::cell::RefCell;
use std::rc::Rc;

use environment::Environment;
use object::Object;

/// Tokenizes `source` fully, returning its tokens in order (ending in `Eof`).
pub fn lex(source: &str) -> Vec<token::Token> {
    let mut lexer = lexer::Lexer::new(source);
    let mut tokens = vec![];
    loop {
        let tok = lexer.next_token();
        let done = tok.kind == token::TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    tokens
}

/// Parses `source` into a program plus any syntax errors. A non-empty error
/// list means the program is not well-formed and must not be evaluated.
pub fn parse(source: &str) -> (ast::Program, Vec<String>) {
    parser::parse(source)
}

/// Evaluates an already-parsed program against `env`.
pub fn evaluate(program: &ast::Program, env: &Rc<RefCell<Environment>>) -> Object {
    evaluator::eval_program(program, env)
}

/// Creates a fresh, empty top-level environment.
pub fn new_environment() -> Rc<RefCell<Environment>> {
    Environment::new()
}
