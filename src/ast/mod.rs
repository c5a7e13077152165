//! The abstract syntax tree produced by the parser.
//!
//! Both statements and expressions are plain sum types; the evaluator matches
//! over them exhaustively rather than dispatching through object hierarchies.

use std::fmt;

pub type Program = Vec<Statement>;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: String, value: Expression },
    Return(Option<Expression>),
    Expression(Expression),
    Block(Vec<Statement>),
    While { condition: Expression, body: Vec<Statement> },
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    IntegerLiteral(i64),
    StringLiteral(String),
    Boolean(bool),
    Null,
    Prefix {
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: Vec<Statement>,
        alternative: Option<Vec<Statement>>,
    },
    FunctionLiteral {
        parameters: Vec<String>,
        body: Vec<Statement>,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    ArrayLiteral(Vec<Expression>),
    IndexExpression {
        left: Box<Expression>,
        index: Box<Expression>,
    },
    HashLiteral(Vec<(Expression, Expression)>),
    Assign {
        target: Box<Expression>,
        operator: String,
        value: Box<Expression>,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {name} = {value};"),
            Statement::Return(Some(value)) => write!(f, "return {value};"),
            Statement::Return(None) => write!(f, "return;"),
            Statement::Expression(expr) => write!(f, "{expr}"),
            Statement::Block(stmts) => {
                write!(f, "{{ ")?;
                for stmt in stmts {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}}")
            }
            Statement::While { condition, body } => {
                write!(f, "while ({condition}) {{ ")?;
                for stmt in body {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}}")
            }
            Statement::Break => write!(f, "break;"),
            Statement::Continue => write!(f, "continue;"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{name}"),
            Expression::IntegerLiteral(v) => write!(f, "{v}"),
            Expression::StringLiteral(s) => write!(f, "{s}"),
            Expression::Boolean(b) => write!(f, "{b}"),
            Expression::Null => write!(f, "null"),
            Expression::Prefix { operator, right } => write!(f, "({operator}{right})"),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if{condition} ")?;
                write!(f, "{{ ")?;
                for stmt in consequence {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {{ ")?;
                    for stmt in alt {
                        write!(f, "{stmt} ")?;
                    }
                    write!(f, "}}")?;
                }
                Ok(())
            }
            Expression::FunctionLiteral { parameters, body } => {
                write!(f, "fn({}) {{ ", parameters.join(", "))?;
                for stmt in body {
                    write!(f, "{stmt} ")?;
                }
                write!(f, "}}")
            }
            Expression::Call { function, arguments } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{function}({})", args.join(", "))
            }
            Expression::ArrayLiteral(elements) => {
                let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Expression::IndexExpression { left, index } => write!(f, "({left}[{index}])"),
            Expression::HashLiteral(pairs) => {
                let items: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Expression::Assign {
                target,
                operator,
                value,
            } => write!(f, "{target} {operator} {value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_let_statement() {
        let stmt = Statement::Let {
            name: "x".into(),
            value: Expression::IntegerLiteral(5),
        };
        assert_eq!(stmt.to_string(), "let x = 5;");
    }

    #[test]
    fn test_display_infix_precedence_grouping() {
        let expr = Expression::Infix {
            left: Box::new(Expression::IntegerLiteral(1)),
            operator: "+".into(),
            right: Box::new(Expression::Infix {
                left: Box::new(Expression::IntegerLiteral(2)),
                operator: "*".into(),
                right: Box::new(Expression::IntegerLiteral(3)),
            }),
        };
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");
    }
}
