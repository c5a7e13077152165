use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::ast::{Expression, Program, Statement};
use crate::config::Config;
use crate::environment::Environment;
use crate::object::{BuiltinFn, FunctionObj, Hashable, Object, FALSE, NULL, TRUE};

/// Tracks the innermost enclosing construct so `return`/`break`/`continue`
/// can be validated against where they actually appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    None,
    Function,
    Loop,
}

thread_local! {
    static CALL_DEPTH: RefCell<usize> = const { RefCell::new(0) };
    static MAX_CALL_DEPTH: RefCell<usize> = const { RefCell::new(1024) };
}

/// Applies a loaded [`Config`]'s recursion guard to the evaluator. Call once
/// before evaluating; defaults to 1024 if never called.
pub fn configure(config: &Config) {
    MAX_CALL_DEPTH.with(|depth| *depth.borrow_mut() = config.max_call_depth);
}

fn new_error(message: impl Into<String>) -> Object {
    Object::Error(message.into())
}

fn is_compound_assignment_operator(operator: &str) -> bool {
    matches!(operator, "+=" | "-=" | "*=" | "/=" | "%=")
}

/// Strips a trailing `=` from a compound-assignment operator so the
/// remainder can be fed straight into [`eval_infix_expression`].
fn base_operator(operator: &str) -> &str {
    operator.strip_suffix('=').unwrap_or(operator)
}

pub fn eval_program(program: &Program, env: &Rc<RefCell<Environment>>) -> Object {
    let mut result = Object::Null;
    for stmt in program {
        result = eval_statement(stmt, env, Scope::None);
        match result {
            Object::ReturnValue(value) => return *value,
            Object::Error(_) => return result,
            _ => {}
        }
    }
    result
}

fn eval_block_statement(block: &[Statement], env: &Rc<RefCell<Environment>>, scope: Scope) -> Object {
    let mut result = Object::Null;
    for stmt in block {
        result = eval_statement(stmt, env, scope);
        if matches!(
            result,
            Object::ReturnValue(_) | Object::Break | Object::Continue | Object::Error(_)
        ) {
            return result;
        }
    }
    result
}

fn eval_statement(stmt: &Statement, env: &Rc<RefCell<Environment>>, scope: Scope) -> Object {
    match stmt {
        Statement::Let { name, value } => {
            let val = eval_expression(value, env, scope);
            if val.is_error() {
                return val;
            }
            Environment::set(env, name.clone(), val);
            Object::Null
        }
        Statement::Return(value) => {
            let val = match value {
                Some(expr) => eval_expression(expr, env, scope),
                None => Object::Null,
            };
            if val.is_error() {
                return val;
            }
            Object::ReturnValue(Box::new(val))
        }
        Statement::Expression(expr) => eval_expression(expr, env, scope),
        Statement::Block(stmts) => eval_block_statement(stmts, env, scope),
        Statement::While { condition, body } => eval_while_statement(condition, body, env, scope),
        Statement::Break => Object::Break,
        Statement::Continue => Object::Continue,
    }
}

fn eval_expression(expr: &Expression, env: &Rc<RefCell<Environment>>, scope: Scope) -> Object {
    match expr {
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::IntegerLiteral(value) => Object::Integer(*value),
        Expression::StringLiteral(value) => Object::new_string(value.clone()),
        Expression::Boolean(value) => native_bool(*value),
        Expression::Null => Object::Null,
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env, scope);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(operator, right)
        }
        Expression::Infix {
            left,
            operator,
            right,
        } => {
            let left = eval_expression(left, env, scope);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env, scope);
            if right.is_error() {
                return right;
            }
            eval_infix_expression(operator, &left, &right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => eval_if_expression(condition, consequence, alternative.as_deref(), env, scope),
        Expression::FunctionLiteral { parameters, body } => {
            Object::Function(Rc::new(FunctionObj {
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            }))
        }
        Expression::Call { function, arguments } => {
            let func = eval_expression(function, env, scope);
            if func.is_error() {
                return func;
            }
            let args = match eval_expressions(arguments, env, scope) {
                Ok(args) => args,
                Err(err) => return err,
            };
            apply_function(func, args)
        }
        Expression::ArrayLiteral(elements) => match eval_expressions(elements, env, scope) {
            Ok(elements) => Object::new_array(elements),
            Err(err) => err,
        },
        Expression::IndexExpression { left, index } => {
            let left = eval_expression(left, env, scope);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env, scope);
            if index.is_error() {
                return index;
            }
            eval_index_expression(&left, &index)
        }
        Expression::HashLiteral(pairs) => eval_hash_literal(pairs, env, scope),
        Expression::Assign {
            target,
            operator,
            value,
        } => eval_assign_expression(target, operator, value, env, scope),
    }
}

fn native_bool(value: bool) -> Object {
    if value {
        TRUE.clone()
    } else {
        FALSE.clone()
    }
}

fn eval_expressions(
    exprs: &[Expression],
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Result<Vec<Object>, Object> {
    let mut result = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let value = eval_expression(expr, env, scope);
        if value.is_error() {
            return Err(value);
        }
        result.push(value);
    }
    Ok(result)
}

fn eval_identifier(name: &str, env: &Rc<RefCell<Environment>>) -> Object {
    if let Some(value) = Environment::get(env, name) {
        return value;
    }
    if let Some((builtin_name, func)) = lookup_builtin(name) {
        return Object::Builtin(builtin_name, func);
    }
    new_error(format!("identifier not found: {name}"))
}

fn eval_prefix_expression(operator: &str, right: Object) -> Object {
    match operator {
        "!" => eval_bang_expression(&right),
        "-" => match right {
            Object::Integer(value) => Object::Integer(value.wrapping_neg()),
            other => new_error(format!("unknown operator: -{}", other.type_tag())),
        },
        other => new_error(format!("unknown operator: {other}{}", right.type_tag())),
    }
}

fn eval_bang_expression(right: &Object) -> Object {
    match right {
        Object::Boolean(true) => FALSE.clone(),
        Object::Boolean(false) | Object::Null => TRUE.clone(),
        Object::Integer(0) => TRUE.clone(),
        _ => FALSE.clone(),
    }
}

fn eval_infix_expression(operator: &str, left: &Object, right: &Object) -> Object {
    match (left, right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix_expression(operator, *l, *r),
        (Object::Str(l), Object::Str(r)) => eval_string_infix_expression(operator, l, r),
        _ if operator == "==" => native_bool(left.identity_eq(right)),
        _ if operator == "!=" => native_bool(!left.identity_eq(right)),
        _ if left.type_tag() != right.type_tag() => new_error(format!(
            "type mismatch: {} {operator} {}",
            left.type_tag(),
            right.type_tag()
        )),
        _ => new_error(format!(
            "unknown operator: {} {operator} {}",
            left.type_tag(),
            right.type_tag()
        )),
    }
}

fn eval_integer_infix_expression(operator: &str, left: i64, right: i64) -> Object {
    match operator {
        "+" | "+=" => Object::Integer(left.wrapping_add(right)),
        "-" | "-=" => Object::Integer(left.wrapping_sub(right)),
        "*" | "*=" => Object::Integer(left.wrapping_mul(right)),
        "/" | "/=" => {
            if right == 0 {
                new_error("division by zero")
            } else {
                Object::Integer(left.wrapping_div(right))
            }
        }
        "%" | "%=" => {
            if right == 0 {
                new_error("modulo by zero")
            } else {
                Object::Integer(left.wrapping_rem(right))
            }
        }
        "==" => native_bool(left == right),
        "!=" => native_bool(left != right),
        ">" => native_bool(left > right),
        ">=" => native_bool(left >= right),
        "<" => native_bool(left < right),
        "<=" => native_bool(left <= right),
        other => new_error(format!("unknown operator: INTEGER {other} INTEGER")),
    }
}

fn eval_string_infix_expression(operator: &str, left: &str, right: &str) -> Object {
    match operator {
        "+" => Object::new_string(format!("{left}{right}")),
        other => new_error(format!("unknown operator: STRING {other} STRING")),
    }
}

fn eval_index_expression(left: &Object, index: &Object) -> Object {
    match (left, index) {
        (Object::Array(_), Object::Integer(_)) => eval_array_index_expression(left, index),
        (Object::Hash(_), _) => eval_hash_index_expression(left, index),
        _ => new_error(format!("index operator not supported: {}", left.type_tag())),
    }
}

fn eval_array_index_expression(array: &Object, index: &Object) -> Object {
    let Object::Array(elements) = array else {
        unreachable!()
    };
    let Object::Integer(idx) = index else {
        unreachable!()
    };
    let elements = elements.borrow();
    let max = elements.len() as i64 - 1;
    if *idx < 0 || *idx > max {
        return Object::Null;
    }
    elements[*idx as usize].clone()
}

fn eval_hash_index_expression(hash: &Object, index: &Object) -> Object {
    let Object::Hash(pairs) = hash else { unreachable!() };
    let Some(key) = index.hash_key() else {
        return new_error(format!("unusable as hash key: {}", index.type_tag()));
    };
    match pairs.borrow().get(&key) {
        Some((_, value)) => value.clone(),
        None => Object::Null,
    }
}

fn eval_hash_literal(
    pairs: &[(Expression, Expression)],
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Object {
    let mut map = HashMap::new();
    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env, scope);
        if key.is_error() {
            return key;
        }
        let Some(hash_key) = key.hash_key() else {
            return new_error(format!("unusable as hash key: {}", key.type_tag()));
        };
        let value = eval_expression(value_expr, env, scope);
        if value.is_error() {
            return value;
        }
        map.insert(hash_key, (key, value));
    }
    Object::Hash(Rc::new(RefCell::new(map)))
}

fn eval_if_expression(
    condition: &Expression,
    consequence: &[Statement],
    alternative: Option<&[Statement]>,
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Object {
    let condition = eval_expression(condition, env, scope);
    if condition.is_error() {
        return condition;
    }
    if condition.is_truthy() {
        eval_block_statement(consequence, env, scope)
    } else if let Some(alternative) = alternative {
        eval_block_statement(alternative, env, scope)
    } else {
        Object::Null
    }
}

fn eval_while_statement(
    condition_expr: &Expression,
    body: &[Statement],
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Object {
    let loop_env = Environment::enclosed(env.clone());

    let mut condition = eval_expression(condition_expr, &loop_env, scope);
    if condition.is_error() {
        return condition;
    }

    while condition.is_truthy() {
        let result = eval_block_statement(body, &loop_env, Scope::Loop);
        match result {
            Object::Break => return Object::Null,
            Object::Continue => {
                condition = eval_expression(condition_expr, &loop_env, Scope::Loop);
                if condition.is_error() {
                    return condition;
                }
                continue;
            }
            Object::ReturnValue(_) => {
                if scope == Scope::Function {
                    return result;
                }
                return new_error("return statement unsupported if while-loop not inside a function");
            }
            Object::Error(_) => return result,
            _ => {}
        }

        condition = eval_expression(condition_expr, &loop_env, scope);
        if condition.is_error() {
            return condition;
        }
    }

    Object::Null
}

fn eval_assign_expression(
    target: &Expression,
    operator: &str,
    value: &Expression,
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Object {
    match target {
        Expression::Identifier(name) => {
            eval_identifier_assign(name, operator, value, env, scope)
        }
        Expression::IndexExpression { left, index } => {
            eval_index_assign(left, index, operator, value, env, scope)
        }
        other => new_error(format!("invalid identifier when assign value: {other}")),
    }
}

fn eval_identifier_assign(
    name: &str,
    operator: &str,
    value: &Expression,
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Object {
    let mut val = eval_expression(value, env, scope);
    if val.is_error() {
        return val;
    }

    let Some(current) = Environment::get(env, name) else {
        return new_error(format!("identifier not found: {name}"));
    };

    if is_compound_assignment_operator(operator) {
        if !matches!((&current, &val), (Object::Integer(_), Object::Integer(_))) {
            return new_error(format!(
                "unsupported assign {} {operator} {}",
                current.type_tag(),
                val.type_tag()
            ));
        }
        val = eval_infix_expression(base_operator(operator), &current, &val);
    }

    Environment::assign(env, name, val.clone());
    val
}

fn eval_index_assign(
    target: &Expression,
    index_expr: &Expression,
    operator: &str,
    value: &Expression,
    env: &Rc<RefCell<Environment>>,
    scope: Scope,
) -> Object {
    let Expression::Identifier(name) = target else {
        return new_error("invalid identifier using index");
    };

    let Some(current) = Environment::get(env, name) else {
        return new_error(format!("identifier not found: {name}"));
    };

    let index = eval_expression(index_expr, env, scope);
    if index.is_error() {
        return index;
    }

    let mut val = eval_expression(value, env, scope);
    if val.is_error() {
        return val;
    }

    match (&current, &index) {
        (Object::Array(elements), Object::Integer(idx)) => {
            let n = elements.borrow().len();
            if n == 0 {
                return new_error("array is empty. cannot set at any index");
            }
            let i = *idx;
            if i < 0 || i as usize >= n {
                return new_error(format!("valid index range is 0 until {}. got={i}", n - 1));
            }
            let i = i as usize;
            if is_compound_assignment_operator(operator) {
                let cur_elem = elements.borrow()[i].clone();
                if !matches!((&cur_elem, &val), (Object::Integer(_), Object::Integer(_))) {
                    return new_error(format!(
                        "unsupported assign {}[{}] -> {} {operator} {}",
                        current.type_tag(),
                        index.type_tag(),
                        cur_elem.type_tag(),
                        val.type_tag()
                    ));
                }
                val = eval_infix_expression(base_operator(operator), &cur_elem, &val);
            }
            elements.borrow_mut()[i] = val.clone();
            Environment::assign(env, name, current.clone());
            val
        }
        (Object::Hash(pairs), _) => {
            let Some(hash_key) = index.hash_key() else {
                return new_error(format!("unusable as hash key: {}", index.type_tag()));
            };
            if is_compound_assignment_operator(operator) {
                let existing = pairs.borrow().get(&hash_key).cloned();
                let Some((_, cur_val)) = existing else {
                    return new_error(format!(
                        "cannot assign key not exist: {name}[{index}] {operator} {val}"
                    ));
                };
                if !matches!((&cur_val, &val), (Object::Integer(_), Object::Integer(_))) {
                    return new_error(format!(
                        "unsupported assign {}[{}] -> {} {operator} {}",
                        current.type_tag(),
                        index.type_tag(),
                        cur_val.type_tag(),
                        val.type_tag()
                    ));
                }
                val = eval_infix_expression(base_operator(operator), &cur_val, &val);
            }
            pairs.borrow_mut().insert(hash_key, (index.clone(), val.clone()));
            Environment::assign(env, name, current.clone());
            val
        }
        _ => new_error(format!(
            "index not supported: {}[{}]",
            current.type_tag(),
            index.type_tag()
        )),
    }
}

fn apply_function(func: Object, args: Vec<Object>) -> Object {
    match func {
        Object::Function(function) => {
            let depth_exceeded = CALL_DEPTH.with(|depth| {
                let max = MAX_CALL_DEPTH.with(|m| *m.borrow());
                let mut depth = depth.borrow_mut();
                *depth += 1;
                *depth > max
            });
            if depth_exceeded {
                CALL_DEPTH.with(|depth| *depth.borrow_mut() -= 1);
                return new_error("stack overflow: max call depth exceeded");
            }

            let extended_env = extend_function_env(&function, &args);
            let evaluated = eval_block_statement(&function.body, &extended_env, Scope::Function);

            CALL_DEPTH.with(|depth| *depth.borrow_mut() -= 1);

            match evaluated {
                Object::Break | Object::Continue => {
                    new_error(format!("invalid keyword inside function: {}", evaluated.type_tag()))
                }
                Object::ReturnValue(value) => *value,
                other => other,
            }
        }
        Object::Builtin(_, native) => native(&args),
        other => new_error(format!("not a function: {}", other.type_tag())),
    }
}

fn extend_function_env(func: &FunctionObj, args: &[Object]) -> Rc<RefCell<Environment>> {
    let env = Environment::enclosed(func.env.clone());
    for (param, arg) in func.parameters.iter().zip(args.iter()) {
        Environment::set(&env, param.clone(), arg.clone());
    }
    env
}

fn lookup_builtin(name: &str) -> Option<(&'static str, BuiltinFn)> {
    BUILTINS.get(name).copied()
}

static BUILTINS: Lazy<HashMap<&'static str, (&'static str, BuiltinFn)>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, (&'static str, BuiltinFn)> = HashMap::new();
    m.insert("len", ("len", builtin_len));
    m.insert("first", ("first", builtin_first));
    m.insert("last", ("last", builtin_last));
    m.insert("rest", ("rest", builtin_rest));
    m.insert("push", ("push", builtin_push));
    m.insert("puts", ("puts", builtin_puts));
    m
});

fn wrong_arity(got: usize, want: usize) -> Object {
    new_error(format!("wrong number of arguments. got={got}, want={want}"))
}

fn builtin_len(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => Object::Integer(elements.borrow().len() as i64),
        Object::Str(s) => Object::Integer(s.len() as i64),
        Object::Hash(pairs) => Object::Integer(pairs.borrow().len() as i64),
        other => new_error(format!("argument to `len` not supported, got {}", other.type_tag())),
    }
}

fn builtin_first(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    let Object::Array(elements) = &args[0] else {
        return new_error(format!(
            "argument to `first` must be ARRAY, got {}",
            args[0].type_tag()
        ));
    };
    elements.borrow().first().cloned().unwrap_or(Object::Null)
}

fn builtin_last(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    let Object::Array(elements) = &args[0] else {
        return new_error(format!(
            "argument to `last` must be ARRAY, got {}",
            args[0].type_tag()
        ));
    };
    elements.borrow().last().cloned().unwrap_or(Object::Null)
}

fn builtin_rest(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    let Object::Array(elements) = &args[0] else {
        return new_error(format!(
            "argument to `rest` must be ARRAY, got {}",
            args[0].type_tag()
        ));
    };
    let elements = elements.borrow();
    if elements.is_empty() {
        Object::new_array(vec![])
    } else {
        Object::new_array(elements[1..].to_vec())
    }
}

fn builtin_push(args: &[Object]) -> Object {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }
    let Object::Array(elements) = &args[0] else {
        return new_error(format!(
            "argument to `push` must be ARRAY, got {}",
            args[0].type_tag()
        ));
    };
    let mut new_elements = elements.borrow().clone();
    new_elements.push(args[1].clone());
    Object::new_array(new_elements)
}

fn builtin_puts(args: &[Object]) -> Object {
    let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    println!("{}", rendered.join(" "));
    Object::Null
}
