use std::path::Path;

use crate::error::LispResult;
use crate::eval::Interp;
use crate::globals::extend;
use crate::value::{PrimId, Value};

/// A built-in operation. It receives the *unevaluated* argument list and the
/// caller's environment, and decides for itself what to evaluate.
pub type PrimFn = fn(&mut Interp, Value, Value) -> LispResult<Value>;

pub struct Primitive {
    pub name: &'static str,
    pub func: PrimFn,
}

/// The primitive table. A `PRIM` value's ordinal is its index here, so the
/// order is part of the value encoding and must not change.
pub static PRIMITIVES: &[Primitive] = &[
    Primitive { name: "eval", func: prim_eval },
    Primitive { name: "quote", func: prim_quote },
    Primitive { name: "cons", func: prim_cons },
    Primitive { name: "car", func: prim_car },
    Primitive { name: "cdr", func: prim_cdr },
    Primitive { name: "+", func: prim_add },
    Primitive { name: "-", func: prim_sub },
    Primitive { name: "*", func: prim_mul },
    Primitive { name: "/", func: prim_div },
    Primitive { name: "int", func: prim_int },
    Primitive { name: "<", func: prim_lt },
    Primitive { name: "eq?", func: prim_eq },
    Primitive { name: "pair?", func: prim_pair },
    Primitive { name: "or", func: prim_or },
    Primitive { name: "and", func: prim_and },
    Primitive { name: "not", func: prim_not },
    Primitive { name: "cond", func: prim_cond },
    Primitive { name: "if", func: prim_if },
    Primitive { name: "let*", func: prim_let_star },
    Primitive { name: "lambda", func: prim_lambda },
    Primitive { name: "define", func: prim_define },
    Primitive { name: "load", func: prim_load },
];

/// Resolve a primitive ordinal. O(1): the ordinal is the table index.
pub fn lookup(id: PrimId) -> Option<&'static Primitive> {
    PRIMITIVES.get(id.0 as usize)
}

fn truth(b: bool) -> Value {
    if b {
        Interp::TRUE
    } else {
        Value::Nil
    }
}

/// First evaluated argument.
fn first_arg(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let args = interp.evlis(t, e)?;
    Ok(interp.car(args))
}

/// First and second evaluated arguments.
fn two_args(interp: &mut Interp, t: Value, e: Value) -> LispResult<(Value, Value)> {
    let args = interp.evlis(t, e)?;
    let second = interp.cdr(args);
    Ok((interp.car(args), interp.car(second)))
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Left fold over the evaluated arguments, starting from the first one.
/// Any non-number operand (or no operands at all) yields `ERR`.
fn fold_numbers(
    interp: &mut Interp,
    t: Value,
    e: Value,
    op: fn(f64, f64) -> f64,
) -> LispResult<Value> {
    let args = interp.evlis(t, e)?;
    let Some(mut acc) = interp.car(args).as_number() else {
        return Ok(Interp::ERR);
    };
    let mut rest = interp.cdr(args);
    while rest.is_cons() {
        match interp.car(rest).as_number() {
            Some(n) => acc = op(acc, n),
            None => return Ok(Interp::ERR),
        }
        rest = interp.cdr(rest);
    }
    Ok(Value::Number(acc))
}

/// (+ a b ...)
fn prim_add(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    fold_numbers(interp, t, e, |a, b| a + b)
}

/// (- a b ...): a single argument is returned as is, not negated.
fn prim_sub(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    fold_numbers(interp, t, e, |a, b| a - b)
}

/// (* a b ...)
fn prim_mul(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    fold_numbers(interp, t, e, |a, b| a * b)
}

/// (/ a b ...)
fn prim_div(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    fold_numbers(interp, t, e, |a, b| a / b)
}

/// (int x): truncate toward zero when |x| < 1e16; anything else passes through.
fn prim_int(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let x = first_arg(interp, t, e)?;
    match x.as_number() {
        Some(n) if n > -1e16 && n < 1e16 => Ok(Value::Number(n as i64 as f64)),
        _ => Ok(x),
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// (< a b): numeric less-than; `()` unless both are numbers.
fn prim_lt(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let (a, b) = two_args(interp, t, e)?;
    Ok(match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => truth(x < y),
        _ => Value::Nil,
    })
}

/// (eq? a b): bit identity.
fn prim_eq(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let (a, b) = two_args(interp, t, e)?;
    Ok(truth(a.equal_bits(b)))
}

/// (pair? x): true for cons cells only; closures are not pairs.
fn prim_pair(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let x = first_arg(interp, t, e)?;
    Ok(truth(x.is_cons()))
}

/// (not x)
fn prim_not(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let x = first_arg(interp, t, e)?;
    Ok(truth(x.is_nil()))
}

// ============================================================================
// Pairs
// ============================================================================

/// (cons a b)
fn prim_cons(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let (a, b) = two_args(interp, t, e)?;
    interp.arena.cons(a, b)
}

/// (car x)
fn prim_car(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let x = first_arg(interp, t, e)?;
    Ok(interp.car(x))
}

/// (cdr x)
fn prim_cdr(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let x = first_arg(interp, t, e)?;
    Ok(interp.cdr(x))
}

// ============================================================================
// Special forms
// ============================================================================

/// (quote x)
fn prim_quote(interp: &mut Interp, t: Value, _e: Value) -> LispResult<Value> {
    Ok(interp.car(t))
}

/// (eval x): evaluate x, then evaluate the result again in the same scope.
fn prim_eval(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let x = first_arg(interp, t, e)?;
    interp.eval(x, e)
}

/// (or a b ...): first truthy value, or the last falsy one.
fn prim_or(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let mut x = Value::Nil;
    let mut rest = t;
    while rest.is_cons() {
        x = interp.eval(interp.car(rest), e)?;
        if x.is_truthy() {
            break;
        }
        rest = interp.cdr(rest);
    }
    Ok(x)
}

/// (and a b ...): first falsy value, or the last truthy one.
fn prim_and(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let mut x = Interp::TRUE;
    let mut rest = t;
    while rest.is_cons() {
        x = interp.eval(interp.car(rest), e)?;
        if x.is_nil() {
            break;
        }
        rest = interp.cdr(rest);
    }
    Ok(x)
}

/// (cond (test expr) ...): evaluates the expr of the first clause whose
/// test is not `()`. Running out of clauses yields `ERR`.
fn prim_cond(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let mut clauses = t;
    while clauses.is_cons() {
        let clause = interp.car(clauses);
        if interp.eval(interp.car(clause), e)?.is_truthy() {
            let body = interp.cdr(clause);
            return interp.eval(interp.car(body), e);
        }
        clauses = interp.cdr(clauses);
    }
    Ok(Interp::ERR)
}

/// (if test then else)
fn prim_if(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let test = interp.eval(interp.car(t), e)?;
    let branches = interp.cdr(t);
    let branch = if test.is_nil() {
        interp.car(interp.cdr(branches))
    } else {
        interp.car(branches)
    };
    interp.eval(branch, e)
}

/// (let* (a x) (b y) ... body): each binding sees the ones before it; the
/// last element is the body.
fn prim_let_star(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let mut rest = t;
    let mut env = e;
    while rest.is_cons() && interp.cdr(rest).is_truthy() {
        let binding = interp.car(rest);
        let name = interp.car(binding);
        let init = interp.car(interp.cdr(binding));
        let val = interp.eval(init, env)?;
        env = extend(&mut interp.arena, name, val, env)?;
        rest = interp.cdr(rest);
    }
    interp.eval(interp.car(rest), env)
}

/// (lambda params body)
fn prim_lambda(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let params = interp.car(t);
    let body = interp.car(interp.cdr(t));
    interp.closure(params, body, e)
}

/// (define name expr): prepend to the global environment, return the name.
fn prim_define(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let name = interp.car(t);
    let val = interp.eval(interp.car(interp.cdr(t)), e)?;
    interp.define(name, val)?;
    Ok(name)
}

/// (load 'path): evaluate every form in a file against the global
/// environment. Failures come back as sentinel atoms.
fn prim_load(interp: &mut Interp, t: Value, e: Value) -> LispResult<Value> {
    let args = interp.evlis(t, e)?;
    if args.is_nil() {
        return interp.intern("MISSING-FILENAME");
    }
    let Some(id) = interp.car(args).as_atom() else {
        return interp.intern("INVALID-FILENAME");
    };
    let path = interp.arena.atom_name(id).to_string();
    interp.load_file(Path::new(&path))
}
