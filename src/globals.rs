use crate::error::LispResult;
use crate::heap::Arena;
use crate::primitives::PRIMITIVES;
use crate::symbol::sym;
use crate::value::{PrimId, Value};

/// Build the initial global environment.
/// The environment is a list of (name . value) pairs.
/// Pre-installs:
///   - #t = #t
///   - every primitive, in table order, as a PRIM value
///
/// The last primitive ends up at the head of the list.
pub fn build_globals(arena: &mut Arena) -> LispResult<Value> {
    let tru = Value::Atom(sym::TRUE);
    let mut globe = extend(arena, tru, tru, Value::Nil)?;

    for (ordinal, prim) in PRIMITIVES.iter().enumerate() {
        let name = arena.intern(prim.name)?;
        globe = extend(arena, name, Value::Prim(PrimId(ordinal as u64)), globe)?;
    }

    Ok(globe)
}

/// Prepend one (name . value) binding to `env`. The tail is shared, not copied.
pub fn extend(arena: &mut Arena, name: Value, val: Value, env: Value) -> LispResult<Value> {
    let binding = arena.cons(name, val)?;
    arena.cons(binding, env)
}

/// Look up a binding in an environment (association list).
/// Returns the bound value, or `ERR` if the chain runs out.
pub fn env_lookup(name: Value, env: Value, arena: &Arena) -> Value {
    let mut current = env;
    while current.is_cons() {
        let binding = arena.car(current);
        if arena.car(binding) == name {
            return arena.cdr(binding);
        }
        current = arena.cdr(current);
    }
    Value::Atom(sym::ERR)
}

/// Bind a parameter spec against an argument list on top of `env`.
///
///   - `()` binds nothing.
///   - a lone symbol takes the whole remaining argument list.
///   - a list binds positionally; a dotted tail takes the rest.
///
/// Arity is not checked: missing arguments bind to `ERR` (the car of an
/// exhausted list) and extra arguments are ignored.
pub fn bind_params(arena: &mut Arena, params: Value, args: Value, env: Value) -> LispResult<Value> {
    let mut params = params;
    let mut args = args;
    let mut env = env;
    loop {
        if params.is_nil() {
            return Ok(env);
        }
        if !params.is_cons() {
            return extend(arena, params, args, env);
        }
        let (name, val) = (arena.car(params), arena.car(args));
        env = extend(arena, name, val, env)?;
        params = arena.cdr(params);
        args = arena.cdr(args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arena, Value, Value, Value) {
        let mut arena = Arena::new(256).unwrap();
        let x = arena.intern("x").unwrap();
        let y = arena.intern("y").unwrap();
        let z = arena.intern("z").unwrap();
        (arena, x, y, z)
    }

    #[test]
    fn most_recent_binding_wins() {
        let (mut arena, x, _, _) = setup();
        let env = extend(&mut arena, x, Value::Number(1.0), Value::Nil).unwrap();
        let shadowed = extend(&mut arena, x, Value::Number(2.0), env).unwrap();
        assert_eq!(env_lookup(x, shadowed, &arena), Value::Number(2.0));
        assert_eq!(env_lookup(x, env, &arena), Value::Number(1.0));
    }

    #[test]
    fn missing_symbol_is_err() {
        let (mut arena, x, y, _) = setup();
        let env = extend(&mut arena, x, Value::Number(1.0), Value::Nil).unwrap();
        assert_eq!(env_lookup(y, env, &arena), Value::Atom(sym::ERR));
        assert_eq!(env_lookup(y, Value::Nil, &arena), Value::Atom(sym::ERR));
    }

    #[test]
    fn positional_binding() {
        let (mut arena, x, y, _) = setup();
        let params = arena.list(&[x, y]).unwrap();
        let args = arena.list(&[Value::Number(1.0), Value::Number(2.0)]).unwrap();
        let env = bind_params(&mut arena, params, args, Value::Nil).unwrap();
        assert_eq!(env_lookup(x, env, &arena), Value::Number(1.0));
        assert_eq!(env_lookup(y, env, &arena), Value::Number(2.0));
    }

    #[test]
    fn symbol_spec_captures_all_arguments() {
        let (mut arena, x, _, _) = setup();
        let args = arena.list(&[Value::Number(1.0), Value::Number(2.0)]).unwrap();
        let env = bind_params(&mut arena, x, args, Value::Nil).unwrap();
        assert_eq!(env_lookup(x, env, &arena), args);
    }

    #[test]
    fn dotted_spec_captures_the_rest() {
        let (mut arena, x, y, _) = setup();
        let params = arena.list_with_tail(&[x], y).unwrap();
        let args = arena
            .list(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
            .unwrap();
        let env = bind_params(&mut arena, params, args, Value::Nil).unwrap();
        assert_eq!(env_lookup(x, env, &arena), Value::Number(1.0));
        let rest = env_lookup(y, env, &arena);
        assert_eq!(
            arena.list_to_vec(rest).unwrap(),
            vec![Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn missing_arguments_bind_to_err() {
        let (mut arena, x, y, z) = setup();
        let params = arena.list(&[x, y]).unwrap();
        let args = arena.list(&[Value::Number(1.0)]).unwrap();
        let env = bind_params(&mut arena, params, args, Value::Nil).unwrap();
        assert_eq!(env_lookup(y, env, &arena), Value::Atom(sym::ERR));
        assert_eq!(env_lookup(z, env, &arena), Value::Atom(sym::ERR));
    }

    #[test]
    fn empty_spec_returns_env_unchanged() {
        let (mut arena, x, _, _) = setup();
        let env = extend(&mut arena, x, Value::Number(1.0), Value::Nil).unwrap();
        let sp = arena.sp();
        assert_eq!(bind_params(&mut arena, Value::Nil, Value::Nil, env).unwrap(), env);
        assert_eq!(arena.sp(), sp);
    }

    #[test]
    fn globals_hold_true_and_primitives() {
        let mut arena = Arena::new(512).unwrap();
        let globe = build_globals(&mut arena).unwrap();
        let tru = Value::Atom(sym::TRUE);
        assert_eq!(env_lookup(tru, globe, &arena), tru);
        for (ordinal, prim) in PRIMITIVES.iter().enumerate() {
            let name = arena.intern(prim.name).unwrap();
            assert_eq!(
                env_lookup(name, globe, &arena),
                Value::Prim(PrimId(ordinal as u64))
            );
        }
    }
}
