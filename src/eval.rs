use std::path::Path;

use log::{debug, trace, warn};

use crate::config::Config;
use crate::error::{LispError, LispResult};
use crate::globals::{self, bind_params, env_lookup};
use crate::heap::Arena;
use crate::primitives;
use crate::printer;
use crate::reader;
use crate::symbol::sym;
use crate::value::{Capture, Value};

/// The interpreter context.
/// All interpreter state lives here: the arena and the global environment.
/// Separate instances share nothing.
pub struct Interp {
    pub arena: Arena,
    /// The global environment: alist of (name . value) pairs. `define`
    /// replaces it with a longer list; the old head stays valid.
    pub globe: Value,
}

impl Interp {
    /// The value-level error sentinel.
    pub const ERR: Value = Value::Atom(sym::ERR);
    /// The value returned by predicates for true.
    pub const TRUE: Value = Value::Atom(sym::TRUE);

    /// Create an interpreter whose arena holds `cells` slots.
    pub fn new(cells: usize) -> LispResult<Self> {
        let mut arena = Arena::new(cells)?;
        let globe = globals::build_globals(&mut arena)?;
        debug!(
            "interpreter ready: {} cells, {} free, {} atoms",
            arena.capacity(),
            arena.free_cells(),
            arena.atom_count()
        );
        Ok(Interp { arena, globe })
    }

    pub fn with_config(config: &Config) -> LispResult<Self> {
        Self::new(config.cells)
    }

    pub fn intern(&mut self, name: &str) -> LispResult<Value> {
        self.arena.intern(name)
    }

    pub fn car(&self, v: Value) -> Value {
        self.arena.car(v)
    }

    pub fn cdr(&self, v: Value) -> Value {
        self.arena.cdr(v)
    }

    /// Render a value as text.
    pub fn print(&self, v: Value) -> String {
        printer::print_val(v, &self.arena)
    }

    /// Slots left between the watermarks.
    pub fn free_cells(&self) -> usize {
        self.arena.free_cells()
    }

    // ========================================================================
    // Core evaluation
    // ========================================================================

    /// Evaluate `expr` in `env`.
    ///
    /// Atoms are looked up, pairs are applications (the operator position
    /// is evaluated too), everything else evaluates to itself. Recursion
    /// depth follows expression nesting; very deep nesting can exhaust the
    /// native stack.
    pub fn eval(&mut self, expr: Value, env: Value) -> LispResult<Value> {
        trace!("eval {}", self.print(expr));
        match expr {
            Value::Atom(_) => Ok(env_lookup(expr, env, &self.arena)),
            Value::Cons(_) => {
                let op = self.eval(self.car(expr), env)?;
                self.apply(op, self.cdr(expr), env)
            }
            _ => Ok(expr),
        }
    }

    /// Evaluate `expr` in the global environment.
    pub fn eval_global(&mut self, expr: Value) -> LispResult<Value> {
        self.eval(expr, self.globe)
    }

    /// Apply `f` to the unevaluated argument list `args`.
    ///
    /// Primitives get the raw arguments and the caller's environment.
    /// Closures get their arguments evaluated and bound on top of their
    /// captured environment (or the current global one). Anything else
    /// yields `ERR`.
    pub fn apply(&mut self, f: Value, args: Value, env: Value) -> LispResult<Value> {
        match f {
            Value::Prim(id) => match primitives::lookup(id) {
                Some(prim) => {
                    trace!("apply <{}> {}", prim.name, self.print(args));
                    (prim.func)(self, args, env)
                }
                None => Ok(Self::ERR),
            },
            Value::Closure(_) => {
                let lambda = self.car(f);
                let (params, body) = (self.car(lambda), self.cdr(lambda));
                let vals = self.evlis(args, env)?;
                let base = match self.closure_capture(f) {
                    Some(Capture::Lexical(captured)) => captured,
                    _ => self.globe,
                };
                trace!("apply {} to {}", self.print(f), self.print(vals));
                let call_env = bind_params(&mut self.arena, params, vals, base)?;
                self.eval(body, call_env)
            }
            _ => Ok(Self::ERR),
        }
    }

    /// Evaluate each element of a list, in order, into a new list.
    /// A symbol in tail position is looked up and becomes the new tail.
    pub fn evlis(&mut self, list: Value, env: Value) -> LispResult<Value> {
        let mut vals = Vec::new();
        let mut current = list;
        while current.is_cons() {
            vals.push(self.eval(self.car(current), env)?);
            current = self.cdr(current);
        }
        let tail = if current.is_atom() {
            env_lookup(current, env, &self.arena)
        } else {
            Value::Nil
        };
        self.arena.list_with_tail(&vals, tail)
    }

    // ========================================================================
    // Closures and definitions
    // ========================================================================

    /// Build a closure `((params . body) . env)`.
    /// A closure made in the global environment stores `()` instead and
    /// resolves against whatever the global environment is when called.
    pub fn closure(&mut self, params: Value, body: Value, env: Value) -> LispResult<Value> {
        let captured = if env == self.globe { Value::Nil } else { env };
        let lambda = self.arena.cons(params, body)?;
        let id = self.arena.alloc(lambda, captured)?;
        Ok(Value::Closure(id))
    }

    /// How a closure resolves free symbols. `None` for non-closures.
    pub fn closure_capture(&self, f: Value) -> Option<Capture> {
        match f {
            Value::Closure(_) => match self.cdr(f) {
                Value::Nil => Some(Capture::Dynamic),
                env => Some(Capture::Lexical(env)),
            },
            _ => None,
        }
    }

    /// Prepend a binding to the global environment. Never rolled back.
    pub fn define(&mut self, name: Value, val: Value) -> LispResult<()> {
        self.globe = globals::extend(&mut self.arena, name, val, self.globe)?;
        debug!("define {} = {}", self.print(name), self.print(val));
        Ok(())
    }

    // ========================================================================
    // Reclaim
    // ========================================================================

    /// Drop every cell allocated after the head of the global environment.
    ///
    /// Cells only ever get lower addresses, and the environment head is the
    /// newest reachable node once a top-level form has finished, so
    /// everything below it is garbage from that form. Only sound between
    /// top-level forms; atom storage is never reclaimed.
    /// Returns the number of slots released.
    pub fn reclaim(&mut self) -> usize {
        let watermark = match self.globe {
            Value::Cons(id) => id.0 as usize,
            _ => self.arena.capacity(),
        };
        let released = self.arena.release_to(watermark);
        debug!(
            "reclaim: released {} slots, sp={}, free={}",
            released,
            self.arena.sp(),
            self.arena.free_cells()
        );
        released
    }

    // ========================================================================
    // Source entry points
    // ========================================================================

    /// Read and evaluate every form in `source` against the global
    /// environment. Returns the last value, or `()` for empty input.
    pub fn eval_str(&mut self, source: &str) -> LispResult<Value> {
        let mut pos = 0;
        let mut result = Value::Nil;
        while let Some((expr, next)) = reader::read_one_at(source, pos, &mut self.arena)? {
            pos = next;
            result = self.eval_global(expr)?;
        }
        Ok(result)
    }

    /// Evaluate a file form by form. A missing file, a syntax error or a
    /// form evaluating to `ERR` stop the load and return `FILE-ERROR`,
    /// `PARSE-ERROR` or `EVAL-ERROR`. Allocator exhaustion is still fatal.
    pub fn load_file(&mut self, path: &Path) -> LispResult<Value> {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!("load {}: {}", path.display(), e);
                return self.intern("FILE-ERROR");
            }
        };
        debug!("loading {}", path.display());
        self.load_source(&source)
    }

    /// `load_file` for text already in memory.
    pub fn load_source(&mut self, source: &str) -> LispResult<Value> {
        let mut pos = 0;
        let mut result = Value::Nil;
        loop {
            let (expr, next) = match reader::read_one_at(source, pos, &mut self.arena) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => return Ok(result),
                Err(LispError::Read(msg)) => {
                    warn!("load: {}", msg);
                    return self.intern("PARSE-ERROR");
                }
                Err(e) => return Err(e),
            };
            pos = next;
            result = self.eval_global(expr)?;
            if result == Self::ERR {
                warn!("load: {} evaluated to ERR", self.print(expr));
                return self.intern("EVAL-ERROR");
            }
        }
    }
}
