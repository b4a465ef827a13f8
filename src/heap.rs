use crate::error::{LispError, LispResult};
use crate::symbol::sym;
use crate::value::{CellId, Value, Word};

/// The interpreter's only memory.
///
/// Two regions share one budget of `capacity * 8` bytes:
///   - the byte region grows upward from 0 and holds NUL-terminated atom
///     names; `hp` is its watermark.
///   - the cell region grows downward from `capacity` and holds pair slots;
///     `sp` is its watermark.
///
/// Every allocation checks `hp <= sp * 8` before writing anything.
pub struct Arena {
    pub(crate) bytes: Vec<u8>,
    cells: Vec<Word>,
    pub(crate) hp: usize,
    sp: usize,
}

impl Arena {
    /// Create an arena with room for `capacity` cell slots and the
    /// well-known atoms already interned at their fixed offsets.
    pub fn new(capacity: usize) -> LispResult<Self> {
        let mut arena = Arena {
            bytes: vec![0; capacity * 8],
            cells: vec![Word::from_bits(0); capacity],
            hp: 0,
            sp: capacity,
        };
        for name in sym::WELL_KNOWN {
            arena.intern(name)?;
        }
        Ok(arena)
    }

    /// Byte watermark.
    pub fn hp(&self) -> usize {
        self.hp
    }

    /// Cell watermark.
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Total number of cell slots.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Slots still available between the two watermarks, in cell units.
    pub fn free_cells(&self) -> usize {
        self.sp.saturating_sub(self.hp / 8)
    }

    /// Fail unless a byte watermark of `hp` fits under a cell watermark of `sp`.
    pub(crate) fn check(&self, hp: usize, sp: usize) -> LispResult<()> {
        if hp > sp * 8 {
            return Err(LispError::OutOfMemory { hp, sp });
        }
        Ok(())
    }

    /// Reserve the two slots below `sp` and store a pair there.
    pub fn alloc(&mut self, car: Value, cdr: Value) -> LispResult<CellId> {
        if self.sp < 2 {
            return Err(LispError::OutOfMemory { hp: self.hp, sp: self.sp });
        }
        let sp = self.sp - 2;
        self.check(self.hp, sp)?;

        self.cells[sp] = cdr.to_word();
        self.cells[sp + 1] = car.to_word();
        self.sp = sp;
        Ok(CellId(sp as u64))
    }

    /// Allocate a pair and return it as a `CONS` value.
    pub fn cons(&mut self, car: Value, cdr: Value) -> LispResult<Value> {
        Ok(Value::Cons(self.alloc(car, cdr)?))
    }

    /// car of a pair or closure; the `ERR` atom for anything else.
    pub fn car(&self, val: Value) -> Value {
        match val.as_cell() {
            Some(id) => self.slot(id.0 as usize + 1),
            None => Value::Atom(sym::ERR),
        }
    }

    /// cdr of a pair or closure; the `ERR` atom for anything else.
    pub fn cdr(&self, val: Value) -> Value {
        match val.as_cell() {
            Some(id) => self.slot(id.0 as usize),
            None => Value::Atom(sym::ERR),
        }
    }

    fn slot(&self, index: usize) -> Value {
        self.cells
            .get(index)
            .map_or(Value::Atom(sym::ERR), |&w| Value::from_word(w))
    }

    /// Move the cell watermark back up to `watermark`, dropping every cell
    /// below it. Returns the number of slots released.
    pub fn release_to(&mut self, watermark: usize) -> usize {
        let watermark = watermark.min(self.capacity());
        let released = watermark.saturating_sub(self.sp);
        self.sp = self.sp.max(watermark);
        released
    }

    /// Build a proper list from a slice of values.
    pub fn list(&mut self, values: &[Value]) -> LispResult<Value> {
        self.list_with_tail(values, Value::Nil)
    }

    /// Build a list from a slice, ending in `tail` instead of `()`.
    pub fn list_with_tail(&mut self, values: &[Value], tail: Value) -> LispResult<Value> {
        let mut result = tail;
        for &val in values.iter().rev() {
            result = self.cons(val, result)?;
        }
        Ok(result)
    }

    /// Collect a proper list into a Vec. Returns None if not a proper list.
    pub fn list_to_vec(&self, val: Value) -> Option<Vec<Value>> {
        let mut result = Vec::new();
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(result),
                Value::Cons(_) => {
                    result.push(self.car(current));
                    current = self.cdr(current);
                }
                _ => return None,
            }
        }
    }
}
