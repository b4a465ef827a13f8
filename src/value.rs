use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind tag stored in the top 16 bits of a boxed word.
///
/// All five tags sit inside the quiet-NaN range of an IEEE double, so any
/// word whose top 16 bits fall outside `ATOM..=NIL` is a plain number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u16)]
pub enum Tag {
    Atom = 0x7ff8,
    Prim = 0x7ff9,
    Cons = 0x7ffa,
    Closure = 0x7ffb,
    Nil = 0x7ffc,
}

impl Tag {
    pub const ALL: [Tag; 5] = [Tag::Atom, Tag::Prim, Tag::Cons, Tag::Closure, Tag::Nil];

    /// Decode the top 16 bits of a word. `None` means the word is a number.
    pub fn from_bits(bits: u16) -> Option<Tag> {
        match bits {
            0x7ff8 => Some(Tag::Atom),
            0x7ff9 => Some(Tag::Prim),
            0x7ffa => Some(Tag::Cons),
            0x7ffb => Some(Tag::Closure),
            0x7ffc => Some(Tag::Nil),
            _ => None,
        }
    }
}

/// Mask for the 48-bit ordinal carried by a boxed word.
pub const ORDINAL_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// A NaN outside the reserved tag range. Numeric results that would land on
/// a tagged bit pattern are replaced by this.
const CANONICAL_NAN: u64 = 0x7fff_8000_0000_0000;

/// The 64-bit encoding of a value: either the bits of an `f64` or a tag plus
/// a 48-bit ordinal. This is what the cell region stores.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word(u64);

impl Word {
    /// `box(tag, ordinal)`. Ordinals wider than 48 bits are truncated.
    pub fn boxed(tag: Tag, ordinal: u64) -> Word {
        Word(((tag as u64) << 48) | (ordinal & ORDINAL_MASK))
    }

    /// Encode a number. NaNs that collide with a tag are canonicalized.
    pub fn number(n: f64) -> Word {
        let bits = n.to_bits();
        if Tag::from_bits((bits >> 48) as u16).is_some() {
            Word(CANONICAL_NAN)
        } else {
            Word(bits)
        }
    }

    pub fn from_bits(bits: u64) -> Word {
        Word(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// `tag_of`. Numbers report `None`.
    pub fn tag(self) -> Option<Tag> {
        Tag::from_bits((self.0 >> 48) as u16)
    }

    /// `ordinal_of`: the low 48 bits.
    pub fn ordinal(self) -> u64 {
        self.0 & ORDINAL_MASK
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:#018x})", self.0)
    }
}

/// Byte offset of an interned name in the arena's byte region.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomId(pub u64);

/// Ordinal of a primitive in the primitive table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimId(pub u64);

/// Index into the cell region. `slot[id]` holds the cdr, `slot[id + 1]` the car.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub u64);

/// A decoded value. Copy semantics: the pair data lives in the arena.
///
/// Equality is bit-identity of the encoding, so `eq?` on atoms, closures and
/// `()` is O(1), numbers compare exactly (`0.0` and `-0.0` differ), and two
/// separately allocated pairs are never equal.
#[derive(Clone, Copy)]
pub enum Value {
    Number(f64),
    Atom(AtomId),
    Prim(PrimId),
    Cons(CellId),
    Closure(CellId),
    Nil,
}

/// How a closure resolves free symbols when called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capture {
    /// Created at global scope: resolved against the global environment as
    /// it stands at call time, so later definitions are visible.
    Dynamic,
    /// Created in a local scope: resolved against the captured environment.
    Lexical(Value),
}

impl Value {
    /// `box(tag, ordinal)` decoded straight into a value.
    pub fn boxed(tag: Tag, ordinal: u64) -> Value {
        Value::from_word(Word::boxed(tag, ordinal))
    }

    pub fn from_word(word: Word) -> Value {
        let ord = word.ordinal();
        match word.tag() {
            None => Value::Number(f64::from_bits(word.bits())),
            Some(Tag::Atom) => Value::Atom(AtomId(ord)),
            Some(Tag::Prim) => Value::Prim(PrimId(ord)),
            Some(Tag::Cons) => Value::Cons(CellId(ord)),
            Some(Tag::Closure) => Value::Closure(CellId(ord)),
            Some(Tag::Nil) => Value::Nil,
        }
    }

    pub fn to_word(self) -> Word {
        match self {
            Value::Number(n) => Word::number(n),
            Value::Atom(id) => Word::boxed(Tag::Atom, id.0),
            Value::Prim(id) => Word::boxed(Tag::Prim, id.0),
            Value::Cons(id) => Word::boxed(Tag::Cons, id.0),
            Value::Closure(id) => Word::boxed(Tag::Closure, id.0),
            Value::Nil => Word::boxed(Tag::Nil, 0),
        }
    }

    /// `tag_of`. Numbers report `None`.
    pub fn tag(self) -> Option<Tag> {
        match self {
            Value::Number(_) => None,
            Value::Atom(_) => Some(Tag::Atom),
            Value::Prim(_) => Some(Tag::Prim),
            Value::Cons(_) => Some(Tag::Cons),
            Value::Closure(_) => Some(Tag::Closure),
            Value::Nil => Some(Tag::Nil),
        }
    }

    /// `ordinal_of`.
    pub fn ordinal(self) -> u64 {
        self.to_word().ordinal()
    }

    /// `equal_bits`.
    pub fn equal_bits(self, other: Value) -> bool {
        self.to_word() == other.to_word()
    }

    /// `()` is the only falsy value.
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_truthy(self) -> bool {
        !self.is_nil()
    }

    pub fn is_cons(self) -> bool {
        matches!(self, Value::Cons(_))
    }

    pub fn is_atom(self) -> bool {
        matches!(self, Value::Atom(_))
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_atom(self) -> Option<AtomId> {
        match self {
            Value::Atom(id) => Some(id),
            _ => None,
        }
    }

    /// The cell behind a pair or a closure; closures reuse the pair layout.
    pub fn as_cell(self) -> Option<CellId> {
        match self {
            Value::Cons(id) | Value::Closure(id) => Some(id),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equal_bits(*other)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_word().hash(state);
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Num({})", n),
            Value::Atom(id) => write!(f, "Atom({})", id.0),
            Value::Prim(id) => write!(f, "Prim({})", id.0),
            Value::Cons(id) => write!(f, "Cons({})", id.0),
            Value::Closure(id) => write!(f, "Clos({})", id.0),
            Value::Nil => write!(f, "Nil"),
        }
    }
}

impl fmt::Debug for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomId({})", self.0)
    }
}

impl fmt::Debug for PrimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimId({})", self.0)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}
