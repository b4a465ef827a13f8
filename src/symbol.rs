use crate::error::{LispError, LispResult};
use crate::heap::Arena;
use crate::value::{AtomId, Value};

/// Well-known atoms, interned first so their offsets are fixed.
/// These must match the order and byte lengths of `WELL_KNOWN`.
pub mod sym {
    use crate::value::AtomId;

    /// The value-level error sentinel.
    pub const ERR: AtomId = AtomId(0);
    /// The canonical true value.
    pub const TRUE: AtomId = AtomId(4);
    pub const QUOTE: AtomId = AtomId(7);

    pub const WELL_KNOWN: [&str; 3] = ["ERR", "#t", "quote"];
}

impl Arena {
    /// Intern a name into the byte region.
    ///
    /// Scans the stored names in order; an exact match returns the existing
    /// atom and leaves `hp` untouched. Otherwise the name and its NUL
    /// terminator are appended at `hp`.
    pub fn intern(&mut self, name: &str) -> LispResult<Value> {
        if name.as_bytes().contains(&0) {
            return Err(LispError::InvalidAtomName(name.to_string()));
        }
        if let Some(id) = self.find_atom(name) {
            return Ok(Value::Atom(id));
        }

        let start = self.hp;
        let end = start + name.len() + 1;
        self.check(end, self.sp())?;

        self.bytes[start..end - 1].copy_from_slice(name.as_bytes());
        self.bytes[end - 1] = 0;
        self.hp = end;
        Ok(Value::Atom(AtomId(start as u64)))
    }

    /// Look up an interned name without interning it.
    pub fn find_atom(&self, name: &str) -> Option<AtomId> {
        self.atoms()
            .find(|&(_, stored)| stored == name.as_bytes())
            .map(|(id, _)| id)
    }

    /// The name of an atom. Offsets that do not start a valid name read as "".
    pub fn atom_name(&self, id: AtomId) -> &str {
        let start = id.0 as usize;
        if start >= self.hp {
            return "";
        }
        let len = self.bytes[start..self.hp]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.hp - start);
        std::str::from_utf8(&self.bytes[start..start + len]).unwrap_or("")
    }

    /// Number of interned atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms().count()
    }

    /// Every stored name with its offset, oldest first.
    fn atoms(&self) -> impl Iterator<Item = (AtomId, &[u8])> {
        let region = &self.bytes[..self.hp];
        let mut offset = 0;
        region.split_inclusive(|&b| b == 0).map(move |chunk| {
            let id = AtomId(offset as u64);
            offset += chunk.len();
            (id, &chunk[..chunk.len() - 1])
        })
    }
}
