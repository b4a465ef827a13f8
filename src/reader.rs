use crate::error::{LispError, LispResult};
use crate::heap::Arena;
use crate::symbol::sym;
use crate::value::Value;

/// Reader: parses source text into values allocated in the arena.
///
/// Numbers become `Value::Number`, every other token is interned, `'x`
/// becomes `(quote x)` and parenthesized sequences become lists, with
/// `(a . b)` for a dotted tail.
pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    arena: &'a mut Arena,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str, arena: &'a mut Arena) -> Self {
        Self::at(input, 0, arena)
    }

    /// Start reading at byte offset `pos`.
    pub fn at(input: &'a str, pos: usize, arena: &'a mut Arena) -> Self {
        Reader {
            input: input.as_bytes(),
            pos,
            arena,
        }
    }

    /// Read one expression. Returns None at EOF.
    pub fn read(&mut self) -> LispResult<Option<Value>> {
        self.skip_whitespace_and_comments();
        if self.pos >= self.input.len() {
            return Ok(None);
        }
        let val = self.read_expr()?;
        Ok(Some(val))
    }

    /// Return current position in input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read all expressions from input.
    pub fn read_all(&mut self) -> LispResult<Vec<Value>> {
        let mut results = Vec::new();
        while let Some(val) = self.read()? {
            results.push(val);
        }
        Ok(results)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Control characters count as whitespace; `;` runs to end of line.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(ch) if ch <= b' ') {
                self.pos += 1;
            }
            if self.peek() == Some(b';') {
                while matches!(self.peek(), Some(ch) if ch != b'\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn read_expr(&mut self) -> LispResult<Value> {
        self.skip_whitespace_and_comments();

        let ch = self
            .peek()
            .ok_or_else(|| LispError::Read("unexpected EOF".into()))?;

        match ch {
            b'(' => self.read_list(),
            b')' => Err(LispError::Read(format!("unexpected ')' at {}", self.pos))),
            b'\'' => self.read_quote(),
            _ => self.read_atom(),
        }
    }

    /// Read a list: (a b c) or (a . b) or (a b . c)
    fn read_list(&mut self) -> LispResult<Value> {
        self.advance(); // consume '('

        let mut elements = Vec::new();
        let mut dot_tail = None;

        loop {
            self.skip_whitespace_and_comments();

            match self.peek() {
                Some(b')') => {
                    self.advance();
                    break;
                }
                None => return Err(LispError::Read("unterminated list".into())),
                Some(b'.') if self.is_dot_separator() => {
                    self.advance(); // consume '.'
                    dot_tail = Some(self.read_expr()?);
                    self.skip_whitespace_and_comments();
                    if self.advance() != Some(b')') {
                        return Err(LispError::Read("expected ')' after dot tail".into()));
                    }
                    break;
                }
                Some(_) => elements.push(self.read_expr()?),
            }
        }

        self.arena
            .list_with_tail(&elements, dot_tail.unwrap_or(Value::Nil))
    }

    /// A '.' is a separator when followed by whitespace, ')' or EOF.
    fn is_dot_separator(&self) -> bool {
        match self.input.get(self.pos + 1) {
            None => true,
            Some(&next) => next <= b' ' || next == b')' || next == b'(',
        }
    }

    /// 'x -> (quote x)
    fn read_quote(&mut self) -> LispResult<Value> {
        self.advance(); // consume '\''
        let quoted = self.read_expr()?;
        self.arena.list(&[Value::Atom(sym::QUOTE), quoted])
    }

    /// Read a token up to the next delimiter; a number if it looks like one.
    fn read_atom(&mut self) -> LispResult<Value> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if is_delimiter(ch) {
                break;
            }
            self.pos += 1;
        }
        let token = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| LispError::Read(format!("invalid UTF-8 in token at {}", start)))?;

        match parse_number(token) {
            Some(n) => Ok(Value::Number(n)),
            None => self.arena.intern(token),
        }
    }
}

fn is_delimiter(ch: u8) -> bool {
    ch <= b' ' || matches!(ch, b'(' | b')' | b'\'' | b';')
}

/// A token is numeric when it starts with a digit, or with a sign or a dot
/// followed by a digit, and the whole token parses as a float. This keeps
/// `+`, `-`, `inf` and `nan` as symbols.
pub fn parse_number(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let digit_at = |i: usize| bytes.get(i).map_or(false, u8::is_ascii_digit);
    let numeric = match bytes.first()? {
        b'0'..=b'9' => true,
        b'+' | b'-' => digit_at(1) || (bytes.get(1) == Some(&b'.') && digit_at(2)),
        b'.' => digit_at(1),
        _ => false,
    };
    if !numeric {
        return None;
    }
    token.parse::<f64>().ok()
}

/// Parse a single expression starting at `pos` in `input`.
/// Returns `Some((value, new_pos))` or `None` at EOF.
///
/// Drivers that reclaim between forms use this so unread text never has
/// cells in the arena.
pub fn read_one_at(input: &str, pos: usize, arena: &mut Arena) -> LispResult<Option<(Value, usize)>> {
    let mut reader = Reader::at(input, pos, arena);
    let val = reader.read()?;
    Ok(val.map(|v| (v, reader.position())))
}
