use thiserror::Error;

/// Errors that abort an evaluation at the Rust level.
///
/// Lisp-level failures (unbound symbols, `car` of a number, applying a
/// non-function) are not errors here: they evaluate to the `ERR` atom and
/// keep flowing through the interpreter as ordinary values.
#[derive(Debug, Error)]
pub enum LispError {
    /// The byte watermark would cross the cell watermark. Raised before
    /// anything is written, so the arena is still consistent afterwards.
    #[error("out of memory (hp={hp}, sp={sp})")]
    OutOfMemory { hp: usize, sp: usize },

    /// Malformed source text.
    #[error("read error: {0}")]
    Read(String),

    /// Atom names are stored NUL-terminated and may not contain NUL.
    #[error("invalid atom name {0:?}")]
    InvalidAtomName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad command-line arguments.
    #[error("{0}")]
    Usage(String),
}

pub type LispResult<T> = Result<T, LispError>;
