//! Error types for the assembler pipeline and the execution engine.
//!
//! Compile errors abort the whole compile immediately and surface verbatim to
//! the caller; there is no error recovery. Execution errors stop the processor
//! and carry the offending address/opcode.

use std::path::PathBuf;
use thiserror::Error;

/// A position in assembly source, carried by every compile error where known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Source file, if the text came from a file (`None` for inline source).
    pub file: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column offset within the line (0-indexed).
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    pub fn in_file(file: Option<PathBuf>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.file {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.line, self.column),
            None => write!(f, "line {}, column {}", self.line, self.column),
        }
    }
}

/// Errors raised by the tokenizer/parser/code-generator pipeline.
///
/// Every variant names what the compiler expected or what construct failed;
/// the first error aborts the compile.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A token did not match any expected production.
    #[error("syntax error at {location}: expected {expected}, found {found}")]
    Syntax {
        /// Description of the expected token category set.
        expected: String,
        /// The actual token text, or "end of input".
        found: String,
        location: Location,
    },

    /// Reference to an undeclared label, variable or register.
    #[error("unknown reference `{name}` at {location}")]
    Reference { name: String, location: Location },

    /// A construct appeared in a position where it is not allowed.
    #[error("type error at {location}: {message}")]
    Type { message: String, location: Location },

    /// An operand names a register/flag without a memory address.
    #[error("register `{name}` has no memory address and cannot be used as an operand ({location})")]
    Processor { name: String, location: Location },

    /// Wrong argument for an instruction, naming the argument index (1-based).
    #[error("bad argument {index} of `{instruction}` at {location}: {message}")]
    Arguments {
        instruction: String,
        index: usize,
        message: String,
        location: Location,
    },

    /// An include target (or the source file itself) could not be read.
    #[error("cannot read `{path}`: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A math operator produced an invalid result (division by zero, NaN,
    /// infinity). Carries both operands and the operator keyword.
    #[error("operator `{operator}` failed on {left} and {right} at {location}")]
    Operator {
        operator: String,
        left: f64,
        right: f64,
        location: Location,
    },

    /// A variable resolver failed while resolving a name.
    #[error("failed to resolve variable `{name}`: {message}")]
    Variable { name: String, message: String },

    /// A compiler variable (transitively) references itself.
    ///
    /// `chain` is the full resolution chain ending in the re-entered name;
    /// `declared_at` is the original declaration site.
    #[error("circular reference: {} (declared at {declared_at})", chain.join(" -> "))]
    Circular {
        chain: Vec<String>,
        declared_at: Location,
    },

    /// A label was used but never declared. Names every unresolved occurrence
    /// (addresses into the opcode array).
    #[error("label `{name}` is never defined; used at addresses {occurrences:?}")]
    UndefinedLabel {
        name: String,
        occurrences: Vec<usize>,
    },

    /// The compiled program has more cells than the target processor's
    /// memory; loading it could never succeed.
    #[error("program needs {cells} cells but the target memory holds {size}")]
    Oversize { cells: usize, size: usize },
}

/// Errors raised by the processor, its memory, or its clock.
///
/// Any of these during a run stops the processor; they are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Memory access outside `[0, size)`.
    #[error("address {address} out of range (memory size {size})")]
    AddressOutOfRange { address: usize, size: usize },

    /// Fetched a cell value that is not an opcode in the instruction set.
    #[error("unknown opcode 0x{opcode:X} at address {address}")]
    UnknownOpcode { opcode: u32, address: usize },

    /// `DIV`/`MOD` with a zero divisor.
    #[error("division by zero at address {address}")]
    DivisionByZero { address: usize },

    /// Clock frequency outside `[1, 1_000_000_000]` Hz.
    #[error("clock frequency {hz} Hz out of range (1..=1000000000)")]
    InvalidFrequency { hz: u64 },

    /// Word width other than 8, 16 or 24 bits.
    #[error("invalid word width {bits} (must be 8, 16 or 24)")]
    InvalidWordWidth { bits: u8 },

    /// Memory too small to hold the register file, or larger than the word
    /// can address.
    #[error("invalid memory size {size}: {message}")]
    InvalidMemorySize { size: usize, message: String },
}
