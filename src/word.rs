//! # Word Size Descriptor
//!
//! A [`Word`] describes the bit width of one memory cell (and therefore one
//! opcode unit) of an emulated machine. The width is configurable at processor
//! construction time; every cell value, register value and opcode is masked to
//! the word's range.
//!
//! Supported widths are 8, 16 and 24 bits. The derived bit mask defines the
//! legal cell range `[0, mask]`.
//!
//! # Examples
//!
//! ```
//! use wordcpu::Word;
//!
//! let word = Word::new(16).unwrap();
//! assert_eq!(word.bits(), 16);
//! assert_eq!(word.mask(), 0xFFFF);
//! assert_eq!(word.bytes(), 2);
//! assert_eq!(word.truncate(0x1_2345), 0x2345);
//! ```

use crate::ExecutionError;

/// Immutable bit-width descriptor for one memory cell.
///
/// Constructed via [`Word::new`], which rejects any width other than 8, 16
/// or 24 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word {
    bits: u8,
}

impl Word {
    /// Creates a word descriptor for the given bit width.
    ///
    /// Returns [`ExecutionError::InvalidWordWidth`] for any width other than
    /// 8, 16 or 24.
    pub fn new(bits: u8) -> Result<Self, ExecutionError> {
        match bits {
            8 | 16 | 24 => Ok(Self { bits }),
            _ => Err(ExecutionError::InvalidWordWidth { bits }),
        }
    }

    /// The bit width of one cell.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// The derived bit mask: all legal cell values satisfy `value & mask == value`.
    pub fn mask(&self) -> u32 {
        (1u32 << self.bits) - 1
    }

    /// Number of bytes needed to store one cell.
    pub fn bytes(&self) -> u8 {
        self.bits / 8
    }

    /// Masks a raw value into the legal cell range.
    pub fn truncate(&self, value: u32) -> u32 {
        value & self.mask()
    }

    /// True if the raw (wider than word) result has bits outside the mask.
    ///
    /// This is the carry condition for fixed-width arithmetic: compute at
    /// native width, then check for bits the word cannot hold.
    pub fn overflows(&self, raw: u64) -> bool {
        raw & !(self.mask() as u64) != 0
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}-bit word", self.bits)
    }
}
