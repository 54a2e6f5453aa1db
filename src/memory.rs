//! # Memory Bus Abstraction
//!
//! The [`MemoryBus`] trait decouples the processor (and memory-mapped
//! registers) from the storage behind them. Two implementations are provided:
//!
//! - [`Memory`]: real storage, one atomic cell per address
//! - [`NullMemory`]: a non-storing stand-in that performs every validity
//!   check the real memory performs, used by verify/obfuscate tooling
//!
//! All accesses are bounds-checked: an address outside `[0, size)` is an
//! [`ExecutionError::AddressOutOfRange`], never a silent wrap. Cell values
//! are masked to the configured [`Word`] on write.
//!
//! Each cell is individually synchronized, so a monitoring thread can read a
//! cell while the processor runs without corrupting state (though it may
//! observe a value mid-multi-step-instruction).
//!
//! # Examples
//!
//! ```
//! use wordcpu::{Memory, MemoryBus, Word};
//!
//! let mem = Memory::new(Word::new(8).unwrap(), 256);
//! mem.write(0x10, 0x42).unwrap();
//! assert_eq!(mem.read(0x10).unwrap(), 0x42);
//!
//! // Values are masked to the word width
//! mem.write(0x10, 0x1FF).unwrap();
//! assert_eq!(mem.read(0x10).unwrap(), 0xFF);
//!
//! // Out-of-range access is an error
//! assert!(mem.read(256).is_err());
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{ExecutionError, Word};

/// Bounds-checked access to word-sized cells.
///
/// Implementations must mask written values to the word's range and reject
/// out-of-range addresses with [`ExecutionError::AddressOutOfRange`].
pub trait MemoryBus: Send + Sync {
    /// Reads the cell at `address`.
    fn read(&self, address: usize) -> Result<u32, ExecutionError>;

    /// Writes `value` (masked to the word) to the cell at `address`.
    fn write(&self, address: usize, value: u32) -> Result<(), ExecutionError>;

    /// Number of cells.
    fn size(&self) -> usize;

    /// The word configuration of this memory.
    fn word(&self) -> Word;

    /// Bounds check shared by both variants.
    fn check(&self, address: usize) -> Result<(), ExecutionError> {
        if address < self.size() {
            Ok(())
        } else {
            Err(ExecutionError::AddressOutOfRange {
                address,
                size: self.size(),
            })
        }
    }
}

/// Fixed-size array of word-sized cells.
///
/// Interior mutability via per-cell atomics: `write` takes `&self`, so the
/// memory can be shared between the processor's worker thread and a
/// monitoring thread.
pub struct Memory {
    word: Word,
    cells: Vec<AtomicU32>,
}

impl Memory {
    /// Creates a memory of `size` zeroed cells.
    pub fn new(word: Word, size: usize) -> Self {
        let mut cells = Vec::with_capacity(size);
        cells.resize_with(size, || AtomicU32::new(0));
        Self { word, cells }
    }
}

impl MemoryBus for Memory {
    fn read(&self, address: usize) -> Result<u32, ExecutionError> {
        self.check(address)?;
        Ok(self.cells[address].load(Ordering::SeqCst))
    }

    fn write(&self, address: usize, value: u32) -> Result<(), ExecutionError> {
        self.check(address)?;
        self.cells[address].store(self.word.truncate(value), Ordering::SeqCst);
        Ok(())
    }

    fn size(&self) -> usize {
        self.cells.len()
    }

    fn word(&self) -> Word {
        self.word
    }
}

/// Non-storing memory: same bounds checks as [`Memory`], no cells.
///
/// Reads return 0; writes are validated and discarded. A "verify" or
/// "obfuscate" pass against a `NullMemory` observes exactly the error
/// behavior a real run would.
pub struct NullMemory {
    word: Word,
    size: usize,
}

impl NullMemory {
    pub fn new(word: Word, size: usize) -> Self {
        Self { word, size }
    }
}

impl MemoryBus for NullMemory {
    fn read(&self, address: usize) -> Result<u32, ExecutionError> {
        self.check(address)?;
        Ok(0)
    }

    fn write(&self, address: usize, _value: u32) -> Result<(), ExecutionError> {
        self.check(address)
    }

    fn size(&self) -> usize {
        self.size
    }

    fn word(&self) -> Word {
        self.word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word8() -> Word {
        Word::new(8).unwrap()
    }

    #[test]
    fn test_read_write_roundtrip() {
        let mem = Memory::new(word8(), 64);
        mem.write(0, 0x01).unwrap();
        mem.write(63, 0xFF).unwrap();
        assert_eq!(mem.read(0).unwrap(), 0x01);
        assert_eq!(mem.read(63).unwrap(), 0xFF);
        assert_eq!(mem.read(1).unwrap(), 0);
    }

    #[test]
    fn test_write_masks_to_word() {
        let mem = Memory::new(word8(), 4);
        mem.write(2, 300).unwrap();
        assert_eq!(mem.read(2).unwrap(), 44);
    }

    #[test]
    fn test_out_of_range() {
        let mem = Memory::new(word8(), 4);
        assert_eq!(
            mem.read(4),
            Err(ExecutionError::AddressOutOfRange { address: 4, size: 4 })
        );
        assert!(mem.write(100, 0).is_err());
    }

    #[test]
    fn test_null_memory_checks_but_does_not_store() {
        let mem = NullMemory::new(word8(), 4);
        mem.write(3, 0xAB).unwrap();
        assert_eq!(mem.read(3).unwrap(), 0);

        // Identical error shape to the real memory
        assert_eq!(
            mem.write(4, 0),
            Err(ExecutionError::AddressOutOfRange { address: 4, size: 4 })
        );
    }
}
