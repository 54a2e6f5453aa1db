//! # Registers and Flags
//!
//! Named value holders with a storage duality:
//!
//! - **Private storage**: the value lives in the register itself. Private
//!   registers can be monitored by name but have no memory address, so they
//!   are not legal assembly operands.
//! - **Memory-mapped storage**: the value lives in a memory cell; the
//!   register is a named view of that cell and exposes its address.
//!
//! Only the mapped variant answers [`Register::address`] with `Some`; the
//! assembler uses that distinction to reject private registers in operand
//! position.
//!
//! A [`Flag`] is a register constrained to 0/1.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::{MemoryBus, Word};

/// Where a register's value lives.
enum Storage {
    /// Value held by the register itself, masked to `word`.
    Private { cell: AtomicU32, word: Word },
    /// Value held by a memory cell at a fixed, pre-validated address.
    Mapped {
        bus: Arc<dyn MemoryBus>,
        address: usize,
    },
}

/// A named word-sized value holder.
pub struct Register {
    name: String,
    storage: Storage,
}

impl Register {
    /// Creates a register with private storage.
    pub fn private(name: impl Into<String>, word: Word) -> Self {
        Self {
            name: name.into(),
            storage: Storage::Private {
                cell: AtomicU32::new(0),
                word,
            },
        }
    }

    /// Creates a register backed by the memory cell at `address`.
    ///
    /// The address is validated once here; later accesses cannot fail.
    pub fn mapped(
        name: impl Into<String>,
        bus: Arc<dyn MemoryBus>,
        address: usize,
    ) -> Result<Self, crate::ExecutionError> {
        bus.check(address)?;
        Ok(Self {
            name: name.into(),
            storage: Storage::Mapped { bus, address },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing memory address, `None` for private storage.
    pub fn address(&self) -> Option<usize> {
        match &self.storage {
            Storage::Private { .. } => None,
            Storage::Mapped { address, .. } => Some(*address),
        }
    }

    /// Current value.
    pub fn get(&self) -> u32 {
        match &self.storage {
            Storage::Private { cell, .. } => cell.load(Ordering::SeqCst),
            // Address was validated at construction time.
            Storage::Mapped { bus, address } => bus.read(*address).unwrap_or(0),
        }
    }

    /// Sets the value, masked to the word width.
    pub fn set(&self, value: u32) {
        match &self.storage {
            Storage::Private { cell, word } => cell.store(word.truncate(value), Ordering::SeqCst),
            Storage::Mapped { bus, address } => {
                let _ = bus.write(*address, value);
            }
        }
    }

    /// Adds `delta` to the value, returning the new (masked) value.
    pub fn add(&self, delta: i64) -> u32 {
        let next = (self.get() as i64).wrapping_add(delta);
        self.set(next as u32);
        self.get()
    }
}

/// A named boolean holder, stored as a 0/1 cell.
pub struct Flag {
    register: Register,
}

impl Flag {
    pub fn mapped(
        name: impl Into<String>,
        bus: Arc<dyn MemoryBus>,
        address: usize,
    ) -> Result<Self, crate::ExecutionError> {
        Ok(Self {
            register: Register::mapped(name, bus, address)?,
        })
    }

    pub fn name(&self) -> &str {
        self.register.name()
    }

    /// The backing memory address, `None` for private storage.
    pub fn address(&self) -> Option<usize> {
        self.register.address()
    }

    pub fn get(&self) -> bool {
        self.register.get() != 0
    }

    pub fn set(&self, value: bool) {
        self.register.set(u32::from(value));
    }
}
