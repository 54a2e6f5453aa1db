//! Stack instructions: PSH, POP.
//!
//! The stack grows downward from just below the register file; SP points at
//! the most recently pushed cell.

use crate::{ExecutionError, Processor};

/// PSH src - pushes the addressed cell.
pub(crate) fn psh(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let value = processor.cell(args[0])?;
    processor.push(value)
}

/// POP dst - pops into the addressed cell.
pub(crate) fn pop(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let value = processor.pop()?;
    processor.set_cell(args[0], value)
}
