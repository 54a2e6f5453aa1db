//! Arithmetic instructions: ADD, SUB, MUL, DIV, MOD, INC, DEC.
//!
//! All of these compute at native width, store the word-masked result in the
//! destination cell, set Zero from the masked result and Carry from any raw
//! bit outside the word's mask (subtraction borrows wrap the native width,
//! so a borrow sets Carry).

use crate::{ExecutionError, Processor};

fn binary(
    processor: &Processor,
    args: &[u32],
    op: impl Fn(u64, u64) -> u64,
) -> Result<(), ExecutionError> {
    let a = u64::from(processor.cell(args[0])?);
    let b = u64::from(processor.cell(args[1])?);
    let masked = processor.set_arith_flags(op(a, b));
    processor.set_cell(args[0], masked)
}

/// ADD dst, src - `dst <- dst + src`.
pub(crate) fn add(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    binary(processor, args, |a, b| a + b)
}

/// SUB dst, src - `dst <- dst - src`; borrow sets Carry.
pub(crate) fn sub(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    binary(processor, args, u64::wrapping_sub)
}

/// MUL dst, src - `dst <- dst * src`.
pub(crate) fn mul(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    binary(processor, args, |a, b| a * b)
}

/// DIV dst, src - integer division; a zero divisor is a fatal fault.
pub(crate) fn div(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let b = processor.cell(args[1])?;
    if b == 0 {
        return Err(ExecutionError::DivisionByZero {
            address: processor.ip_register().get() as usize,
        });
    }
    binary(processor, args, |a, b| a / b)
}

/// MOD dst, src - remainder; a zero divisor is a fatal fault.
pub(crate) fn rem(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let b = processor.cell(args[1])?;
    if b == 0 {
        return Err(ExecutionError::DivisionByZero {
            address: processor.ip_register().get() as usize,
        });
    }
    binary(processor, args, |a, b| a % b)
}

/// INC dst - `dst <- dst + 1`.
pub(crate) fn inc(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let a = u64::from(processor.cell(args[0])?);
    let masked = processor.set_arith_flags(a + 1);
    processor.set_cell(args[0], masked)
}

/// DEC dst - `dst <- dst - 1`.
pub(crate) fn dec(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let a = u64::from(processor.cell(args[0])?);
    let masked = processor.set_arith_flags(a.wrapping_sub(1));
    processor.set_cell(args[0], masked)
}
