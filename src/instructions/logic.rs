//! Logic instructions: AND, ORR, XOR, NOT, SHL, SHR, ROL, ROR, CMP.
//!
//! Shift and rotate semantics:
//! - the amount is read from the second operand's cell
//! - rotate amounts are taken modulo the word bit width
//! - amount 0 leaves the value unchanged and clears Carry
//! - otherwise Carry equals the last bit shifted or rotated out

use crate::{ExecutionError, Processor};

fn bitwise(
    processor: &Processor,
    args: &[u32],
    op: impl Fn(u32, u32) -> u32,
) -> Result<(), ExecutionError> {
    let a = processor.cell(args[0])?;
    let b = processor.cell(args[1])?;
    let masked = processor.set_arith_flags(u64::from(op(a, b)));
    processor.set_cell(args[0], masked)
}

/// AND dst, src - bitwise and.
pub(crate) fn and(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    bitwise(processor, args, |a, b| a & b)
}

/// ORR dst, src - bitwise or.
pub(crate) fn orr(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    bitwise(processor, args, |a, b| a | b)
}

/// XOR dst, src - bitwise exclusive or.
pub(crate) fn xor(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    bitwise(processor, args, |a, b| a ^ b)
}

/// NOT dst - bitwise complement within the word.
pub(crate) fn not(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let a = processor.cell(args[0])?;
    let masked = processor.set_arith_flags(u64::from(!a & processor.word().mask()));
    processor.set_cell(args[0], masked)
}

/// SHL dst, cnt - shift left by the addressed amount.
pub(crate) fn shl(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    shift(processor, args, true)
}

/// SHR dst, cnt - shift right by the addressed amount.
pub(crate) fn shr(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    shift(processor, args, false)
}

fn shift(processor: &Processor, args: &[u32], left: bool) -> Result<(), ExecutionError> {
    let word = processor.word();
    let width = u32::from(word.bits());
    let mut value = processor.cell(args[0])?;
    let amount = processor.cell(args[1])?;

    if amount == 0 {
        processor.zero_flag().set(value == 0);
        processor.carry_flag().set(false);
        return Ok(());
    }

    // Beyond `width` steps every original bit is gone; the extra iteration
    // shifts out a zero, which is exactly the carry a longer shift leaves.
    let steps = amount.min(width + 1);
    let mut carry = false;
    for _ in 0..steps {
        if left {
            carry = value >> (width - 1) & 1 == 1;
            value = (value << 1) & word.mask();
        } else {
            carry = value & 1 == 1;
            value >>= 1;
        }
    }

    processor.zero_flag().set(value == 0);
    processor.carry_flag().set(carry);
    processor.set_cell(args[0], value)
}

/// ROL dst, cnt - rotate left; amount taken modulo the word width.
pub(crate) fn rol(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    rotate(processor, args, true)
}

/// ROR dst, cnt - rotate right; amount taken modulo the word width.
pub(crate) fn ror(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    rotate(processor, args, false)
}

fn rotate(processor: &Processor, args: &[u32], left: bool) -> Result<(), ExecutionError> {
    let word = processor.word();
    let width = u32::from(word.bits());
    let value = processor.cell(args[0])?;
    let amount = processor.cell(args[1])? % width;

    if amount == 0 {
        processor.zero_flag().set(value == 0);
        processor.carry_flag().set(false);
        return Ok(());
    }

    let rotated = if left {
        ((value << amount) | (value >> (width - amount))) & word.mask()
    } else {
        ((value >> amount) | (value << (width - amount))) & word.mask()
    };
    // The last bit rotated out wraps around to the opposite end.
    let carry = if left {
        rotated & 1 == 1
    } else {
        rotated >> (width - 1) & 1 == 1
    };

    processor.zero_flag().set(rotated == 0);
    processor.carry_flag().set(carry);
    processor.set_cell(args[0], rotated)
}

/// CMP a, b - sets Zero when the cells are equal, Carry when `a < b`.
pub(crate) fn cmp(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let a = processor.cell(args[0])?;
    let b = processor.cell(args[1])?;
    processor.zero_flag().set(a == b);
    processor.carry_flag().set(a < b);
    Ok(())
}
