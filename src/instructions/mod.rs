//! # Default Instruction Set
//!
//! Implementations of the built-in instructions, organized by category.
//! Each instruction is a standalone function taking the processor and the
//! decoded argument cells.
//!
//! ## Categories and opcode groups
//!
//! The opcode space is sparse and grouped by category; the numeric grouping
//! is part of the program/processor compatibility contract:
//!
//! - **control** `0x00..=0x0F` (debug) and `0x40..=0x4F` (timing):
//!   NOP, HLT, DMP, SLP
//! - **memory** `0x10..=0x1F`: SET, MOV, SWP
//! - **io** `0x20..=0x2F` (output) and `0x30..=0x3F` (input): OUT, OTC, INP
//! - **math** `0x50..=0x5F`: ADD, SUB, MUL, DIV, MOD, INC, DEC
//! - **logic** `0x60..=0x6F`: AND, ORR, XOR, NOT, SHL, SHR, ROL, ROR, CMP
//! - **flow** `0x70..=0x7F` (jumps) and `0x80..=0x8F` (calls):
//!   JMP, JEZ, JNZ, JCS, JCC, CAL, RET
//! - **stack** `0x90..=0x9F`: PSH, POP
//!
//! Operands are memory addresses (register names assemble to their mapped
//! address); the single exception is the second operand of `SET`, which is a
//! literal cell value.

pub mod control;
pub mod flow;
pub mod io;
pub mod logic;
pub mod math;
pub mod memory;
pub mod stack;

use crate::{Instruction, InstructionSet};

/// Builds the built-in instruction set.
///
/// Constructed per processor; there is no process-wide table.
pub fn default_set() -> InstructionSet {
    InstructionSet::new(vec![
        // debug
        Instruction::new("NOP", 0x00, 0, control::nop),
        Instruction::new("HLT", 0x01, 0, control::hlt),
        Instruction::new("DMP", 0x02, 0, control::dmp),
        // memory
        Instruction::new("SET", 0x10, 2, memory::set),
        Instruction::new("MOV", 0x11, 2, memory::mov),
        Instruction::new("SWP", 0x12, 2, memory::swp),
        // output
        Instruction::new("OUT", 0x20, 1, io::out),
        Instruction::new("OTC", 0x21, 1, io::otc),
        // input
        Instruction::new("INP", 0x30, 1, io::inp),
        // timing
        Instruction::new("SLP", 0x40, 1, control::slp),
        // math
        Instruction::new("ADD", 0x50, 2, math::add),
        Instruction::new("SUB", 0x51, 2, math::sub),
        Instruction::new("MUL", 0x52, 2, math::mul),
        Instruction::new("DIV", 0x53, 2, math::div),
        Instruction::new("MOD", 0x54, 2, math::rem),
        Instruction::new("INC", 0x55, 1, math::inc),
        Instruction::new("DEC", 0x56, 1, math::dec),
        // logic
        Instruction::new("AND", 0x60, 2, logic::and),
        Instruction::new("ORR", 0x61, 2, logic::orr),
        Instruction::new("XOR", 0x62, 2, logic::xor),
        Instruction::new("NOT", 0x63, 1, logic::not),
        Instruction::new("SHL", 0x64, 2, logic::shl),
        Instruction::new("SHR", 0x65, 2, logic::shr),
        Instruction::new("ROL", 0x66, 2, logic::rol),
        Instruction::new("ROR", 0x67, 2, logic::ror),
        Instruction::new("CMP", 0x68, 2, logic::cmp),
        // jumps
        Instruction::new("JMP", 0x70, 1, flow::jmp),
        Instruction::new("JEZ", 0x71, 1, flow::jez),
        Instruction::new("JNZ", 0x72, 1, flow::jnz),
        Instruction::new("JCS", 0x73, 1, flow::jcs),
        Instruction::new("JCC", 0x74, 1, flow::jcc),
        // calls
        Instruction::new("CAL", 0x80, 1, flow::cal),
        Instruction::new("RET", 0x81, 0, flow::ret),
        // stack
        Instruction::new("PSH", 0x90, 1, stack::psh),
        Instruction::new("POP", 0x91, 1, stack::pop),
    ])
}
