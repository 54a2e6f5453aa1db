//! # Instruction Set
//!
//! An [`InstructionSet`] is a closed, explicit opcode↔keyword table. Both
//! lookup directions are fast: keyword lookup through a `HashMap`, opcode
//! lookup through a `BTreeMap` (the opcode space is sparse, so a dense array
//! would waste most of its entries).
//!
//! The numeric grouping of opcodes by category (debug, memory, I/O, input,
//! timing, math, logic, jumps, calls, stack) is part of the compatibility
//! contract between a compiled program and the processor that loads it: a
//! program only runs correctly against the instruction set it was compiled
//! for.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::processor::Processor;
use crate::ExecutionError;

/// The execute contract of one instruction.
///
/// Side effects are limited to memory/register/flag mutation and
/// processor-stop signaling. Control-flow instructions set IP themselves;
/// the execution loop detects that and does not advance IP again.
pub type ExecuteFn = fn(&Processor, &[u32]) -> Result<(), ExecutionError>;

/// One entry of an instruction set.
///
/// Encoded length in the opcode stream is `1 + arg_count` cells.
#[derive(Clone)]
pub struct Instruction {
    keyword: &'static str,
    opcode: u32,
    arg_count: usize,
    execute: ExecuteFn,
}

impl Instruction {
    pub fn new(keyword: &'static str, opcode: u32, arg_count: usize, execute: ExecuteFn) -> Self {
        Self {
            keyword,
            opcode,
            arg_count,
            execute,
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    pub fn opcode(&self) -> u32 {
        self.opcode
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    /// Cells occupied in the opcode stream (opcode + arguments).
    pub fn length(&self) -> usize {
        1 + self.arg_count
    }

    pub fn execute(&self, processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
        debug_assert_eq!(args.len(), self.arg_count);
        (self.execute)(processor, args)
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("keyword", &self.keyword)
            .field("opcode", &self.opcode)
            .field("arg_count", &self.arg_count)
            .finish()
    }
}

/// Closed two-way opcode↔keyword table.
///
/// Keyword lookup is case-insensitive (keywords are stored uppercase, the
/// assembler uppercases identifiers before lookup).
pub struct InstructionSet {
    by_keyword: HashMap<&'static str, Arc<Instruction>>,
    by_opcode: BTreeMap<u32, Arc<Instruction>>,
}

impl InstructionSet {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let mut by_keyword = HashMap::new();
        let mut by_opcode = BTreeMap::new();
        for instruction in instructions {
            let instruction = Arc::new(instruction);
            let prev_kw = by_keyword.insert(instruction.keyword(), instruction.clone());
            let prev_op = by_opcode.insert(instruction.opcode(), instruction.clone());
            debug_assert!(prev_kw.is_none(), "duplicate keyword {}", instruction.keyword());
            debug_assert!(prev_op.is_none(), "duplicate opcode {:#X}", instruction.opcode());
        }
        Self {
            by_keyword,
            by_opcode,
        }
    }

    pub fn by_keyword(&self, keyword: &str) -> Option<&Arc<Instruction>> {
        self.by_keyword.get(keyword)
    }

    pub fn by_opcode(&self, opcode: u32) -> Option<&Arc<Instruction>> {
        self.by_opcode.get(&opcode)
    }

    pub fn len(&self) -> usize {
        self.by_opcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_opcode.is_empty()
    }

    /// Instructions in ascending opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Instruction>> {
        self.by_opcode.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::default_set;

    #[test]
    fn test_two_way_lookup_agrees() {
        let set = default_set();
        for instruction in set.iter() {
            let by_kw = set.by_keyword(instruction.keyword()).unwrap();
            assert_eq!(by_kw.opcode(), instruction.opcode());
        }
    }

    #[test]
    fn test_unknown_lookups() {
        let set = default_set();
        assert!(set.by_keyword("XYZZY").is_none());
        assert!(set.by_opcode(0xFFFF_FFFF).is_none());
    }

    #[test]
    fn test_length_includes_opcode_cell() {
        let set = default_set();
        let add = set.by_keyword("ADD").unwrap();
        assert_eq!(add.arg_count(), 2);
        assert_eq!(add.length(), 3);
    }
}
