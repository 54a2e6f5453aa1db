//! Memory instructions: SET, MOV, SWP.

use crate::{ExecutionError, Processor};

/// SET dst, imm - stores the literal `imm` in the cell at `dst`.
///
/// The only instruction whose second operand is a literal value rather than
/// an address.
pub(crate) fn set(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    processor.set_cell(args[0], args[1])
}

/// MOV dst, src - copies the cell at `src` into the cell at `dst`.
pub(crate) fn mov(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let value = processor.cell(args[1])?;
    processor.set_cell(args[0], value)
}

/// SWP a, b - exchanges two cells.
pub(crate) fn swp(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let a = processor.cell(args[0])?;
    let b = processor.cell(args[1])?;
    processor.set_cell(args[0], b)?;
    processor.set_cell(args[1], a)
}

#[cfg(test)]
mod tests {
    use crate::instructions::default_set;
    use crate::{Processor, Word};
    use std::sync::Arc;

    fn processor() -> Arc<Processor> {
        Processor::new(Word::new(8).unwrap(), 256, Arc::new(default_set()), 1_000).unwrap()
    }

    #[test]
    fn test_set_and_mov() {
        let p = processor();
        // SET 100, 42 ; MOV 101, 100 ; HLT
        p.load(&[0x10, 100, 42, 0x11, 101, 100, 0x01]).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.memory().read(100).unwrap(), 42);
        assert_eq!(p.memory().read(101).unwrap(), 42);
    }

    #[test]
    fn test_swp() {
        let p = processor();
        p.load(&[0x10, 100, 1, 0x10, 101, 2, 0x12, 100, 101, 0x01])
            .unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.memory().read(100).unwrap(), 2);
        assert_eq!(p.memory().read(101).unwrap(), 1);
    }

    #[test]
    fn test_mov_into_register_cell() {
        let p = processor();
        // AX is memory-mapped at 248: SET 248, 7 writes the register.
        p.load(&[0x10, 248, 7, 0x01]).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.register("AX").unwrap().get(), 7);
    }

    #[test]
    fn test_bad_address_is_fatal() {
        let p = Processor::new(Word::new(16).unwrap(), 64, Arc::new(default_set()), 1_000).unwrap();
        p.load(&[0x11, 63, 5000]).unwrap(); // MOV 63, 5000 - source out of range
        assert!(p.tick().is_err());
    }
}
