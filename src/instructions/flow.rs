//! Control-flow instructions: JMP, JEZ, JNZ, JCS, JCC, CAL, RET.
//!
//! These redirect IP through `Processor::jump` so the execution loop knows
//! a transfer happened and does not advance past it. A plain before/after IP
//! comparison could not tell a jump to the instruction's own address apart
//! from no jump at all.

use crate::{ExecutionError, Processor};

/// JMP addr - unconditional jump.
pub(crate) fn jmp(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    processor.jump(args[0]);
    Ok(())
}

/// JEZ addr - jump when Zero is set.
pub(crate) fn jez(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    if processor.zero_flag().get() {
        processor.jump(args[0]);
    }
    Ok(())
}

/// JNZ addr - jump when Zero is clear.
pub(crate) fn jnz(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    if !processor.zero_flag().get() {
        processor.jump(args[0]);
    }
    Ok(())
}

/// JCS addr - jump when Carry is set.
pub(crate) fn jcs(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    if processor.carry_flag().get() {
        processor.jump(args[0]);
    }
    Ok(())
}

/// JCC addr - jump when Carry is clear.
pub(crate) fn jcc(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    if !processor.carry_flag().get() {
        processor.jump(args[0]);
    }
    Ok(())
}

/// CAL addr - pushes the return address (next instruction) and jumps.
pub(crate) fn cal(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let return_to = processor.ip_register().get() + 2;
    processor.push(return_to)?;
    processor.jump(args[0]);
    Ok(())
}

/// RET - pops the return address into IP.
pub(crate) fn ret(processor: &Processor, _args: &[u32]) -> Result<(), ExecutionError> {
    let return_to = processor.pop()?;
    processor.jump(return_to);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::instructions::default_set;
    use crate::{Processor, State, Word};
    use std::sync::Arc;

    fn processor() -> Arc<Processor> {
        Processor::new(Word::new(8).unwrap(), 200, Arc::new(default_set()), 1_000).unwrap()
    }

    #[test]
    fn test_jmp_does_not_double_advance() {
        let p = processor();
        // 0: JMP 5 ; 2: HLT (skipped) ; 5: HLT
        let mut program = vec![0u32; 6];
        program[0] = 0x70;
        program[1] = 5;
        program[2] = 0x01;
        program[5] = 0x01;
        p.load(&program).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.state(), State::Stopped);
        assert_eq!(p.register("IP").unwrap().get(), 5);
    }

    #[test]
    fn test_jump_to_own_address_loops() {
        let p = processor();
        // 0: JMP 0 - jumps to itself and must keep looping, not fall through.
        p.load(&[0x70, 0, 0x01]).unwrap();
        for _ in 0..10 {
            assert!(p.tick().unwrap());
            assert_eq!(p.register("IP").unwrap().get(), 0);
        }
        assert_eq!(p.register("CYC").unwrap().get(), 10);
    }

    #[test]
    fn test_conditional_jump_falls_through() {
        let p = processor();
        // Zero is clear: JEZ must fall through to the HLT at 2.
        p.load(&[0x71, 9, 0x01]).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.register("IP").unwrap().get(), 2);
    }

    #[test]
    fn test_call_and_return() {
        let p = processor();
        // 0: CAL 5 ; 2: HLT ; 5: INC 100 ; 7: RET
        let mut program = vec![0u32; 8];
        program[0] = 0x80;
        program[1] = 5;
        program[2] = 0x01;
        program[5] = 0x55;
        program[6] = 100;
        program[7] = 0x81;
        p.load(&program).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.memory().read(100).unwrap(), 1);
        assert_eq!(p.register("IP").unwrap().get(), 2);
        // Stack pointer restored after the return.
        assert_eq!(p.register("SP").unwrap().get(), 192);
    }
}
