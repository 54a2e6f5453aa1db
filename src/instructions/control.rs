//! Debug and timing instructions: NOP, HLT, DMP, SLP.

use crate::{ExecutionError, Processor};

/// NOP - does nothing for one clock tick.
pub(crate) fn nop(_processor: &Processor, _args: &[u32]) -> Result<(), ExecutionError> {
    Ok(())
}

/// HLT - signals the processor to stop. IP stays at the halt instruction.
pub(crate) fn hlt(processor: &Processor, _args: &[u32]) -> Result<(), ExecutionError> {
    processor.signal_stop();
    Ok(())
}

/// DMP - writes the register file and flags to the output sink.
pub(crate) fn dmp(processor: &Processor, _args: &[u32]) -> Result<(), ExecutionError> {
    let mut line = String::new();
    for name in ["AX", "BX", "CX", "DX", "SP", "IP", "CYC"] {
        if let Some(register) = processor.register(name) {
            line.push_str(&format!("{}={} ", name, register.get()));
        }
    }
    line.push_str(&format!(
        "ZF={} CF={}\n",
        u8::from(processor.zero_flag().get()),
        u8::from(processor.carry_flag().get())
    ));
    tracing::debug!(state = %line.trim_end(), "dump");
    processor.print(&line);
    Ok(())
}

/// SLP addr - skips as many clock ticks as the addressed cell holds.
pub(crate) fn slp(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let ticks = processor.cell(args[0])?;
    processor.sleep(u64::from(ticks));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::instructions::default_set;
    use crate::{BufferSink, Processor, State, Word};
    use std::sync::Arc;

    #[test]
    fn test_hlt_stops_without_advancing_ip() {
        let p = Processor::new(Word::new(8).unwrap(), 256, Arc::new(default_set()), 1_000).unwrap();
        p.load(&[0x00, 0x01]).unwrap(); // NOP HLT
        while p.tick().unwrap() {}
        assert_eq!(p.state(), State::Stopped);
        assert_eq!(p.register("IP").unwrap().get(), 1);
    }

    #[test]
    fn test_dmp_writes_to_sink() {
        let sink = BufferSink::new();
        let p = Processor::with_sink(
            Word::new(8).unwrap(),
            256,
            Arc::new(default_set()),
            1_000,
            sink.clone(),
        )
        .unwrap();
        p.load(&[0x02, 0x01]).unwrap(); // DMP HLT
        while p.tick().unwrap() {}
        let out = sink.contents();
        assert!(out.contains("AX=0"), "got: {}", out);
        assert!(out.contains("ZF=0"));
    }
}
