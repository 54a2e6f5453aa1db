//! I/O instructions: OUT, OTC, INP.
//!
//! Output goes to the processor's [`OutputSink`](crate::OutputSink); input
//! comes from the processor's queue (see
//! [`Processor::queue_input`](crate::Processor::queue_input)).

use crate::{ExecutionError, Processor};

/// OUT addr - prints the addressed cell as a decimal number.
pub(crate) fn out(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let value = processor.cell(args[0])?;
    processor.print(&format!("{}\n", value));
    Ok(())
}

/// OTC addr - prints the addressed cell as a character (code point).
pub(crate) fn otc(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let value = processor.cell(args[0])?;
    let ch = char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER);
    processor.print(&ch.to_string());
    Ok(())
}

/// INP addr - stores the next queued input value (0 when the queue is empty).
pub(crate) fn inp(processor: &Processor, args: &[u32]) -> Result<(), ExecutionError> {
    let value = processor.pop_input();
    processor.set_cell(args[0], value)
}

#[cfg(test)]
mod tests {
    use crate::instructions::default_set;
    use crate::{BufferSink, Processor, Word};
    use std::sync::Arc;

    fn processor_with_sink() -> (Arc<Processor>, Arc<BufferSink>) {
        let sink = BufferSink::new();
        let p = Processor::with_sink(
            Word::new(8).unwrap(),
            256,
            Arc::new(default_set()),
            1_000,
            sink.clone(),
        )
        .unwrap();
        (p, sink)
    }

    #[test]
    fn test_out_prints_decimal() {
        let (p, sink) = processor_with_sink();
        p.load(&[0x10, 100, 42, 0x20, 100, 0x01]).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(sink.contents(), "42\n");
    }

    #[test]
    fn test_otc_prints_character() {
        let (p, sink) = processor_with_sink();
        p.load(&[0x10, 100, 72, 0x21, 100, 0x10, 100, 105, 0x21, 100, 0x01])
            .unwrap();
        while p.tick().unwrap() {}
        assert_eq!(sink.contents(), "Hi");
    }

    #[test]
    fn test_inp_reads_queue_then_zero() {
        let (p, _) = processor_with_sink();
        p.queue_input(9);
        p.load(&[0x30, 100, 0x30, 101, 0x01]).unwrap();
        while p.tick().unwrap() {}
        assert_eq!(p.memory().read(100).unwrap(), 9);
        assert_eq!(p.memory().read(101).unwrap(), 0);
    }
}
