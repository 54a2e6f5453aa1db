//! Fuzz target for the assembler.
//!
//! Feeds arbitrary strings through the whole compile pipeline (tokenizer,
//! parser, code generation) to find panics. Compile errors are expected and
//! ignored; only a panic is a finding.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use wordcpu::{instructions::default_set, Assembler, Processor, Word};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // A dummy processor runs every compile-time check without real storage.
    let dummy = Processor::dummy(Word::new(8).unwrap(), 256, Arc::new(default_set())).unwrap();
    let assembler = Assembler::new(dummy.as_ref());

    if let Ok(program) = assembler.compile(source) {
        // Whatever compiled must be loadable on a matching real processor,
        // as long as it fits.
        if program.len() <= 256 {
            let real =
                Processor::new(Word::new(8).unwrap(), 256, Arc::new(default_set()), 1_000).unwrap();
            let _ = real.load(&program.opcodes);
        }
    }
});
