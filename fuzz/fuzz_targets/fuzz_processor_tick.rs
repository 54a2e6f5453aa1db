//! Fuzz target for processor execution.
//!
//! Loads arbitrary cell contents as a program and ticks a bounded number of
//! times. Execution faults (unknown opcodes, bad addresses, division by
//! zero) are expected and ignored; only a panic is a finding.

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wordcpu::{instructions::default_set, Processor, Word};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Which of the supported word widths to run with.
    width_selector: u8,
    /// Raw program cells written from address 0.
    program: Vec<u32>,
    /// Values queued for the INP instruction.
    input: Vec<u32>,
}

fuzz_target!(|input: FuzzInput| {
    let bits = [8u8, 16, 24][usize::from(input.width_selector) % 3];
    let word = Word::new(bits).unwrap();
    // Small enough to terminate fast, large enough to hold the register file.
    let size = 128;

    let processor = Processor::new(word, size, Arc::new(default_set()), 1_000_000).unwrap();
    if processor.load(&input.program[..input.program.len().min(size)]).is_err() {
        return;
    }
    for value in input.input {
        processor.queue_input(value);
    }

    // Bounded synchronous execution; programs are free to loop forever.
    for _ in 0..1_000 {
        match processor.tick() {
            Ok(true) => {}
            Ok(false) | Err(_) => break,
        }
    }
});
