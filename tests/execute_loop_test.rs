//! Tests for the threaded execute loop: run, pause, step, stop, faults.

use std::sync::Arc;
use std::time::Duration;

use wordcpu::{instructions::default_set, Assembler, BufferSink, Processor, State, Word};

fn wait_for_stop(processor: &Processor) {
    for _ in 0..500 {
        if processor.state() == State::Stopped {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("processor did not stop within five seconds");
}

#[test]
fn test_run_executes_to_halt() {
    let sink = BufferSink::new();
    let processor = Processor::with_sink(
        Word::new(8).unwrap(),
        256,
        Arc::new(default_set()),
        100_000,
        sink.clone(),
    )
    .unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("SET 100, 9\nOUT 100\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();

    processor.run();
    wait_for_stop(&processor);

    assert_eq!(sink.contents(), "9\n");
    assert!(processor.fault().is_none());
    assert_eq!(processor.register("CYC").unwrap().get(), 3);
}

#[test]
fn test_pause_resume_stop() {
    // Slow clock: the cycle counter is word-masked, so a fast run could wrap
    // it between observations.
    let processor =
        Processor::new(Word::new(8).unwrap(), 256, Arc::new(default_set()), 100).unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("spin:\nINC 100\nJMP spin")
        .unwrap();
    processor.load(&program.opcodes).unwrap();

    processor.run();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(processor.state(), State::Running);

    processor.pause();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(processor.state(), State::Paused);
    let frozen = processor.register("CYC").unwrap().get();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(processor.register("CYC").unwrap().get(), frozen);

    processor.step();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(processor.register("CYC").unwrap().get(), frozen + 1);

    processor.resume();
    std::thread::sleep(Duration::from_millis(50));
    processor.stop();
    assert_eq!(processor.state(), State::Stopped);
    assert!(processor.register("CYC").unwrap().get() > frozen + 1);
}

#[test]
fn test_fault_stops_the_run_and_is_surfaced() {
    let processor = Processor::new(
        Word::new(8).unwrap(),
        256,
        Arc::new(default_set()),
        100_000,
    )
    .unwrap();
    // 0xEE is not an opcode in the default set.
    processor.load(&[0x00, 0xEE]).unwrap();

    processor.run();
    wait_for_stop(&processor);

    assert_eq!(
        processor.fault(),
        Some(wordcpu::ExecutionError::UnknownOpcode {
            opcode: 0xEE,
            address: 1
        })
    );
}

#[test]
fn test_division_by_zero_faults_at_the_offending_address() {
    let processor = Processor::new(
        Word::new(8).unwrap(),
        256,
        Arc::new(default_set()),
        100_000,
    )
    .unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("SET 100, 9\nSET 101, 0\nDIV 100, 101\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();

    processor.run();
    wait_for_stop(&processor);

    assert_eq!(
        processor.fault(),
        Some(wordcpu::ExecutionError::DivisionByZero { address: 6 })
    );
}

#[test]
fn test_sleep_delays_but_completes() {
    let processor = Processor::new(
        Word::new(8).unwrap(),
        256,
        Arc::new(default_set()),
        10_000,
    )
    .unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("SET 100, 20\nSLP 100\nINC 101\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();

    processor.run();
    wait_for_stop(&processor);

    assert_eq!(processor.memory().read(101).unwrap(), 1);
    assert!(processor.fault().is_none());
}

#[test]
fn test_history_records_executed_instructions() {
    let processor = Processor::new(
        Word::new(8).unwrap(),
        256,
        Arc::new(default_set()),
        100_000,
    )
    .unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("NOP\nSET 100, 1\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();

    processor.run();
    wait_for_stop(&processor);

    assert_eq!(
        processor.instruction_history(),
        vec![(0, "NOP"), (1, "SET"), (4, "HLT")]
    );
}

#[test]
fn test_run_twice_is_a_fresh_run() {
    let sink = BufferSink::new();
    let processor = Processor::with_sink(
        Word::new(8).unwrap(),
        256,
        Arc::new(default_set()),
        100_000,
        sink.clone(),
    )
    .unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("OUT 100\nHLT")
        .unwrap();

    processor.load(&program.opcodes).unwrap();
    processor.run();
    wait_for_stop(&processor);
    processor.stop();

    processor.load(&program.opcodes).unwrap();
    processor.run();
    wait_for_stop(&processor);

    assert_eq!(sink.contents(), "0\n0\n");
}
