//! Behavior across the three supported word widths.

use std::sync::Arc;

use wordcpu::{instructions::default_set, Assembler, Processor, Word};

#[test]
fn test_supported_widths_only() {
    assert!(Word::new(8).is_ok());
    assert!(Word::new(16).is_ok());
    assert!(Word::new(24).is_ok());
    for bits in [0, 1, 7, 9, 12, 32, 64] {
        assert!(Word::new(bits).is_err(), "{} bits must be rejected", bits);
    }
}

#[test]
fn test_sixteen_bit_overflow_sets_carry_and_full_width_zero() {
    let word = Word::new(16).unwrap();
    let processor = Processor::new(word, 1024, Arc::new(default_set()), 1_000).unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("SET 100, 0xFF00\nSET 101, 0x0100\nADD 100, 101\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();
    while processor.tick().unwrap() {}

    // 0xFF00 + 0x0100 = 0x10000: masked to 0 across the whole word.
    assert_eq!(processor.memory().read(100).unwrap(), 0);
    assert!(processor.flag("ZF").unwrap().get());
    assert!(processor.flag("CF").unwrap().get());
}

#[test]
fn test_sixteen_bit_result_with_zero_low_byte_is_not_zero() {
    let word = Word::new(16).unwrap();
    let processor = Processor::new(word, 1024, Arc::new(default_set()), 1_000).unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("SET 100, 0x0180\nSET 101, 0x0080\nADD 100, 101\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();
    while processor.tick().unwrap() {}

    // 0x0180 + 0x0080 = 0x0200: low byte is zero, the word is not.
    assert_eq!(processor.memory().read(100).unwrap(), 0x0200);
    assert!(!processor.flag("ZF").unwrap().get());
    assert!(!processor.flag("CF").unwrap().get());
}

#[test]
fn test_twenty_four_bit_values_survive_unmasked() {
    let word = Word::new(24).unwrap();
    let processor = Processor::new(word, 4096, Arc::new(default_set()), 1_000).unwrap();
    let program = Assembler::new(processor.as_ref())
        .compile("SET 100, 0xABCDEF\nINC 100\nHLT")
        .unwrap();
    processor.load(&program.opcodes).unwrap();
    while processor.tick().unwrap() {}

    assert_eq!(processor.memory().read(100).unwrap(), 0xABCDF0);
}

#[test]
fn test_memory_writes_are_masked_to_the_word() {
    let word = Word::new(8).unwrap();
    let processor = Processor::new(word, 256, Arc::new(default_set()), 1_000).unwrap();
    processor.memory().write(10, 0x1FF).unwrap();
    assert_eq!(processor.memory().read(10).unwrap(), 0xFF);
}

#[test]
fn test_memory_size_bound_by_word_mask() {
    let set = Arc::new(default_set());
    // 8-bit addressing tops out at 256 cells.
    assert!(Processor::new(Word::new(8).unwrap(), 256, set.clone(), 1_000).is_ok());
    assert!(Processor::new(Word::new(8).unwrap(), 257, set.clone(), 1_000).is_err());
    // The same program space is fine under a wider word.
    assert!(Processor::new(Word::new(16).unwrap(), 257, set, 1_000).is_ok());
}

#[test]
fn test_register_file_tracks_memory_size() {
    let processor = Processor::new(
        Word::new(16).unwrap(),
        1000,
        Arc::new(default_set()),
        1_000,
    )
    .unwrap();
    assert_eq!(processor.register("AX").unwrap().address(), Some(992));
    assert_eq!(processor.register("IP").unwrap().address(), Some(999));
    assert_eq!(processor.register("SP").unwrap().get(), 992);
}
