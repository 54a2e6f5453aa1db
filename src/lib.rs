//! # wordcpu
//!
//! A software CPU with a configurable word size (8, 16 or 24 bits) and the
//! assembler that targets it.
//!
//! The processor executes programs from a flat cell-addressed memory whose
//! top eight cells back the register file (`AX BX CX DX ZF CF SP IP`), gated
//! by a clock running at 1 Hz to 1 GHz. The instruction set is an explicit,
//! replaceable table; the compiler asks the target processor which keywords
//! and register names exist, so the same source can be verified against a
//! storage-free dummy before touching a real machine.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use wordcpu::{instructions::default_set, Assembler, BufferSink, Processor, Word};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = BufferSink::new();
//! let processor = Processor::with_sink(
//!     Word::new(8)?,
//!     256,
//!     Arc::new(default_set()),
//!     1_000,
//!     sink.clone(),
//! )?;
//!
//! let program = Assembler::new(processor.as_ref()).compile(
//!     "; answer and halt
//!      SET 100, 42
//!      OUT 100
//!      HLT",
//! )?;
//!
//! processor.load(&program.opcodes)?;
//! while processor.tick()? {}
//!
//! assert_eq!(sink.contents(), "42\n");
//! # Ok(())
//! # }
//! ```
//!
//! For free-running execution use [`Processor::run`], which drives the same
//! `tick` primitive from a clock-gated worker thread and supports
//! `pause`/`resume`/`step`/`stop` from the controlling thread.

pub mod assembler;
pub mod clock;
pub mod error;
pub mod instruction;
pub mod instructions;
pub mod memory;
pub mod processor;
pub mod register;
pub mod registry;
pub mod word;

pub use assembler::{Assembler, CompiledProgram, FsResolver, IncludeResolver, LabelInfo};
pub use clock::Clock;
pub use error::{CompileError, ExecutionError, Location};
pub use instruction::{ExecuteFn, Instruction, InstructionSet};
pub use memory::{Memory, MemoryBus, NullMemory};
pub use processor::{
    BufferSink, OutputSink, Processor, ProcessorInterface, State, REGISTER_FILE_SIZE,
};
pub use register::{Flag, Register};
pub use registry::{DefaultProvider, InstructionSetProvider, ProviderRegistry};
pub use word::Word;
