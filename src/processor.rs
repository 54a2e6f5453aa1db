//! # Processor
//!
//! The fetch-decode-execute engine. A [`Processor`] owns a [`MemoryBus`], a
//! register file mapped into the top of that memory, a [`Clock`] gating the
//! execute loop, and an [`InstructionSet`] that decodes fetched opcodes.
//!
//! ## Register file
//!
//! The highest eight memory addresses back the named registers and flags
//! (`size` is the memory size):
//!
//! | name | address    | role                         |
//! |------|------------|------------------------------|
//! | `AX` | `size - 8` | general purpose              |
//! | `BX` | `size - 7` | general purpose              |
//! | `CX` | `size - 6` | general purpose              |
//! | `DX` | `size - 5` | general purpose              |
//! | `ZF` | `size - 4` | Zero flag                    |
//! | `CF` | `size - 3` | Carry flag                   |
//! | `SP` | `size - 2` | stack pointer (grows down)   |
//! | `IP` | `size - 1` | instruction pointer          |
//!
//! One additional register, `CYC` (executed-instruction counter), uses
//! private storage: it can be monitored by name but has no memory address,
//! so the assembler rejects it as an operand.
//!
//! ## Execution model
//!
//! `run()` spawns a worker thread that busy-polls the clock and executes one
//! instruction per fire. `pause`/`resume`/`step`/`stop` are safe to call
//! from a controller thread. [`Processor::tick`] executes exactly one
//! instruction synchronously and is the primitive both the loop and `step`
//! use.
//!
//! The loop never advances IP past an instruction that already redirected
//! it: control-flow instructions transfer through an explicit jump latch the
//! loop consumes, so even a jump to the instruction's own address loops
//! instead of falling through. IP reaching the end of memory stops the
//! processor. Execution faults (bad address, unknown opcode, division by
//! zero) stop the run and are surfaced through [`Processor::fault`]; they
//! are never swallowed or retried.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::{
    Clock, ExecutionError, Flag, InstructionSet, Memory, MemoryBus, NullMemory, Register, Word,
};

/// Entries kept in the instruction history ring.
const HISTORY_LIMIT: usize = 1000;

/// Smallest usable memory: the register file plus a little program space.
const MIN_MEMORY_SIZE: usize = 16;

/// Cells at the top of memory reserved for registers and flags.
pub const REGISTER_FILE_SIZE: usize = 8;

/// Processor lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stopped,
    Running,
    /// Running with the loop gated off; `step()` executes single instructions.
    Paused,
}

/// Capability the compiler consumes: named register/flag lookup, memory
/// access and the instruction set. Compilation is read-only with respect to
/// all three.
pub trait ProcessorInterface {
    fn register(&self, name: &str) -> Option<Arc<Register>>;
    fn flag(&self, name: &str) -> Option<Arc<Flag>>;
    fn instruction_set(&self) -> &InstructionSet;
    fn memory(&self) -> &Arc<dyn MemoryBus>;
}

/// Text sink for `OUT`/`OTC`/`DMP`; the host application supplies one.
pub trait OutputSink: Send + Sync {
    fn print(&self, text: &str);
}

/// Sink collecting output into a string, for tests and embedding hosts.
#[derive(Default)]
pub struct BufferSink {
    buffer: Mutex<String>,
}

impl BufferSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current accumulated output.
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }
}

impl OutputSink for BufferSink {
    fn print(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }
}

const STATE_STOPPED: u8 = 0;
const STATE_RUNNING: u8 = 1;

/// A software CPU with configurable word size.
pub struct Processor {
    word: Word,
    memory: Arc<dyn MemoryBus>,
    instruction_set: Arc<InstructionSet>,
    clock: Arc<Clock>,

    registers: HashMap<String, Arc<Register>>,
    flags: HashMap<String, Arc<Flag>>,
    ip: Arc<Register>,
    sp: Arc<Register>,
    cyc: Arc<Register>,
    zero: Arc<Flag>,
    carry: Arc<Flag>,

    state: AtomicU8,
    paused: AtomicBool,
    step_requested: AtomicBool,
    /// Latched by a halt signal, consumed by the tick that executed it.
    halted: AtomicBool,
    /// Latched by a control transfer, consumed by the advancing logic.
    ip_written: AtomicBool,
    sleep_ticks: AtomicU64,

    history: Mutex<VecDeque<(usize, &'static str)>>,
    input: Mutex<VecDeque<u32>>,
    sink: Arc<dyn OutputSink>,
    fault: Mutex<Option<ExecutionError>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Processor {
    /// Creates a processor with real storage.
    pub fn new(
        word: Word,
        memory_size: usize,
        instruction_set: Arc<InstructionSet>,
        frequency_hz: u64,
    ) -> Result<Arc<Self>, ExecutionError> {
        let memory: Arc<dyn MemoryBus> = Arc::new(Memory::new(word, memory_size));
        Self::build(word, memory, instruction_set, frequency_hz, BufferSink::new())
    }

    /// Creates a processor with real storage and a host-supplied output sink.
    pub fn with_sink(
        word: Word,
        memory_size: usize,
        instruction_set: Arc<InstructionSet>,
        frequency_hz: u64,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Arc<Self>, ExecutionError> {
        let memory: Arc<dyn MemoryBus> = Arc::new(Memory::new(word, memory_size));
        Self::build(word, memory, instruction_set, frequency_hz, sink)
    }

    /// Creates a non-storing dummy processor.
    ///
    /// Every validity check (addresses, program size, register layout) runs
    /// exactly as on a real processor; nothing is stored and nothing should
    /// be executed. Used by verify/obfuscate tooling.
    pub fn dummy(
        word: Word,
        memory_size: usize,
        instruction_set: Arc<InstructionSet>,
    ) -> Result<Arc<Self>, ExecutionError> {
        let memory: Arc<dyn MemoryBus> = Arc::new(NullMemory::new(word, memory_size));
        Self::build(word, memory, instruction_set, 1_000, BufferSink::new())
    }

    fn build(
        word: Word,
        memory: Arc<dyn MemoryBus>,
        instruction_set: Arc<InstructionSet>,
        frequency_hz: u64,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Arc<Self>, ExecutionError> {
        let size = memory.size();
        if size < MIN_MEMORY_SIZE {
            return Err(ExecutionError::InvalidMemorySize {
                size,
                message: format!("need at least {} cells", MIN_MEMORY_SIZE),
            });
        }
        if size - 1 > word.mask() as usize {
            return Err(ExecutionError::InvalidMemorySize {
                size,
                message: format!("addresses do not fit in a {}", word),
            });
        }

        let base = size - REGISTER_FILE_SIZE;
        let mut registers = HashMap::new();
        for (i, name) in ["AX", "BX", "CX", "DX"].iter().enumerate() {
            let reg = Arc::new(Register::mapped(*name, memory.clone(), base + i)?);
            registers.insert((*name).to_string(), reg);
        }
        let zero = Arc::new(Flag::mapped("ZF", memory.clone(), size - 4)?);
        let carry = Arc::new(Flag::mapped("CF", memory.clone(), size - 3)?);
        let sp = Arc::new(Register::mapped("SP", memory.clone(), size - 2)?);
        let ip = Arc::new(Register::mapped("IP", memory.clone(), size - 1)?);
        let cyc = Arc::new(Register::private("CYC", word));

        sp.set(base as u32);

        registers.insert("SP".to_string(), sp.clone());
        registers.insert("IP".to_string(), ip.clone());
        registers.insert("CYC".to_string(), cyc.clone());

        let mut flags = HashMap::new();
        flags.insert("ZF".to_string(), zero.clone());
        flags.insert("CF".to_string(), carry.clone());

        Ok(Arc::new(Self {
            word,
            memory,
            instruction_set,
            clock: Arc::new(Clock::new(frequency_hz)?),
            registers,
            flags,
            ip,
            sp,
            cyc,
            zero,
            carry,
            state: AtomicU8::new(STATE_STOPPED),
            paused: AtomicBool::new(false),
            step_requested: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            ip_written: AtomicBool::new(false),
            sleep_ticks: AtomicU64::new(0),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
            input: Mutex::new(VecDeque::new()),
            sink,
            fault: Mutex::new(None),
            worker: Mutex::new(None),
        }))
    }

    // ========== Loading ==========

    /// Writes a compiled opcode stream into memory starting at address 0 and
    /// resets IP, SP and flags.
    ///
    /// A program larger than the memory fails with the address error of the
    /// first cell that does not fit; against a dummy processor this is the
    /// identical error a real load would produce.
    pub fn load(&self, opcodes: &[u32]) -> Result<(), ExecutionError> {
        for (address, cell) in opcodes.iter().enumerate() {
            self.memory.write(address, *cell)?;
        }
        self.ip.set(0);
        self.sp.set((self.memory.size() - REGISTER_FILE_SIZE) as u32);
        self.zero.set(false);
        self.carry.set(false);
        self.cyc.set(0);
        self.halted.store(false, Ordering::SeqCst);
        self.ip_written.store(false, Ordering::SeqCst);
        Ok(())
    }

    // ========== Lifecycle ==========

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        if self.state.load(Ordering::SeqCst) == STATE_STOPPED {
            State::Stopped
        } else if self.paused.load(Ordering::SeqCst) {
            State::Paused
        } else {
            State::Running
        }
    }

    /// Starts the execute loop on a worker thread. No-op when already running.
    pub fn run(self: &Arc<Self>) {
        if self
            .state
            .compare_exchange(
                STATE_STOPPED,
                STATE_RUNNING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }
        *self.fault.lock() = None;
        self.paused.store(false, Ordering::SeqCst);
        self.step_requested.store(false, Ordering::SeqCst);
        self.halted.store(false, Ordering::SeqCst);
        self.ip_written.store(false, Ordering::SeqCst);
        self.clock.restart();
        tracing::info!(frequency = self.clock.frequency(), "processor started");

        let processor = Arc::clone(self);
        let handle = std::thread::spawn(move || processor.run_loop());
        *self.worker.lock() = Some(handle);
    }

    fn run_loop(&self) {
        while self.state.load(Ordering::SeqCst) == STATE_RUNNING {
            if !self.clock.fire() {
                std::hint::spin_loop();
                continue;
            }
            if self.paused.load(Ordering::SeqCst)
                && !self.step_requested.swap(false, Ordering::SeqCst)
            {
                continue;
            }
            if self.sleep_ticks.load(Ordering::SeqCst) > 0 {
                self.sleep_ticks.fetch_sub(1, Ordering::SeqCst);
                continue;
            }
            match self.tick() {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    tracing::error!(ip = self.ip.get(), %error, "execution fault");
                    *self.fault.lock() = Some(error);
                    break;
                }
            }
        }
        self.state.store(STATE_STOPPED, Ordering::SeqCst);
        tracing::info!(cycles = self.cyc.get(), "processor stopped");
    }

    /// Gates the loop off without stopping it.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Reopens the gate after [`Processor::pause`].
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Executes exactly one instruction while paused, then re-pauses.
    pub fn step(&self) {
        if self.state.load(Ordering::SeqCst) == STATE_RUNNING && self.paused.load(Ordering::SeqCst)
        {
            self.step_requested.store(true, Ordering::SeqCst);
        }
    }

    /// Stops the processor. Idempotent from any state; takes effect at the
    /// next loop-iteration boundary, not preemptively mid-instruction.
    pub fn stop(&self) {
        self.state.store(STATE_STOPPED, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    /// Stop signal for instructions (`HLT`); does not join the worker.
    ///
    /// Latches the halt so a synchronous [`Processor::tick`] caller observes
    /// it too; the state alone cannot carry that signal, since a processor
    /// that was never started is also Stopped.
    pub(crate) fn signal_stop(&self) {
        self.state.store(STATE_STOPPED, Ordering::SeqCst);
        self.halted.store(true, Ordering::SeqCst);
    }

    /// Control transfer for instructions (jumps, calls, returns): sets IP
    /// and latches that it was redirected, so the execute loop does not
    /// advance past it - even when the target is the instruction's own
    /// address.
    pub(crate) fn jump(&self, address: u32) {
        self.ip.set(address);
        self.ip_written.store(true, Ordering::SeqCst);
    }

    /// Fetches, decodes and executes the instruction at IP.
    ///
    /// Returns `Ok(false)` once the processor has stopped (halt instruction
    /// or IP at the end of memory). This is the synchronous execution
    /// primitive; `run()` drives it through the clock gate.
    pub fn tick(&self) -> Result<bool, ExecutionError> {
        let ip = self.ip.get() as usize;
        if ip >= self.memory.size() {
            self.signal_stop();
            return Ok(false);
        }

        let opcode = self.memory.read(ip)?;
        let instruction = self
            .instruction_set
            .by_opcode(opcode)
            .ok_or(ExecutionError::UnknownOpcode {
                opcode,
                address: ip,
            })?
            .clone();

        let mut args = Vec::with_capacity(instruction.arg_count());
        for i in 1..=instruction.arg_count() {
            args.push(self.memory.read(ip + i)?);
        }

        instruction.execute(self, &args)?;
        self.record_history(ip, instruction.keyword());
        self.cyc.add(1);

        if self.halted.swap(false, Ordering::SeqCst) {
            // A halt freezes IP where the halting instruction left it.
            return Ok(false);
        }

        // Control-flow instructions redirect IP through `jump`; advancing
        // again would skip their target.
        if !self.ip_written.swap(false, Ordering::SeqCst) {
            self.ip.set((ip + instruction.length()) as u32);
        }
        if self.ip.get() as usize >= self.memory.size() {
            self.signal_stop();
            return Ok(false);
        }
        Ok(true)
    }

    fn record_history(&self, address: usize, keyword: &'static str) {
        let mut history = self.history.lock();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back((address, keyword));
    }

    // ========== Accessors ==========

    pub fn word(&self) -> Word {
        self.word
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    /// Bounded `(address, keyword)` trace of executed instructions, oldest
    /// first.
    pub fn instruction_history(&self) -> Vec<(usize, &'static str)> {
        self.history.lock().iter().copied().collect()
    }

    /// The fault that stopped the last run, if any.
    pub fn fault(&self) -> Option<ExecutionError> {
        self.fault.lock().clone()
    }

    /// Queues a value for the `INP` instruction.
    pub fn queue_input(&self, value: u32) {
        self.input.lock().push_back(value);
    }

    /// Looks up a register (including the private `CYC`) by name.
    pub fn register(&self, name: &str) -> Option<Arc<Register>> {
        self.registers.get(name).cloned()
    }

    /// Looks up a flag by name.
    pub fn flag(&self, name: &str) -> Option<Arc<Flag>> {
        self.flags.get(name).cloned()
    }

    pub fn instruction_set(&self) -> &InstructionSet {
        &self.instruction_set
    }

    pub fn memory(&self) -> &Arc<dyn MemoryBus> {
        &self.memory
    }

    // ========== Instruction support ==========

    pub(crate) fn cell(&self, address: u32) -> Result<u32, ExecutionError> {
        self.memory.read(address as usize)
    }

    pub(crate) fn set_cell(&self, address: u32, value: u32) -> Result<(), ExecutionError> {
        self.memory.write(address as usize, value)
    }

    pub(crate) fn ip_register(&self) -> &Register {
        &self.ip
    }

    pub(crate) fn sp_register(&self) -> &Register {
        &self.sp
    }

    pub(crate) fn zero_flag(&self) -> &Flag {
        &self.zero
    }

    pub(crate) fn carry_flag(&self) -> &Flag {
        &self.carry
    }

    /// Sets Zero and Carry from a raw native-width result, returning the
    /// word-masked value.
    ///
    /// Zero reflects the result masked to the configured word's full bit
    /// width; Carry is set when any raw bit lies outside the word's mask.
    pub(crate) fn set_arith_flags(&self, raw: u64) -> u32 {
        let masked = (raw as u32) & self.word.mask();
        self.zero.set(masked == 0);
        self.carry.set(self.word.overflows(raw));
        masked
    }

    pub(crate) fn push(&self, value: u32) -> Result<(), ExecutionError> {
        let top = self.sp.add(-1);
        self.memory.write(top as usize, value)
    }

    pub(crate) fn pop(&self) -> Result<u32, ExecutionError> {
        let top = self.sp.get();
        let value = self.memory.read(top as usize)?;
        self.sp.add(1);
        Ok(value)
    }

    pub(crate) fn print(&self, text: &str) {
        self.sink.print(text);
    }

    pub(crate) fn pop_input(&self) -> u32 {
        self.input.lock().pop_front().unwrap_or(0)
    }

    pub(crate) fn sleep(&self, ticks: u64) {
        self.sleep_ticks.store(ticks, Ordering::SeqCst);
    }
}

impl ProcessorInterface for Processor {
    fn register(&self, name: &str) -> Option<Arc<Register>> {
        Processor::register(self, name)
    }

    fn flag(&self, name: &str) -> Option<Arc<Flag>> {
        Processor::flag(self, name)
    }

    fn instruction_set(&self) -> &InstructionSet {
        Processor::instruction_set(self)
    }

    fn memory(&self) -> &Arc<dyn MemoryBus> {
        Processor::memory(self)
    }
}
