//! The fetch-decode-execute loop and everything it owns.
//!
//! A [`Machine`] is built once per run by loading a program image, and
//! is discarded when the run halts. Nothing in here is shared between
//! runs: memory and the register file are exclusively owned by one
//! machine.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{self, ImageError};
use crate::constants::INSTRUCTION_LENGTH;

pub mod bus;
mod instructions;
mod memory;
mod registers;

pub use self::bus::{BusError, Color, DeviceCommand, DisplaySink, NullSink};
pub use self::instructions::{DecodeError, Instruction};
pub use self::memory::{Memory, MemoryError};
pub use self::registers::{Reg, RegisterError, Registers};

/// Failure raised while executing one cycle
#[derive(Debug, Error)]
pub enum Fault {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("register access failed: {0}")]
    Register(#[from] RegisterError),

    #[error("memory access failed: {0}")]
    Memory(#[from] MemoryError),

    #[error("device bus failed: {0}")]
    Bus(#[from] BusError),
}

/// A fault wrapped with the address of the instruction that raised it.
///
/// Mutations the failing instruction already made are not rolled back.
#[derive(Debug, Error)]
#[error("instruction at address {address} failed: {inner}")]
pub struct StepError {
    pub address: u16,
    pub inner: Fault,
}

/// Errors raised while loading a program image
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("empty program image")]
    Empty,

    #[error("program image of {0} bytes does not fit in memory")]
    TooLarge(usize),

    #[error(transparent)]
    Encoding(#[from] ImageError),
}

/// State of the machine after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

/// Run configuration consumed by [`Machine::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Pause between cycles. Pacing only: it never reorders or skips
    /// cycles.
    pub delay: Option<Duration>,

    /// Whether the device bus adapter is polled at all
    pub device_enabled: bool,

    /// Whether per-cycle durations are recorded for the report
    pub collect_timing: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            delay: None,
            device_enabled: true,
            collect_timing: false,
        }
    }
}

/// Timing summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Number of executed cycles
    pub cycles: usize,

    /// Wall-clock duration of the whole run
    pub elapsed: Duration,

    /// Average cycle duration, when timing collection was on
    pub average_cycle: Option<Duration>,
}

impl RunReport {
    fn new(cycles: usize, elapsed: Duration, durations: Option<Vec<Duration>>) -> Self {
        let average_cycle = durations.filter(|d| !d.is_empty()).map(|durations| {
            let total: Duration = durations.iter().sum();
            total / u32::try_from(durations.len()).unwrap_or(u32::MAX)
        });

        Self {
            cycles,
            elapsed,
            average_cycle,
        }
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} cycles in {:?}", self.cycles, self.elapsed)?;
        if let Some(average) = self.average_cycle {
            write!(f, ", {average:?} per cycle on average")?;
            let secs = average.as_secs_f64();
            if secs > 0.0 {
                write!(f, " (~{:.0} Hz)", 1.0 / secs)?;
            }
        }
        Ok(())
    }
}

/// The whole machine: register file, memory and cycle counter
#[derive(Default, Clone)]
pub struct Machine {
    pub registers: Registers,
    pub memory: Memory,
    pub cycles: usize,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Machine {{ registers: {:?}, memory: [...] }}",
            self.registers
        )
    }
}

impl Machine {
    /// Build a machine from a program image.
    ///
    /// Each whitespace separated token becomes one memory byte, written
    /// in order from address 0. The token count lands in `RSP` through
    /// the privileged path and becomes the halt sentinel.
    ///
    /// # Errors
    ///
    /// Fails on an empty image, an image bigger than memory, or any
    /// token failing byte validation. Nothing executes in those cases.
    pub fn load(source: &str) -> Result<Self, LoadError> {
        let image = codec::parse_image(source)?;
        if image.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut machine = Self::default();
        machine
            .memory
            .load(&image)
            .map_err(|_| LoadError::TooLarge(image.len()))?;

        #[allow(clippy::cast_possible_truncation)]
        let length = image.len() as u16;
        machine.registers.set_privileged(Reg::Rsp, length);

        info!(bytes = image.len(), "program loaded");
        Ok(machine)
    }

    /// Whether the halt condition holds: `RPC` equals `RSP`
    #[must_use]
    pub fn halted(&self) -> bool {
        self.registers.get(Reg::Rpc) == self.registers.get(Reg::Rsp)
    }

    /// Advance `RPC` to the next instruction
    pub(crate) fn advance(&mut self) {
        #[allow(clippy::cast_possible_truncation)]
        let next = self
            .registers
            .get(Reg::Rpc)
            .wrapping_add(INSTRUCTION_LENGTH as u16);
        self.registers.set_privileged(Reg::Rpc, next);
    }

    fn fetch(&self) -> Result<Instruction, Fault> {
        let base = u32::from(self.registers.get(Reg::Rpc));
        let mut window = [0_u8; INSTRUCTION_LENGTH];
        for (cell, address) in window.iter_mut().zip(base..) {
            *cell = self.memory.get(address)?;
        }
        Ok(Instruction::decode(window)?)
    }

    /// Execute one cycle: fetch, decode, execute, poll the device bus,
    /// check the halt condition.
    ///
    /// # Errors
    ///
    /// Any fault aborts the cycle, wrapped with the address of the
    /// instruction that raised it.
    pub fn step<S: DisplaySink>(
        &mut self,
        sink: &mut S,
        options: &RunOptions,
    ) -> Result<Status, StepError> {
        let address = self.registers.get(Reg::Rpc);
        let result = self.cycle(sink, options);
        self.cycles += 1;
        result.map_err(|inner| StepError { address, inner })
    }

    fn cycle<S: DisplaySink>(
        &mut self,
        sink: &mut S,
        options: &RunOptions,
    ) -> Result<Status, Fault> {
        let instruction = self.fetch()?;
        debug!("executing \"{instruction}\"");
        instruction.execute(self)?;
        debug!(registers = %self.registers, "register state");

        if options.device_enabled {
            bus::poll(&self.memory, sink)?;
        }

        if self.halted() {
            Ok(Status::Halted)
        } else {
            Ok(Status::Running)
        }
    }

    /// Run cycles until the machine halts.
    ///
    /// A machine whose halt condition already holds, like one loaded
    /// from a zero-length image, returns without executing anything.
    ///
    /// # Errors
    ///
    /// Stops at the first faulting cycle.
    #[tracing::instrument(skip_all)]
    pub fn run<S: DisplaySink>(
        &mut self,
        sink: &mut S,
        options: &RunOptions,
    ) -> Result<RunReport, StepError> {
        let start = Instant::now();
        let mut durations = options.collect_timing.then(Vec::new);

        while !self.halted() {
            let cycle_start = Instant::now();
            self.step(sink, options)?;

            if let Some(durations) = &mut durations {
                durations.push(cycle_start.elapsed());
            }

            if let Some(delay) = options.delay {
                std::thread::sleep(delay);
            }
        }

        let report = RunReport::new(self.cycles, start.elapsed(), durations);
        info!(cycles = report.cycles, "program halted");
        Ok(report)
    }
}
