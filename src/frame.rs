use crate::cpu::instructions::{self, ParseError};
use crate::cpu::CpuRegisters;
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use crate::timer::TimerCounter;
use crate::{cpu, ppu, timer};
use thiserror::Error;

/// One frame of the 4.194304 MHz master clock: 154 scanlines of 456 dots.
pub const CYCLES_PER_FRAME: u64 = 70_224;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("error parsing CPU instruction: {source}")]
    InstructionParse {
        #[from]
        source: ParseError,
    },
}

/// Run the machine for one frame (70,224 cycles).
///
/// Each step executes one CPU instruction or interrupt service, then
/// advances the timer and the PPU by the cycles that step consumed. The
/// ordering is fixed: CPU, interrupt service, timer, PPU.
pub(crate) fn run_frame(
    bus: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    ppu_state: &mut PpuState,
    timer_counter: &mut TimerCounter,
) -> Result<(), RunError> {
    let mut frame_cycles = 0;

    while frame_cycles < CYCLES_PER_FRAME {
        let cycles = tick_cpu(bus, cpu_registers, timer_counter, ppu_state)?;

        timer::update_timer_registers(bus.get_io_registers_mut(), timer_counter, cycles);
        ppu::tick(ppu_state, bus, cycles);

        frame_cycles += u64::from(cycles);
    }

    Ok(())
}

/// Execute one CPU step and return the cycles it consumed: an interrupt
/// service sequence, a halted idle cycle, or one instruction.
pub(crate) fn tick_cpu(
    bus: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    timer_counter: &mut TimerCounter,
    ppu_state: &mut PpuState,
) -> Result<u32, RunError> {
    if cpu::interrupt_triggered(cpu_registers, bus) {
        cpu::execute_interrupt_service_routine(cpu_registers, bus, timer_counter, ppu_state);
        return Ok(cpu::ISR_CYCLES_REQUIRED);
    }

    if cpu_registers.halted {
        if cpu::pending_interrupts(bus) == 0 {
            return Ok(4);
        }
        // A pending interrupt ends HALT even with IME clear; execution
        // resumes after the HALT instruction without servicing it
        cpu_registers.halted = false;
    }

    let (instruction, pc) =
        instructions::decode_next_instruction(bus, cpu_registers.pc, cpu_registers.halt_bug)?;
    cpu_registers.halt_bug = false;

    log::trace!("Executing {instruction:02X?} at PC={:04X}", cpu_registers.pc);

    cpu_registers.pc = pc;
    let cycles = instruction.cycles_required(cpu_registers);
    instruction.execute(bus, cpu_registers, timer_counter, ppu_state);

    Ok(cycles)
}
