use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

/// Returns the TIMA period in master-clock cycles for the given TAC value.
pub fn tima_period(timer_control: u8) -> u32 {
    match timer_control & 0x03 {
        0x00 => 1024,
        0x01 => 16,
        0x02 => 64,
        0x03 => 256,
        _ => unreachable!("two-bit field"),
    }
}

/// Cycle accumulators backing the DIV and TIMA registers.
///
/// The divider is a free-running 16-bit counter whose high byte is exposed as
/// DIV; the TIMA countdown tracks how many cycles remain until the next TIMA
/// increment at the current TAC frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerCounter {
    divider: u16,
    tima_countdown: u32,
}

impl TimerCounter {
    pub fn new() -> Self {
        // The visible DIV byte is 0xAB when control passes to the cartridge
        Self { divider: 0xAB00, tima_countdown: tima_period(0x00) }
    }

    /// Software wrote DIV: the whole accumulator resets, not just the
    /// visible byte.
    pub(crate) fn reset_divider(&mut self) {
        self.divider = 0;
    }

    /// Software changed the TAC frequency field: the countdown restarts at
    /// the new period.
    pub(crate) fn reload_countdown(&mut self, timer_control: u8) {
        self.tima_countdown = tima_period(timer_control);
    }
}

impl Default for TimerCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance DIV and TIMA by the given number of master-clock cycles.
///
/// TIMA increments whenever the countdown reaches zero; on overflow it
/// reloads from TMA and requests the timer interrupt.
pub fn update_timer_registers(
    io_registers: &mut IoRegisters,
    counter: &mut TimerCounter,
    cycles: u32,
) {
    counter.divider = counter.divider.wrapping_add(cycles as u16);
    io_registers.privileged_set_div((counter.divider >> 8) as u8);

    let timer_control = io_registers.read_register(IoRegister::TAC);
    if timer_control & 0x04 == 0 {
        return;
    }

    let period = tima_period(timer_control);

    let mut remaining = cycles;
    while remaining >= counter.tima_countdown {
        remaining -= counter.tima_countdown;
        counter.tima_countdown = period;

        let old_tima = io_registers.read_register(IoRegister::TIMA);
        match old_tima.overflowing_add(1) {
            (new_tima, false) => {
                io_registers.write_register(IoRegister::TIMA, new_tima);
            }
            (_, true) => {
                let timer_modulo = io_registers.read_register(IoRegister::TMA);
                io_registers.write_register(IoRegister::TIMA, timer_modulo);
                io_registers.interrupt_flags().set(InterruptType::Timer);
            }
        }
    }
    counter.tima_countdown -= remaining;
}
