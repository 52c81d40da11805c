pub(crate) mod instructions;
mod registers;


use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use crate::timer::TimerCounter;

pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

/// Cycles consumed by the interrupt service sequence (2 idle machine cycles,
/// 2 stack pushes, 1 jump).
pub const ISR_CYCLES_REQUIRED: u32 = 20;

/// The five interrupt sources, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    /// The position of this interrupt in the IF/IE registers.
    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 1 << 0,
            Self::LcdStatus => 1 << 1,
            Self::Timer => 1 << 2,
            Self::Serial => 1 << 3,
            Self::Joypad => 1 << 4,
        }
    }

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    /// The highest-priority interrupt in a pending bit mask, if any.
    fn highest_priority(pending: u8) -> Option<Self> {
        [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad]
            .into_iter()
            .find(|interrupt| pending & interrupt.bit() != 0)
    }
}

/// The set of interrupts that are both requested and enabled, regardless of
/// the IME flag. A non-zero value wakes a halted CPU.
pub fn pending_interrupts(bus: &AddressSpace) -> u8 {
    bus.get_ie_register() & bus.get_io_registers().read_register(IoRegister::IF) & 0x1F
}

/// Whether the CPU should service an interrupt before fetching the next
/// instruction. EI delays servicing by one instruction.
pub fn interrupt_triggered(cpu_registers: &CpuRegisters, bus: &AddressSpace) -> bool {
    cpu_registers.ime && !cpu_registers.ime_pending && pending_interrupts(bus) != 0
}

/// Service the highest-priority pending interrupt: acknowledge it in IF,
/// clear IME, push PC, and jump to the handler vector.
pub fn execute_interrupt_service_routine(
    cpu_registers: &mut CpuRegisters,
    bus: &mut AddressSpace,
    timer: &mut TimerCounter,
    ppu: &mut PpuState,
) {
    let Some(interrupt) = InterruptType::highest_priority(pending_interrupts(bus)) else {
        return;
    };

    log::trace!("Servicing {interrupt:?} interrupt, PC={:04X}", cpu_registers.pc);

    bus.get_io_registers_mut().interrupt_flags().clear(interrupt);
    cpu_registers.ime = false;
    cpu_registers.halted = false;

    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    bus.write_address_u16(cpu_registers.sp, cpu_registers.pc, timer, ppu);
    cpu_registers.pc = interrupt.handler_address();
}
