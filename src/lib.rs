//! Cycle-counted emulator core for the original monochrome Game Boy (DMG):
//! an instruction-accurate SM83 interpreter, an MBC1/MBC2/MBC3 cartridge
//! mapper with battery saves and the MBC3 real-time clock, a scanline PPU,
//! and the timer/interrupt plumbing that ties them together.
//!
//! The host drives the core through [`Machine`]: construct it from a ROM,
//! call [`Machine::run_one_frame`] at its own cadence, upload
//! [`Machine::frame_buffer`], and feed button state in through
//! [`Machine::set_joypad_state`].

mod cpu;
mod frame;
mod joypad;
mod memory;
mod ppu;
mod timer;

use crate::cpu::CpuRegisters;
use crate::memory::{AddressSpace, Cartridge};
use crate::ppu::PpuState;
use crate::timer::TimerCounter;
use std::path::{Path, PathBuf};

pub use cpu::instructions::ParseError;
pub use frame::{RunError, CYCLES_PER_FRAME};
pub use joypad::Button;
pub use memory::CartridgeLoadError;
pub use ppu::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};

// Flush dirty battery RAM roughly once per second of emulated time
const SAV_FLUSH_INTERVAL_FRAMES: u64 = 60;

/// The whole console: CPU, bus (cartridge + memories + I/O registers), PPU,
/// and timer, advanced cooperatively one frame at a time.
pub struct Machine {
    address_space: AddressSpace,
    cpu_registers: CpuRegisters,
    ppu_state: PpuState,
    timer_counter: TimerCounter,
    frame_count: u64,
}

impl Machine {
    /// Load a cartridge image from disk and boot the machine to its
    /// post-boot-ROM state. Battery saves (`<stem>.sav`) and RTC state
    /// (`<stem>.rtc`) are picked up from sibling files when present.
    pub fn from_file<P: AsRef<Path>>(rom_path: P) -> Result<Self, CartridgeLoadError> {
        Ok(Self::from_cartridge(Cartridge::from_file(rom_path)?))
    }

    /// Boot a machine from an in-memory ROM image. `sav_path` enables
    /// battery-save persistence for carts whose header declares a battery.
    pub fn from_rom(rom: Vec<u8>, sav_path: Option<PathBuf>) -> Result<Self, CartridgeLoadError> {
        Ok(Self::from_cartridge(Cartridge::new(rom, sav_path)?))
    }

    fn from_cartridge(cartridge: Cartridge) -> Self {
        Self {
            address_space: AddressSpace::new(cartridge),
            cpu_registers: CpuRegisters::new(),
            ppu_state: PpuState::new(),
            timer_counter: TimerCounter::new(),
            frame_count: 0,
        }
    }

    /// The cartridge header title.
    pub fn title(&self) -> &str {
        self.address_space.cartridge_title()
    }

    /// Emulate one frame: 70,224 master-clock cycles of CPU, timer, and PPU.
    ///
    /// # Errors
    ///
    /// Returns an error if the CPU fetches an invalid opcode. Save-file I/O
    /// problems are not errors here; they are logged and retried on the next
    /// flush.
    pub fn run_one_frame(&mut self) -> Result<(), RunError> {
        frame::run_frame(
            &mut self.address_space,
            &mut self.cpu_registers,
            &mut self.ppu_state,
            &mut self.timer_counter,
        )?;

        self.frame_count += 1;
        self.address_space.update_rtc();

        if self.frame_count % SAV_FLUSH_INTERVAL_FRAMES == 0 {
            if let Err(err) = self.address_space.persist_cartridge_ram() {
                log::error!("error writing cartridge RAM to sav file: {err}");
            }
        }

        Ok(())
    }

    /// The most recently completed 160x144 RGBA frame.
    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.ppu_state.frame_buffer()
    }

    /// Submit the live button state, one bit per button (see [`Button`]),
    /// 1 = released, 0 = pressed. Newly pressed buttons in a selected group
    /// request the joypad interrupt.
    pub fn set_joypad_state(&mut self, buttons: u8) {
        self.address_space.set_joypad_state(buttons);
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        if let Err(err) = self.address_space.persist_cartridge_ram() {
            log::error!("error writing cartridge RAM to sav file at shutdown: {err}");
        }
        if let Err(err) = self.address_space.persist_rtc() {
            log::error!("error writing RTC state at shutdown: {err}");
        }
    }
}
