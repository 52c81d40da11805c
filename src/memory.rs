pub mod address;
pub mod ioregisters;
mod mapper;

use crate::joypad::JoypadState;
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use crate::memory::mapper::{Mapper, RamMapResult, RealTimeClock};
use crate::ppu::PpuState;
use crate::timer::TimerCounter;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

const ROM_BANK_SIZE: usize = 16 * 1024;
const HEADER_SIZE: usize = 0x0150;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("ROM image should be at least {HEADER_SIZE} bytes, was {rom_len} bytes")]
    HeaderTooShort { rom_len: usize },
    #[error("invalid or unsupported mapper byte in cartridge header: {mapper_byte:02X}")]
    UnsupportedMapper { mapper_byte: u8 },
    #[error("invalid RAM size code in cartridge header, expected 0-5: {ram_size_code}")]
    InvalidRamSize { ram_size_code: u8 },
    #[error("error reading data from {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Battery-backed save RAM bookkeeping: where the sav file lives and whether
/// the RAM content has changed since the last successful write.
#[derive(Debug)]
struct RamBattery {
    dirty: bool,
    sav_path: PathBuf,
}

impl RamBattery {
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // Write-then-rename so a crash mid-write cannot truncate the old save
    fn persist_ram(&mut self, ram: &[u8]) -> Result<(), io::Error> {
        if !self.dirty {
            return Ok(());
        }

        let staging_path = self.sav_path.with_extension("sav.tmp");
        fs::write(&staging_path, ram)?;
        fs::rename(&staging_path, &self.sav_path)?;

        self.dirty = false;

        Ok(())
    }
}

// A missing sav file is normal (first run); any other read failure is
// tolerated too, since losing a save must never prevent booting
fn load_sav_file(sav_file: &Path) -> Option<Vec<u8>> {
    match fs::read(sav_file) {
        Ok(bytes) => {
            log::info!("Loaded {} bytes of external RAM from {}", bytes.len(), sav_file.display());
            Some(bytes)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            log::error!("unable to read sav file {}: {err}", sav_file.display());
            None
        }
    }
}

fn load_rtc(rtc_file: &Path) -> Option<RealTimeClock> {
    let bytes = match fs::read(rtc_file) {
        Ok(bytes) => bytes,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                log::warn!("unable to read RTC file {}: {err}", rtc_file.display());
            }
            return None;
        }
    };

    match bincode::deserialize(&bytes) {
        Ok(clock) => {
            log::info!("Restored real-time clock state from {}", rtc_file.display());
            Some(clock)
        }
        Err(err) => {
            log::warn!("corrupt RTC state in {}, resetting clock: {err}", rtc_file.display());
            None
        }
    }
}

fn parse_header_title(rom: &[u8]) -> String {
    rom[address::TITLE_START as usize..=address::TITLE_END as usize]
        .iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| char::from(byte))
        .collect()
}

pub struct Cartridge {
    rom: Vec<u8>,
    mapper: Mapper,
    ram: Vec<u8>,
    ram_battery: Option<RamBattery>,
    title: String,
}

impl Cartridge {
    /// Create a new Cartridge value from the given ROM image.
    ///
    /// ROMs whose length is not a multiple of the 16KB bank size are padded
    /// with 0xFF. If `sav_path` is given and the header declares a battery,
    /// a previous save (and RTC state, for MBC3 timer carts) is loaded from
    /// the sibling files.
    ///
    /// # Errors
    ///
    /// Returns `CartridgeLoadError` when the image is shorter than the
    /// cartridge header, when the mapper byte is unknown, or when the RAM
    /// size code is invalid.
    pub fn new(mut rom: Vec<u8>, sav_path: Option<PathBuf>) -> Result<Self, CartridgeLoadError> {
        log::info!("Initializing cartridge using {} bytes of data", rom.len());

        if rom.len() < HEADER_SIZE {
            return Err(CartridgeLoadError::HeaderTooShort { rom_len: rom.len() });
        }

        if rom.len() % ROM_BANK_SIZE != 0 {
            let padded_len = rom.len().next_multiple_of(ROM_BANK_SIZE);
            log::warn!("ROM size {} is not bank-aligned, padding to {padded_len}", rom.len());
            rom.resize(padded_len, 0xFF);
        }

        let mapper_byte = rom[address::MAPPER as usize];
        let Some((mapper_type, mapper_features)) = mapper::parse_byte(mapper_byte) else {
            return Err(CartridgeLoadError::UnsupportedMapper { mapper_byte });
        };

        let title = parse_header_title(&rom);

        log::info!("Detected mapper type {mapper_type:?} (byte: {mapper_byte:02X})");
        log::info!("Mapper features: {mapper_features}");
        log::info!("Header title: '{title}'");

        let ram_len = if mapper_type == mapper::MapperType::Mbc2 {
            // MBC2 carts carry a fixed internal 512x4-bit array and ignore
            // the header RAM size field
            512
        } else if mapper_features.has_ram {
            let ram_size_code = rom[address::RAM_SIZE as usize];
            match ram_size_code {
                0x00 => 0,
                0x01 => 2 * 1024,
                0x02 => 8 * 1024,
                0x03 => 32 * 1024,
                0x04 => 128 * 1024,
                0x05 => 64 * 1024,
                _ => return Err(CartridgeLoadError::InvalidRamSize { ram_size_code }),
            }
        } else {
            0
        };

        let loaded_ram = match (&sav_path, mapper_features.has_battery && ram_len > 0) {
            (Some(sav_path), true) => load_sav_file(sav_path),
            _ => None,
        };

        // Tolerate sav files of the wrong length, but flag the RAM dirty so
        // the next flush rewrites the canonical size
        let mut size_mismatch = false;
        let ram = match loaded_ram {
            Some(mut loaded_ram) => {
                if loaded_ram.len() != ram_len {
                    log::warn!(
                        "Save file size {} does not match cartridge RAM size {ram_len}, adjusting",
                        loaded_ram.len()
                    );
                    loaded_ram.resize(ram_len, 0x00);
                    size_mismatch = true;
                }
                loaded_ram
            }
            None => vec![0; ram_len],
        };

        let rtc = match (&sav_path, mapper_features.has_rtc) {
            (Some(sav_path), true) => load_rtc(&sav_path.with_extension("rtc")),
            _ => None,
        };

        let ram_battery = match (mapper_features.has_battery, sav_path) {
            (true, Some(sav_path)) => {
                log::info!("Persisting external RAM to {}", sav_path.display());
                Some(RamBattery { dirty: size_mismatch, sav_path })
            }
            _ => None,
        };

        let mapper =
            Mapper::new(mapper_type, mapper_features, rtc, rom.len() as u32, ram.len() as u32);

        log::info!("Cartridge has {} bytes of external RAM", ram.len());

        Ok(Self { rom, mapper, ram, ram_battery, title })
    }

    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self, CartridgeLoadError> {
        let file_path = file_path.as_ref();
        log::info!("Loading cartridge from '{}'", file_path.display());

        let rom = fs::read(file_path).map_err(|err| CartridgeLoadError::FileRead {
            path: file_path.display().to_string(),
            source: err,
        })?;

        let sav_file = file_path.with_extension("sav");

        Self::new(rom, Some(sav_file))
    }

    /// The zero-terminated ASCII title from the cartridge header.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Read a value from the given ROM address in \[0x0000, 0x7FFF\].
    /// Addresses that fall outside the ROM image read as 0xFF.
    pub fn read_rom_address(&self, address: u16) -> u8 {
        let mapped_address = self.mapper.map_rom_address(address);
        self.rom.get(mapped_address as usize).copied().unwrap_or(0xFF)
    }

    /// Interpret a write below 0x8000 as a banking command.
    ///
    /// Disabling external RAM after it was modified flushes the sav file;
    /// a failed flush is logged and the RAM stays dirty for the next flush.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        let was_enabled = self.mapper.ram_enabled();
        self.mapper.write_rom_address(address, value);

        if was_enabled && !self.mapper.ram_enabled() {
            if let Err(err) = self.persist_external_ram() {
                log::error!("error writing cartridge RAM to sav file: {err}");
            }
        }
    }

    /// Read a value from the external RAM window. Returns 0xFF when RAM is
    /// disabled or the address maps to nothing.
    pub fn read_ram_address(&self, address: u16) -> u8 {
        match self.mapper.map_ram_address(address) {
            RamMapResult::RamAddress(mapped_address) => self
                .ram
                .get(mapped_address as usize)
                .map(|&byte| byte | self.mapper.ram_read_mask())
                .unwrap_or(0xFF),
            RamMapResult::RtcRegister => self.mapper.read_rtc_register().unwrap_or(0xFF),
            RamMapResult::None => 0xFF,
        }
    }

    /// Write a value to the external RAM window. Does nothing when RAM is
    /// disabled or the address maps to nothing.
    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        match self.mapper.map_ram_address(address) {
            RamMapResult::RamAddress(mapped_address) => {
                if let Some(ram_value) = self.ram.get_mut(mapped_address as usize) {
                    if *ram_value != value {
                        *ram_value = value;
                        if let Some(ram_battery) = &mut self.ram_battery {
                            ram_battery.mark_dirty();
                        }
                    }
                }
            }
            RamMapResult::RtcRegister => {
                self.mapper.write_rtc_register(value);
            }
            RamMapResult::None => {}
        }
    }

    /// If this cartridge has battery-backed RAM, save it to disk if it has
    /// been modified since the last successful save.
    pub fn persist_external_ram(&mut self) -> Result<(), io::Error> {
        match &mut self.ram_battery {
            Some(ram_battery) => ram_battery.persist_ram(&self.ram),
            None => Ok(()),
        }
    }

    /// Save the current real-time clock state, if this cartridge has one.
    pub fn persist_rtc(&self) -> Result<(), io::Error> {
        if let (Some(rtc), Some(battery)) = (self.mapper.get_clock(), self.ram_battery.as_ref()) {
            let rtc_bytes =
                bincode::serialize(rtc).expect("RTC value-to-bytes serialization should never fail");

            let rtc_path = battery.sav_path.with_extension("rtc");
            fs::write(rtc_path, rtc_bytes)?;
        }

        Ok(())
    }

    /// Advance the real-time clock from host wall-clock time, if this
    /// cartridge has one.
    pub fn update_rtc(&mut self) {
        self.mapper.update_rtc();
    }
}

/// The 16-bit bus: decodes addresses and dispatches to cartridge ROM/RAM,
/// VRAM, work RAM, OAM, the I/O register file, and HRAM.
pub struct AddressSpace {
    cartridge: Cartridge,
    vram: [u8; 8192],
    working_ram: [u8; 8192],
    oam: [u8; 160],
    io_registers: IoRegisters,
    hram: [u8; 127],
    ie_register: u8,
    joypad: JoypadState,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            vram: [0; 8192],
            working_ram: [0; 8192],
            oam: [0; 160],
            io_registers: IoRegisters::new(),
            hram: [0; 127],
            ie_register: 0x00,
            joypad: JoypadState::new(),
        }
    }

    /// Read the value at the given address. Every address is readable; holes
    /// in the memory map read as 0xFF.
    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.read_rom_address(address)
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize]
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                // The joypad register mixes the stored selector bits with the
                // live button latch
                if address == IoRegister::JOYP.to_address() {
                    self.joypad.register_read(self.io_registers.read_register(IoRegister::JOYP))
                } else {
                    self.io_registers.read_address(address)
                }
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// Read the value at the given address and the following address as a
    /// little-endian 16-bit value.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    /// Assign a value to the given address.
    ///
    /// Writes below 0x8000 are banking commands rather than memory writes.
    /// The timer and PPU are threaded in because a handful of I/O registers
    /// (DIV, TAC, DMA, the palettes) have side effects in those components.
    pub fn write_address_u8(
        &mut self,
        address: u16,
        value: u8,
        timer: &mut TimerCounter,
        ppu: &mut PpuState,
    ) {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom_address(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize] = value;
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize] = value;
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                match IoRegister::from_address(address) {
                    Some(IoRegister::DIV) => {
                        timer.reset_divider();
                        self.io_registers.write_address(address, value);
                    }
                    Some(IoRegister::TAC) => {
                        let old_control = self.io_registers.read_register(IoRegister::TAC);
                        self.io_registers.write_address(address, value);
                        if (old_control ^ value) & 0x03 != 0 {
                            timer.reload_countdown(value);
                        }
                    }
                    Some(IoRegister::DMA) => {
                        self.io_registers.write_address(address, value);
                        self.oam_dma_transfer(value);
                    }
                    Some(IoRegister::BGP) => {
                        self.io_registers.write_address(address, value);
                        ppu.refresh_bg_palette(value);
                    }
                    Some(IoRegister::OBP0) => {
                        self.io_registers.write_address(address, value);
                        ppu.refresh_obj_palette(0, value);
                    }
                    Some(IoRegister::OBP1) => {
                        self.io_registers.write_address(address, value);
                        ppu.refresh_obj_palette(1, value);
                    }
                    _ => {
                        self.io_registers.write_address(address, value);
                    }
                }
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Assign a 16-bit value to the given address and the following address,
    /// using little-endian byte order.
    pub fn write_address_u16(
        &mut self,
        address: u16,
        value: u16,
        timer: &mut TimerCounter,
        ppu: &mut PpuState,
    ) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb, timer, ppu);
        self.write_address_u8(address.wrapping_add(1), msb, timer, ppu);
    }

    // Copies 160 bytes from value << 8 into OAM, all at once
    fn oam_dma_transfer(&mut self, value: u8) {
        let source = u16::from(value) << 8;
        for offset in 0..self.oam.len() as u16 {
            let byte = self.read_address_u8(source + offset);
            self.oam[offset as usize] = byte;
        }
    }

    /// Replace the live joypad latch with a fresh input byte, requesting the
    /// joypad interrupt on selected falling edges.
    pub fn set_joypad_state(&mut self, state: u8) {
        self.joypad.update(state, &mut self.io_registers);
    }

    pub fn get_io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn get_io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    /// Retrieve the current value of the IE register (interrupts enabled).
    pub fn get_ie_register(&self) -> u8 {
        self.ie_register
    }

    pub fn cartridge_title(&self) -> &str {
        self.cartridge.title()
    }

    pub fn persist_cartridge_ram(&mut self) -> Result<(), io::Error> {
        self.cartridge.persist_external_ram()
    }

    pub fn persist_rtc(&self) -> Result<(), io::Error> {
        self.cartridge.persist_rtc()
    }

    pub fn update_rtc(&mut self) {
        self.cartridge.update_rtc();
    }
}
