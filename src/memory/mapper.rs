mod rtc;

use crate::memory::address;
use std::fmt::Formatter;
use std::time::SystemTime;

pub(crate) use rtc::RealTimeClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapperType {
    None,
    Mbc1,
    Mbc2,
    Mbc3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapperFeatures {
    pub(crate) has_ram: bool,
    pub(crate) has_battery: bool,
    pub(crate) has_rtc: bool,
}

impl std::fmt::Display for MapperFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "has_ram={}, has_battery={}, has_rtc={}",
            self.has_ram, self.has_battery, self.has_rtc
        )
    }
}

/// Decode the cartridge-type byte at header offset 0x0147.
///
/// MBC2 carts report no RAM in the header but always carry the internal
/// 512x4-bit array, so they are flagged has_ram here.
pub(crate) fn parse_byte(mapper_byte: u8) -> Option<(MapperType, MapperFeatures)> {
    let (mapper_type, has_ram, has_battery) = match mapper_byte {
        0x00 => (MapperType::None, false, false),
        0x01 => (MapperType::Mbc1, false, false),
        0x02 => (MapperType::Mbc1, true, false),
        0x03 => (MapperType::Mbc1, true, true),
        0x05 => (MapperType::Mbc2, true, false),
        0x06 => (MapperType::Mbc2, true, true),
        0x0F => (MapperType::Mbc3, false, true),
        0x10 | 0x13 => (MapperType::Mbc3, true, true),
        0x11 => (MapperType::Mbc3, false, false),
        0x12 => (MapperType::Mbc3, true, false),
        _ => return None,
    };

    // Only 0x0F and 0x10 carry the timer chip
    let has_rtc = mapper_byte == 0x0F || mapper_byte == 0x10;

    Some((mapper_type, MapperFeatures { has_ram, has_battery, has_rtc }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RamMapResult {
    // Relative address into the full external RAM array
    RamAddress(u32),
    // The address is currently mapped to an MBC3 clock register
    RtcRegister,
    // RAM access is disabled or the address maps to nothing
    None,
}

#[derive(Debug, Clone)]
pub(crate) enum Mapper {
    None,
    Mbc1 {
        rom_bank_count: u16,
        ram_bank_count: u8,
        ram_enabled: bool,
        rom_bank: u8,
        secondary_bank: u8,
        ram_mode: bool,
    },
    Mbc2 {
        rom_bank_count: u16,
        ram_enabled: bool,
        rom_bank: u8,
    },
    Mbc3 {
        rom_bank_count: u16,
        ram_bank_count: u8,
        ram_enabled: bool,
        rom_bank: u8,
        ram_bank: u8,
        rtc_register: Option<u8>,
        real_time_clock: Option<RealTimeClock>,
    },
}

impl Mapper {
    pub(crate) fn new(
        mapper_type: MapperType,
        mapper_features: MapperFeatures,
        rtc: Option<RealTimeClock>,
        rom_size: u32,
        ram_size: u32,
    ) -> Self {
        let rom_bank_count = (rom_size >> 14).max(1) as u16;
        let ram_bank_count = (ram_size >> 13) as u8;

        log::debug!("ROM bank count {rom_bank_count} for size {rom_size}");
        log::debug!("RAM bank count {ram_bank_count} for size {ram_size}");

        match mapper_type {
            MapperType::None => Self::None,
            MapperType::Mbc1 => Self::Mbc1 {
                rom_bank_count,
                ram_bank_count,
                ram_enabled: false,
                rom_bank: 0x01,
                secondary_bank: 0x00,
                ram_mode: false,
            },
            MapperType::Mbc2 => Self::Mbc2 { rom_bank_count, ram_enabled: false, rom_bank: 0x01 },
            MapperType::Mbc3 => {
                let real_time_clock = mapper_features.has_rtc.then(|| match rtc {
                    Some(mut rtc) => {
                        rtc.update(SystemTime::now());
                        rtc
                    }
                    None => RealTimeClock::new(SystemTime::now()),
                });
                Self::Mbc3 {
                    rom_bank_count,
                    ram_bank_count,
                    ram_enabled: false,
                    rom_bank: 0x01,
                    ram_bank: 0x00,
                    rtc_register: None,
                    real_time_clock,
                }
            }
        }
    }

    /// Map a CPU address in \[0x0000, 0x7FFF\] to an offset into the ROM
    /// image. The fixed window always maps bank 0; the switchable window maps
    /// the selected bank modulo the cartridge's actual bank count.
    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        debug_assert!(address <= address::ROM_END);

        if address < 0x4000 {
            return u32::from(address);
        }

        let bank = match *self {
            Self::None => 1,
            Self::Mbc1 { rom_bank_count, rom_bank, secondary_bank, ram_mode, .. } => {
                let bank = if ram_mode {
                    u16::from(rom_bank)
                } else {
                    u16::from(secondary_bank) << 5 | u16::from(rom_bank)
                };
                bank % rom_bank_count
            }
            Self::Mbc2 { rom_bank_count, rom_bank, .. }
            | Self::Mbc3 { rom_bank_count, rom_bank, .. } => {
                u16::from(rom_bank) % rom_bank_count
            }
        };

        u32::from(address - 0x4000) + (u32::from(bank) << 14)
    }

    // ROM writes never reach the ROM itself; they set banking registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1 { ram_enabled, rom_bank, secondary_bank, ram_mode, .. } => match address {
                0x0000..=0x1FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                    log::trace!("MBC1 RAM enable <- {value:02X} (enabled={ram_enabled})");
                }
                0x2000..=0x3FFF => {
                    // Bank 0 is never selectable through the low bits
                    *rom_bank = (value & 0x1F).max(0x01);
                    log::trace!("MBC1 ROM bank <- {rom_bank:02X}");
                }
                0x4000..=0x5FFF => {
                    *secondary_bank = value & 0x03;
                    log::trace!("MBC1 secondary bank <- {secondary_bank:02X}");
                }
                _ => {
                    *ram_mode = value & 0x01 != 0;
                    log::trace!("MBC1 banking mode <- {value:02X} (ram_mode={ram_mode})");
                }
            },
            Self::Mbc2 { ram_enabled, rom_bank, .. } => match address {
                // Bit 8 of the address picks which register a write lands in
                0x0000..=0x1FFF if address & 0x0100 == 0 => {
                    *ram_enabled = value & 0x0F == 0x0A;
                    log::trace!("MBC2 RAM enable <- {value:02X} (enabled={ram_enabled})");
                }
                0x2000..=0x3FFF if address & 0x0100 != 0 => {
                    *rom_bank = (value & 0x0F).max(0x01);
                    log::trace!("MBC2 ROM bank <- {rom_bank:02X}");
                }
                _ => {}
            },
            Self::Mbc3 {
                ram_enabled, rom_bank, ram_bank, rtc_register, real_time_clock, ..
            } => match address {
                0x0000..=0x1FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                    if !*ram_enabled {
                        *rtc_register = None;
                    }
                    log::trace!("MBC3 RAM/RTC enable <- {value:02X} (enabled={ram_enabled})");
                }
                0x2000..=0x3FFF => {
                    *rom_bank = (value & 0x7F).max(0x01);
                    log::trace!("MBC3 ROM bank <- {rom_bank:02X}");
                }
                0x4000..=0x5FFF => match value {
                    0x00..=0x03 => {
                        *ram_bank = value;
                        *rtc_register = None;
                        log::trace!("MBC3 RAM bank <- {value:02X}");
                    }
                    0x08..=0x0C => {
                        *rtc_register = Some(value - 0x08);
                        log::trace!("MBC3 RTC register <- {value:02X}");
                    }
                    _ => {}
                },
                _ => {
                    if let Some(real_time_clock) = real_time_clock {
                        real_time_clock.process_latch_write(value);
                    }
                }
            },
        }
    }

    /// Map a CPU address in \[0xA000, 0xBFFF\] to external RAM or an RTC
    /// register, honoring the RAM-enable latch.
    pub(crate) fn map_ram_address(&self, address: u16) -> RamMapResult {
        let relative_address = address - address::EXTERNAL_RAM_START;

        match *self {
            Self::None => RamMapResult::RamAddress(u32::from(relative_address)),
            Self::Mbc1 { ram_bank_count, ram_enabled, secondary_bank, ram_mode, .. } => {
                if !ram_enabled {
                    return RamMapResult::None;
                }

                let bank = if ram_mode && ram_bank_count > 0 {
                    secondary_bank % ram_bank_count
                } else {
                    0
                };
                RamMapResult::RamAddress(u32::from(relative_address) + (u32::from(bank) << 13))
            }
            Self::Mbc2 { ram_enabled, .. } => {
                if ram_enabled {
                    // The 512-nibble array echoes through the whole window
                    RamMapResult::RamAddress(u32::from(relative_address & 0x01FF))
                } else {
                    RamMapResult::None
                }
            }
            Self::Mbc3 { ram_bank_count, ram_enabled, ram_bank, rtc_register, .. } => {
                if !ram_enabled {
                    return RamMapResult::None;
                }

                if rtc_register.is_some() {
                    return RamMapResult::RtcRegister;
                }

                let bank = if ram_bank_count > 0 { ram_bank % ram_bank_count } else { 0 };
                RamMapResult::RamAddress(u32::from(relative_address) + (u32::from(bank) << 13))
            }
        }
    }

    pub(crate) fn read_rtc_register(&self) -> Option<u8> {
        match self {
            Self::Mbc3 {
                rtc_register: Some(register),
                real_time_clock: Some(real_time_clock),
                ..
            } => real_time_clock.read_register(*register),
            _ => None,
        }
    }

    pub(crate) fn write_rtc_register(&mut self, value: u8) {
        if let Self::Mbc3 {
            rtc_register: Some(register),
            real_time_clock: Some(real_time_clock),
            ..
        } = self
        {
            real_time_clock.write_register(*register, value);
        }
    }

    /// Whether software currently has the external RAM window enabled.
    pub(crate) fn ram_enabled(&self) -> bool {
        match *self {
            Self::None => true,
            Self::Mbc1 { ram_enabled, .. }
            | Self::Mbc2 { ram_enabled, .. }
            | Self::Mbc3 { ram_enabled, .. } => ram_enabled,
        }
    }

    /// Bits forced high on every external RAM read. MBC2 only stores the low
    /// nibble of each byte.
    pub(crate) fn ram_read_mask(&self) -> u8 {
        match self {
            Self::Mbc2 { .. } => 0xF0,
            _ => 0x00,
        }
    }

    pub(crate) fn update_rtc(&mut self) {
        let Self::Mbc3 { real_time_clock: Some(real_time_clock), .. } = self else {
            return;
        };
        real_time_clock.update(SystemTime::now());
    }

    pub(crate) fn get_clock(&self) -> Option<&RealTimeClock> {
        match self {
            Self::Mbc3 { real_time_clock, .. } => real_time_clock.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper_features() -> MapperFeatures {
        MapperFeatures { has_ram: false, has_battery: false, has_rtc: false }
    }

    #[test]
    fn mbc1_rom_banking_small_cart() {
        // 256KB ROM = 16 banks
        let mut mapper = Mapper::new(MapperType::Mbc1, mapper_features(), None, 1 << 18, 0);

        assert_eq!(0x0000, mapper.map_rom_address(0x0000));
        assert_eq!(0x3FFF, mapper.map_rom_address(0x3FFF));
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));
        assert_eq!(0x7FFF, mapper.map_rom_address(0x7FFF));

        mapper.write_rom_address(0x2000, 0x06);

        assert_eq!(0x0000, mapper.map_rom_address(0x0000));
        assert_eq!(0x18000, mapper.map_rom_address(0x4000));
        assert_eq!(0x18D2C, mapper.map_rom_address(0x4D2C));
        assert_eq!(0x1BFFF, mapper.map_rom_address(0x7FFF));

        // Bank numbers past the end of the cart wrap around
        mapper.write_rom_address(0x2000, 0x16);

        assert_eq!(0x18000, mapper.map_rom_address(0x4000));
        assert_eq!(0x1BFFF, mapper.map_rom_address(0x7FFF));
    }

    #[test]
    fn mbc1_rom_banking_large_cart() {
        // 2MB ROM = 128 banks; the secondary register supplies bits 5-6
        let mut mapper = Mapper::new(MapperType::Mbc1, mapper_features(), None, 1 << 21, 0);

        mapper.write_rom_address(0x2000, 0x05);
        mapper.write_rom_address(0x4000, 0x02);

        assert_eq!(0x0000, mapper.map_rom_address(0x0000));
        assert_eq!((0x45 << 14) | 0x1234, mapper.map_rom_address(0x5234));

        // Selecting bank 0 through the low bits promotes to bank 1
        mapper.write_rom_address(0x2000, 0x00);
        assert_eq!((0x41 << 14) | 0x0000, mapper.map_rom_address(0x4000));

        // In RAM-expansion mode the secondary register no longer reaches ROM
        mapper.write_rom_address(0x6000, 0x01);
        assert_eq!((0x01 << 14) | 0x0000, mapper.map_rom_address(0x4000));
    }

    #[test]
    fn mbc1_ram_banking() {
        // 256KB ROM, 32KB RAM
        let mut mapper = Mapper::new(MapperType::Mbc1, mapper_features(), None, 1 << 18, 1 << 15);

        assert_eq!(RamMapResult::None, mapper.map_ram_address(0xA000));

        mapper.write_rom_address(0x0000, 0x0A);
        assert_eq!(RamMapResult::RamAddress(0x0000), mapper.map_ram_address(0xA000));
        assert_eq!(RamMapResult::RamAddress(0x1234), mapper.map_ram_address(0xB234));

        // RAM bank select only applies in RAM-expansion mode
        mapper.write_rom_address(0x4000, 0x02);
        assert_eq!(RamMapResult::RamAddress(0x0000), mapper.map_ram_address(0xA000));

        mapper.write_rom_address(0x6000, 0x01);
        assert_eq!(RamMapResult::RamAddress(0x4000), mapper.map_ram_address(0xA000));

        // Non-0x0A values disable the window
        mapper.write_rom_address(0x0000, 0x0B);
        assert_eq!(RamMapResult::None, mapper.map_ram_address(0xA000));
    }

    #[test]
    fn mbc2_register_select_uses_address_bit_8() {
        let mut mapper = Mapper::new(MapperType::Mbc2, mapper_features(), None, 1 << 18, 0);

        // Bit 8 set: the write goes nowhere near the RAM enable
        mapper.write_rom_address(0x0100, 0x0A);
        assert!(!mapper.ram_enabled());

        mapper.write_rom_address(0x0000, 0x0A);
        assert!(mapper.ram_enabled());

        // Bit 8 clear: ROM bank writes are ignored
        mapper.write_rom_address(0x2000, 0x07);
        assert_eq!(0x4000, mapper.map_rom_address(0x4000));

        mapper.write_rom_address(0x2100, 0x07);
        assert_eq!(0x07 << 14, mapper.map_rom_address(0x4000));

        mapper.write_rom_address(0x2100, 0x00);
        assert_eq!(0x01 << 14, mapper.map_rom_address(0x4000));
    }

    #[test]
    fn mbc2_ram_echoes_every_512_bytes() {
        let mut mapper = Mapper::new(MapperType::Mbc2, mapper_features(), None, 1 << 16, 0);
        mapper.write_rom_address(0x0000, 0x0A);

        assert_eq!(RamMapResult::RamAddress(0x0012), mapper.map_ram_address(0xA012));
        assert_eq!(RamMapResult::RamAddress(0x0012), mapper.map_ram_address(0xA212));
        assert_eq!(0xF0, mapper.ram_read_mask());
    }

    #[test]
    fn mbc3_bank_and_rtc_select() {
        let features = MapperFeatures { has_ram: true, has_battery: true, has_rtc: true };
        let mut mapper = Mapper::new(MapperType::Mbc3, features, None, 1 << 21, 1 << 15);

        mapper.write_rom_address(0x0000, 0x0A);
        mapper.write_rom_address(0x4000, 0x02);
        assert_eq!(RamMapResult::RamAddress(0x4000), mapper.map_ram_address(0xA000));

        mapper.write_rom_address(0x4000, 0x08);
        assert_eq!(RamMapResult::RtcRegister, mapper.map_ram_address(0xA000));

        // Selecting a RAM bank again deselects the clock
        mapper.write_rom_address(0x4000, 0x01);
        assert_eq!(RamMapResult::RamAddress(0x2000), mapper.map_ram_address(0xA000));

        // Disabling the window also deselects the clock
        mapper.write_rom_address(0x4000, 0x0A);
        mapper.write_rom_address(0x0000, 0x00);
        assert_eq!(RamMapResult::None, mapper.map_ram_address(0xA000));
        mapper.write_rom_address(0x0000, 0x0A);
        assert_eq!(RamMapResult::RamAddress(0x2000), mapper.map_ram_address(0xA000));
    }

    #[test]
    fn mbc3_rom_banking_uses_seven_bits() {
        let mut mapper = Mapper::new(MapperType::Mbc3, mapper_features(), None, 1 << 22, 0);

        mapper.write_rom_address(0x2000, 0xFF);
        assert_eq!(u32::from(0x7Fu16) << 14, mapper.map_rom_address(0x4000));

        mapper.write_rom_address(0x2000, 0x00);
        assert_eq!(1 << 14, mapper.map_rom_address(0x4000));
    }

    #[test]
    fn mbc3_rtc_read_write_round_trip() {
        let features = MapperFeatures { has_ram: true, has_battery: true, has_rtc: true };
        let mut mapper = Mapper::new(MapperType::Mbc3, features, None, 1 << 18, 1 << 13);

        mapper.write_rom_address(0x0000, 0x0A);
        mapper.write_rom_address(0x4000, 0x09);

        mapper.write_rtc_register(0x2A);
        assert_eq!(Some(0x2A), mapper.read_rtc_register());
    }
}
