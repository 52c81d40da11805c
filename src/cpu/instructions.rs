mod decode;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use crate::timer::TimerCounter;

pub use decode::{decode_next_instruction, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.z_flag(),
            Self::Z => cpu_registers.z_flag(),
            Self::NC => !cpu_registers.c_flag(),
            Self::C => cpu_registers.c_flag(),
        }
    }
}

/// Where an 8-bit instruction reads its operand from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOperand {
    Register(CpuRegister),
    Immediate(u8),
    Accumulator,
    HlIndirect,
    HlIndirectInc,
    HlIndirectDec,
    BcIndirect,
    DeIndirect,
    HighPageC,
    HighPageImmediate(u8),
    Direct(u16),
}

impl ReadOperand {
    fn read_value(self, cpu_registers: &mut CpuRegisters, bus: &AddressSpace) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.read_register(register),
            Self::Immediate(n) => n,
            Self::Accumulator => cpu_registers.a,
            Self::HlIndirect => bus.read_address_u8(cpu_registers.hl()),
            Self::HlIndirectInc => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_add(1));
                bus.read_address_u8(hl)
            }
            Self::HlIndirectDec => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_sub(1));
                bus.read_address_u8(hl)
            }
            Self::BcIndirect => bus.read_address_u8(cpu_registers.bc()),
            Self::DeIndirect => bus.read_address_u8(cpu_registers.de()),
            Self::HighPageC => bus.read_address_u8(0xFF00 | u16::from(cpu_registers.c)),
            Self::HighPageImmediate(n) => bus.read_address_u8(0xFF00 | u16::from(n)),
            Self::Direct(nn) => bus.read_address_u8(nn),
        }
    }

    fn extra_cycles(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::Immediate(..)
            | Self::HlIndirect
            | Self::HlIndirectInc
            | Self::HlIndirectDec
            | Self::BcIndirect
            | Self::DeIndirect
            | Self::HighPageC => 4,
            Self::HighPageImmediate(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// Where an 8-bit instruction writes its result to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperand {
    Register(CpuRegister),
    Accumulator,
    HlIndirect,
    HlIndirectInc,
    HlIndirectDec,
    BcIndirect,
    DeIndirect,
    HighPageC,
    HighPageImmediate(u8),
    Direct(u16),
}

impl WriteOperand {
    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        bus: &mut AddressSpace,
        timer: &mut TimerCounter,
        ppu: &mut PpuState,
    ) {
        match self {
            Self::Register(register) => {
                cpu_registers.set_register(register, value);
            }
            Self::Accumulator => {
                cpu_registers.a = value;
            }
            Self::HlIndirect => {
                bus.write_address_u8(cpu_registers.hl(), value, timer, ppu);
            }
            Self::HlIndirectInc => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_add(1));
                bus.write_address_u8(hl, value, timer, ppu);
            }
            Self::HlIndirectDec => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_sub(1));
                bus.write_address_u8(hl, value, timer, ppu);
            }
            Self::BcIndirect => {
                bus.write_address_u8(cpu_registers.bc(), value, timer, ppu);
            }
            Self::DeIndirect => {
                bus.write_address_u8(cpu_registers.de(), value, timer, ppu);
            }
            Self::HighPageC => {
                bus.write_address_u8(0xFF00 | u16::from(cpu_registers.c), value, timer, ppu);
            }
            Self::HighPageImmediate(n) => {
                bus.write_address_u8(0xFF00 | u16::from(n), value, timer, ppu);
            }
            Self::Direct(nn) => {
                bus.write_address_u8(nn, value, timer, ppu);
            }
        }
    }

    fn extra_cycles(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::HlIndirect
            | Self::HlIndirectInc
            | Self::HlIndirectDec
            | Self::BcIndirect
            | Self::DeIndirect
            | Self::HighPageC => 4,
            Self::HighPageImmediate(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// Operand of a read-modify-write instruction (INC/DEC, rotates, shifts,
/// SWAP, RES/SET).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmwOperand {
    Register(CpuRegister),
    Accumulator,
    HlIndirect,
}

impl RmwOperand {
    fn read_value(self, cpu_registers: &CpuRegisters, bus: &AddressSpace) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.read_register(register),
            Self::Accumulator => cpu_registers.a,
            Self::HlIndirect => bus.read_address_u8(cpu_registers.hl()),
        }
    }

    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        bus: &mut AddressSpace,
        timer: &mut TimerCounter,
        ppu: &mut PpuState,
    ) {
        match self {
            Self::Register(register) => {
                cpu_registers.set_register(register, value);
            }
            Self::Accumulator => {
                cpu_registers.a = value;
            }
            Self::HlIndirect => {
                bus.write_address_u8(cpu_registers.hl(), value, timer, ppu);
            }
        }
    }

    fn extra_cycles(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::HlIndirect => 4,
        }
    }
}

/// A decoded SM83 instruction.
///
/// The Circular rotate variants are the RLC/RRC forms; the plain ones
/// rotate through the carry flag (RL/RR). The RLCA/RLA/RRCA/RRA encodings
/// share their variants via an Accumulator operand, which also selects
/// their always-clear zero flag behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Load8(WriteOperand, ReadOperand),
    Load16Immediate(CpuRegisterPair, u16),
    LoadDirectStackPointer(u16),
    LoadStackPointerHl,
    LoadHlStackOffset(i8),
    Push(CpuRegisterPair),
    Pop(CpuRegisterPair),
    Add(ReadOperand),
    AddWithCarry(ReadOperand),
    Subtract(ReadOperand),
    SubtractWithCarry(ReadOperand),
    Compare(ReadOperand),
    Increment(RmwOperand),
    Decrement(RmwOperand),
    And(ReadOperand),
    Or(ReadOperand),
    Xor(ReadOperand),
    AddHl(CpuRegisterPair),
    Increment16(CpuRegisterPair),
    Decrement16(CpuRegisterPair),
    AddStackPointer(i8),
    RotateLeftCircular(RmwOperand),
    RotateLeft(RmwOperand),
    RotateRightCircular(RmwOperand),
    RotateRight(RmwOperand),
    ShiftLeftArithmetic(RmwOperand),
    ShiftRightArithmetic(RmwOperand),
    ShiftRightLogical(RmwOperand),
    Swap(RmwOperand),
    TestBit(u8, ReadOperand),
    ResetBit(u8, RmwOperand),
    SetBit(u8, RmwOperand),
    ComplementCarryFlag,
    SetCarryFlag,
    DecimalAdjustAccumulator,
    ComplementAccumulator,
    Jump(u16),
    JumpHl,
    JumpConditional(JumpCondition, u16),
    RelativeJump(i8),
    RelativeJumpConditional(JumpCondition, i8),
    Call(u16),
    CallConditional(JumpCondition, u16),
    Return,
    ReturnConditional(JumpCondition),
    ReturnFromInterrupt,
    Restart(u8),
    Halt,
    Stop,
    DisableInterrupts,
    EnableInterrupts,
    NoOp,
}

impl Instruction {
    /// Execute the instruction, updating CPU registers, flags, and memory.
    ///
    /// The PC register is expected to already point past this instruction;
    /// control flow instructions overwrite it.
    pub fn execute(
        self,
        bus: &mut AddressSpace,
        cpu_registers: &mut CpuRegisters,
        timer: &mut TimerCounter,
        ppu: &mut PpuState,
    ) {
        match self {
            Self::Load8(write_operand, read_operand) => {
                let value = read_operand.read_value(cpu_registers, bus);
                write_operand.write_value(value, cpu_registers, bus, timer, ppu);
            }
            Self::Load16Immediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                bus.write_address_u16(nn, cpu_registers.sp, timer, ppu);
            }
            Self::LoadStackPointerHl => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::LoadHlStackOffset(e) => {
                let (result, carry, half_carry) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.set_hl(result);
                cpu_registers.set_flags(false, false, half_carry, carry);
            }
            Self::Push(rr) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                bus.write_address_u16(
                    cpu_registers.sp,
                    cpu_registers.read_register_pair(rr),
                    timer,
                    ppu,
                );
            }
            Self::Pop(rr) => {
                cpu_registers.set_register_pair(rr, bus.read_address_u16(cpu_registers.sp));
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
            }
            Self::Add(read_operand) => {
                let (sum, carry, half_carry) =
                    add(cpu_registers.a, read_operand.read_value(cpu_registers, bus), false);
                cpu_registers.a = sum;
                cpu_registers.set_flags(sum == 0, false, half_carry, carry);
            }
            Self::AddWithCarry(read_operand) => {
                let (sum, carry, half_carry) = add(
                    cpu_registers.a,
                    read_operand.read_value(cpu_registers, bus),
                    cpu_registers.c_flag(),
                );
                cpu_registers.a = sum;
                cpu_registers.set_flags(sum == 0, false, half_carry, carry);
            }
            Self::Subtract(read_operand) => {
                let (difference, borrow, half_borrow) =
                    sub(cpu_registers.a, read_operand.read_value(cpu_registers, bus), false);
                cpu_registers.a = difference;
                cpu_registers.set_flags(difference == 0, true, half_borrow, borrow);
            }
            Self::SubtractWithCarry(read_operand) => {
                let (difference, borrow, half_borrow) = sub(
                    cpu_registers.a,
                    read_operand.read_value(cpu_registers, bus),
                    cpu_registers.c_flag(),
                );
                cpu_registers.a = difference;
                cpu_registers.set_flags(difference == 0, true, half_borrow, borrow);
            }
            Self::Compare(read_operand) => {
                let (difference, borrow, half_borrow) =
                    sub(cpu_registers.a, read_operand.read_value(cpu_registers, bus), false);
                cpu_registers.set_flags(difference == 0, true, half_borrow, borrow);
            }
            Self::Increment(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let (sum, _, half_carry) = add(value, 1, false);
                operand.write_value(sum, cpu_registers, bus, timer, ppu);
                cpu_registers.update_flags(Some(sum == 0), Some(false), Some(half_carry), None);
            }
            Self::Decrement(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let (difference, _, half_borrow) = sub(value, 1, false);
                operand.write_value(difference, cpu_registers, bus, timer, ppu);
                cpu_registers.update_flags(
                    Some(difference == 0),
                    Some(true),
                    Some(half_borrow),
                    None,
                );
            }
            Self::And(read_operand) => {
                let value = cpu_registers.a & read_operand.read_value(cpu_registers, bus);
                cpu_registers.a = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::Or(read_operand) => {
                let value = cpu_registers.a | read_operand.read_value(cpu_registers, bus);
                cpu_registers.a = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::Xor(read_operand) => {
                let value = cpu_registers.a ^ read_operand.read_value(cpu_registers, bus);
                cpu_registers.a = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::AddHl(rr) => {
                let (sum, carry, half_carry) =
                    add_u16(cpu_registers.hl(), cpu_registers.read_register_pair(rr));
                cpu_registers.set_hl(sum);
                cpu_registers.update_flags(None, Some(false), Some(half_carry), Some(carry));
            }
            Self::Increment16(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_add(1));
            }
            Self::Decrement16(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_sub(1));
            }
            Self::AddStackPointer(e) => {
                let (result, carry, half_carry) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.sp = result;
                cpu_registers.set_flags(false, false, half_carry, carry);
            }
            Self::RotateLeftCircular(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let rotated = value.rotate_left(1);
                operand.write_value(rotated, cpu_registers, bus, timer, ppu);
                let z = operand != RmwOperand::Accumulator && rotated == 0;
                cpu_registers.set_flags(z, false, false, value & 0x80 != 0);
            }
            Self::RotateLeft(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let rotated = (value << 1) | u8::from(cpu_registers.c_flag());
                operand.write_value(rotated, cpu_registers, bus, timer, ppu);
                let z = operand != RmwOperand::Accumulator && rotated == 0;
                cpu_registers.set_flags(z, false, false, value & 0x80 != 0);
            }
            Self::RotateRightCircular(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let rotated = value.rotate_right(1);
                operand.write_value(rotated, cpu_registers, bus, timer, ppu);
                let z = operand != RmwOperand::Accumulator && rotated == 0;
                cpu_registers.set_flags(z, false, false, value & 0x01 != 0);
            }
            Self::RotateRight(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let rotated = (value >> 1) | (u8::from(cpu_registers.c_flag()) << 7);
                operand.write_value(rotated, cpu_registers, bus, timer, ppu);
                let z = operand != RmwOperand::Accumulator && rotated == 0;
                cpu_registers.set_flags(z, false, false, value & 0x01 != 0);
            }
            Self::ShiftLeftArithmetic(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let shifted = value << 1;
                operand.write_value(shifted, cpu_registers, bus, timer, ppu);
                cpu_registers.set_flags(shifted == 0, false, false, value & 0x80 != 0);
            }
            Self::ShiftRightArithmetic(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let shifted = (value >> 1) | (value & 0x80);
                operand.write_value(shifted, cpu_registers, bus, timer, ppu);
                cpu_registers.set_flags(shifted == 0, false, false, value & 0x01 != 0);
            }
            Self::ShiftRightLogical(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let shifted = value >> 1;
                operand.write_value(shifted, cpu_registers, bus, timer, ppu);
                cpu_registers.set_flags(shifted == 0, false, false, value & 0x01 != 0);
            }
            Self::Swap(operand) => {
                let value = operand.read_value(cpu_registers, bus);
                let swapped = value.rotate_left(4);
                operand.write_value(swapped, cpu_registers, bus, timer, ppu);
                cpu_registers.set_flags(swapped == 0, false, false, false);
            }
            Self::TestBit(bit, read_operand) => {
                let value = read_operand.read_value(cpu_registers, bus);
                cpu_registers.update_flags(
                    Some(value & (1 << bit) == 0),
                    Some(false),
                    Some(true),
                    None,
                );
            }
            Self::ResetBit(bit, operand) => {
                let value = operand.read_value(cpu_registers, bus) & !(1 << bit);
                operand.write_value(value, cpu_registers, bus, timer, ppu);
            }
            Self::SetBit(bit, operand) => {
                let value = operand.read_value(cpu_registers, bus) | (1 << bit);
                operand.write_value(value, cpu_registers, bus, timer, ppu);
            }
            Self::ComplementCarryFlag => {
                cpu_registers.update_flags(
                    None,
                    Some(false),
                    Some(false),
                    Some(!cpu_registers.c_flag()),
                );
            }
            Self::SetCarryFlag => {
                cpu_registers.update_flags(None, Some(false), Some(false), Some(true));
            }
            Self::DecimalAdjustAccumulator => {
                decimal_adjust_accumulator(cpu_registers);
            }
            Self::ComplementAccumulator => {
                cpu_registers.a = !cpu_registers.a;
                cpu_registers.update_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHl => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpConditional(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                cpu_registers.pc = cpu_registers.pc.wrapping_add(e as u16);
            }
            Self::RelativeJumpConditional(cc, e) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add(e as u16);
                }
            }
            Self::Call(nn) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                bus.write_address_u16(cpu_registers.sp, cpu_registers.pc, timer, ppu);
                cpu_registers.pc = nn;
            }
            Self::CallConditional(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                    bus.write_address_u16(cpu_registers.sp, cpu_registers.pc, timer, ppu);
                    cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                cpu_registers.pc = bus.read_address_u16(cpu_registers.sp);
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
            }
            Self::ReturnConditional(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = bus.read_address_u16(cpu_registers.sp);
                    cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
                }
            }
            Self::ReturnFromInterrupt => {
                cpu_registers.pc = bus.read_address_u16(cpu_registers.sp);
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
                cpu_registers.ime = true;
            }
            Self::Restart(rst_address) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                bus.write_address_u16(cpu_registers.sp, cpu_registers.pc, timer, ppu);
                cpu_registers.pc = rst_address.into();
            }
            Self::Halt => {
                let pending = bus.get_ie_register()
                    & bus.get_io_registers().read_register(IoRegister::IF)
                    & 0x1F;
                if !cpu_registers.ime && pending != 0 {
                    // HALT bug: the CPU stays awake and the following byte is
                    // fetched twice
                    cpu_registers.halt_bug = true;
                } else {
                    cpu_registers.halted = true;
                }
            }
            Self::Stop => {
                // Deep power-down is not modeled; the observable effect is
                // the divider reset
                timer.reset_divider();
                bus.get_io_registers_mut().privileged_set_div(0x00);
            }
            Self::DisableInterrupts => {
                cpu_registers.ime = false;
            }
            Self::EnableInterrupts => {
                cpu_registers.ime = true;
                cpu_registers.ime_pending = true;
                // The only instruction that must not clear ime_pending below
                return;
            }
            Self::NoOp => {}
        }

        cpu_registers.ime_pending = false;
    }

    /// The number of master-clock cycles this instruction consumes.
    ///
    /// Conditional control flow costs more when the branch is taken, so the
    /// current flags are needed to answer.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::RotateLeftCircular(RmwOperand::Accumulator)
            | Self::RotateLeft(RmwOperand::Accumulator)
            | Self::RotateRightCircular(RmwOperand::Accumulator)
            | Self::RotateRight(RmwOperand::Accumulator)
            | Self::SetCarryFlag
            | Self::ComplementCarryFlag
            | Self::NoOp
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::JumpHl
            | Self::Halt
            | Self::Stop => 4,
            Self::LoadStackPointerHl
            | Self::AddHl(..)
            | Self::Increment16(..)
            | Self::Decrement16(..) => 8,
            Self::Load16Immediate(..)
            | Self::Pop(..)
            | Self::LoadHlStackOffset(..)
            | Self::RelativeJump(..) => 12,
            Self::Push(..)
            | Self::AddStackPointer(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterrupt
            | Self::Restart(..) => 16,
            Self::LoadDirectStackPointer(..) => 20,
            Self::Call(..) => 24,
            Self::JumpConditional(cc, ..) => {
                if cc.check(cpu_registers) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJumpConditional(cc, ..) => {
                if cc.check(cpu_registers) {
                    12
                } else {
                    8
                }
            }
            Self::CallConditional(cc, ..) => {
                if cc.check(cpu_registers) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnConditional(cc) => {
                if cc.check(cpu_registers) {
                    20
                } else {
                    8
                }
            }
            Self::Load8(write_operand, read_operand) => {
                4 + read_operand.extra_cycles() + write_operand.extra_cycles()
            }
            Self::Add(read_operand)
            | Self::AddWithCarry(read_operand)
            | Self::Subtract(read_operand)
            | Self::SubtractWithCarry(read_operand)
            | Self::And(read_operand)
            | Self::Or(read_operand)
            | Self::Xor(read_operand)
            | Self::Compare(read_operand) => 4 + read_operand.extra_cycles(),
            Self::TestBit(_, read_operand) => 8 + read_operand.extra_cycles(),
            Self::Increment(operand) | Self::Decrement(operand) => 4 + 2 * operand.extra_cycles(),
            Self::RotateLeftCircular(operand)
            | Self::RotateLeft(operand)
            | Self::RotateRightCircular(operand)
            | Self::RotateRight(operand)
            | Self::ShiftLeftArithmetic(operand)
            | Self::ShiftRightArithmetic(operand)
            | Self::ShiftRightLogical(operand)
            | Self::Swap(operand)
            | Self::ResetBit(_, operand)
            | Self::SetBit(_, operand) => 8 + 2 * operand.extra_cycles(),
        }
    }
}

fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let sum = u16::from(l_value) + u16::from(r_value) + u16::from(carry);
    let half_carry = (l_value & 0x0F) + (r_value & 0x0F) + carry > 0x0F;

    (sum as u8, sum > 0xFF, half_carry)
}

fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let difference = l_value.wrapping_sub(r_value).wrapping_sub(carry);
    let borrow = u16::from(l_value) < u16::from(r_value) + u16::from(carry);
    let half_borrow = l_value & 0x0F < (r_value & 0x0F) + carry;

    (difference, borrow, half_borrow)
}

fn add_u16(l_value: u16, r_value: u16) -> (u16, bool, bool) {
    let (sum, carry) = l_value.overflowing_add(r_value);
    let half_carry = (l_value & 0x0FFF) + (r_value & 0x0FFF) > 0x0FFF;

    (sum, carry, half_carry)
}

// ADD SP,e and LD HL,SP+e sign-extend the offset for the result, but the
// flags come from unsigned 8-bit arithmetic on the low byte of SP
fn add_sp_offset(sp: u16, offset: i8) -> (u16, bool, bool) {
    let unsigned = offset as u8;
    let half_carry = (sp & 0x000F) + u16::from(unsigned & 0x0F) > 0x000F;
    let carry = (sp & 0x00FF) + u16::from(unsigned) > 0x00FF;

    (sp.wrapping_add(offset as u16), carry, half_carry)
}

fn decimal_adjust_accumulator(cpu_registers: &mut CpuRegisters) {
    if cpu_registers.n_flag() {
        // Previous op was a subtraction
        let mut value = cpu_registers.a;
        if cpu_registers.h_flag() {
            value = value.wrapping_sub(0x06);
        }
        if cpu_registers.c_flag() {
            value = value.wrapping_sub(0x60);
        }

        cpu_registers.a = value;
        cpu_registers.update_flags(Some(value == 0), None, Some(false), None);
    } else {
        // Previous op was an addition
        let mut value = cpu_registers.a;
        let mut carry = false;
        if value > 0x99 || cpu_registers.c_flag() {
            value = value.wrapping_add(0x60);
            carry = true;
        }
        if value & 0x0F >= 0x0A || cpu_registers.h_flag() {
            value = value.wrapping_add(0x06);
        }

        cpu_registers.a = value;
        cpu_registers.update_flags(Some(value == 0), None, Some(false), Some(carry));
    }
}
