use crate::cpu::instructions::{
    Instruction, JumpCondition, ReadOperand, RmwOperand, WriteOperand,
};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown opcode {opcode:02X} at PC={pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}

/// Decode the instruction at the given PC.
///
/// Returns the decoded instruction together with the address of the next
/// instruction. When `halt_bug` is set the opcode fetch does not advance PC,
/// so the byte after HALT is decoded once as an opcode and then seen again.
pub fn decode_next_instruction(
    bus: &AddressSpace,
    mut pc: u16,
    halt_bug: bool,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = bus.read_address_u8(pc);

    if halt_bug {
        pc = pc.wrapping_sub(1);
    }

    let instruction = match opcode {
        0x00 => return Ok((Instruction::NoOp, pc.wrapping_add(1))),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let rr = register_pair_for_other_ops(opcode);
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((Instruction::Load16Immediate(rr, nn), pc.wrapping_add(3)));
        }
        0x02 => Instruction::Load8(WriteOperand::BcIndirect, ReadOperand::Accumulator),
        0x03 | 0x13 | 0x23 | 0x33 => Instruction::Increment16(register_pair_for_other_ops(opcode)),
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            Instruction::Increment(rmw_operand_from_mid_bits(opcode))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            Instruction::Decrement(rmw_operand_from_mid_bits(opcode))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let write_operand = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteOperand::HlIndirect, WriteOperand::Register);
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((
                Instruction::Load8(write_operand, ReadOperand::Immediate(n)),
                pc.wrapping_add(2),
            ));
        }
        0x07 => Instruction::RotateLeftCircular(RmwOperand::Accumulator),
        0x08 => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((Instruction::LoadDirectStackPointer(nn), pc.wrapping_add(3)));
        }
        0x09 | 0x19 | 0x29 | 0x39 => Instruction::AddHl(register_pair_for_other_ops(opcode)),
        0x0A => Instruction::Load8(WriteOperand::Accumulator, ReadOperand::BcIndirect),
        0x0B | 0x1B | 0x2B | 0x3B => Instruction::Decrement16(register_pair_for_other_ops(opcode)),
        0x0F => Instruction::RotateRightCircular(RmwOperand::Accumulator),
        // STOP is encoded as two bytes
        0x10 => return Ok((Instruction::Stop, pc.wrapping_add(2))),
        0x12 => Instruction::Load8(WriteOperand::DeIndirect, ReadOperand::Accumulator),
        0x17 => Instruction::RotateLeft(RmwOperand::Accumulator),
        0x18 => {
            let e = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            return Ok((Instruction::RelativeJump(e), pc.wrapping_add(2)));
        }
        0x1A => Instruction::Load8(WriteOperand::Accumulator, ReadOperand::DeIndirect),
        0x1F => Instruction::RotateRight(RmwOperand::Accumulator),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let cc = parse_jump_condition(opcode);
            let e = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            return Ok((Instruction::RelativeJumpConditional(cc, e), pc.wrapping_add(2)));
        }
        0x22 => Instruction::Load8(WriteOperand::HlIndirectInc, ReadOperand::Accumulator),
        0x27 => Instruction::DecimalAdjustAccumulator,
        0x2A => Instruction::Load8(WriteOperand::Accumulator, ReadOperand::HlIndirectInc),
        0x2F => Instruction::ComplementAccumulator,
        0x32 => Instruction::Load8(WriteOperand::HlIndirectDec, ReadOperand::Accumulator),
        0x37 => Instruction::SetCarryFlag,
        0x3A => Instruction::Load8(WriteOperand::Accumulator, ReadOperand::HlIndirectDec),
        0x3F => Instruction::ComplementCarryFlag,
        0x76 => Instruction::Halt,
        opcode @ 0x40..=0x7F => {
            let write_operand = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteOperand::HlIndirect, WriteOperand::Register);
            let read_operand = read_operand_from_low_bits(opcode);
            Instruction::Load8(write_operand, read_operand)
        }
        opcode @ 0x80..=0x87 => Instruction::Add(read_operand_from_low_bits(opcode)),
        opcode @ 0x88..=0x8F => Instruction::AddWithCarry(read_operand_from_low_bits(opcode)),
        opcode @ 0x90..=0x97 => Instruction::Subtract(read_operand_from_low_bits(opcode)),
        opcode @ 0x98..=0x9F => Instruction::SubtractWithCarry(read_operand_from_low_bits(opcode)),
        opcode @ 0xA0..=0xA7 => Instruction::And(read_operand_from_low_bits(opcode)),
        opcode @ 0xA8..=0xAF => Instruction::Xor(read_operand_from_low_bits(opcode)),
        opcode @ 0xB0..=0xB7 => Instruction::Or(read_operand_from_low_bits(opcode)),
        opcode @ 0xB8..=0xBF => Instruction::Compare(read_operand_from_low_bits(opcode)),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => Instruction::ReturnConditional(parse_jump_condition(opcode)),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => Instruction::Pop(register_pair_for_push_pop(opcode)),
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let cc = parse_jump_condition(opcode);
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((Instruction::JumpConditional(cc, nn), pc.wrapping_add(3)));
        }
        0xC3 => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((Instruction::Jump(nn), pc.wrapping_add(3)));
        }
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let cc = parse_jump_condition(opcode);
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((Instruction::CallConditional(cc, nn), pc.wrapping_add(3)));
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => Instruction::Push(register_pair_for_push_pop(opcode)),
        0xC6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::Add(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            Instruction::Restart(opcode & 0x38)
        }
        0xC9 => Instruction::Return,
        0xCB => return Ok(decode_cb_prefixed_opcode(bus, pc)),
        0xCD => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((Instruction::Call(nn), pc.wrapping_add(3)));
        }
        0xCE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::AddWithCarry(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        0xD6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::Subtract(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        0xD9 => Instruction::ReturnFromInterrupt,
        0xDE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((
                Instruction::SubtractWithCarry(ReadOperand::Immediate(n)),
                pc.wrapping_add(2),
            ));
        }
        0xE0 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((
                Instruction::Load8(WriteOperand::HighPageImmediate(n), ReadOperand::Accumulator),
                pc.wrapping_add(2),
            ));
        }
        0xE2 => Instruction::Load8(WriteOperand::HighPageC, ReadOperand::Accumulator),
        0xE6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::And(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        0xE8 => {
            let e = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            return Ok((Instruction::AddStackPointer(e), pc.wrapping_add(2)));
        }
        0xE9 => Instruction::JumpHl,
        0xEA => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((
                Instruction::Load8(WriteOperand::Direct(nn), ReadOperand::Accumulator),
                pc.wrapping_add(3),
            ));
        }
        0xEE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::Xor(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        0xF0 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((
                Instruction::Load8(WriteOperand::Accumulator, ReadOperand::HighPageImmediate(n)),
                pc.wrapping_add(2),
            ));
        }
        0xF2 => Instruction::Load8(WriteOperand::Accumulator, ReadOperand::HighPageC),
        0xF3 => Instruction::DisableInterrupts,
        0xF6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::Or(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        0xF8 => {
            let e = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            return Ok((Instruction::LoadHlStackOffset(e), pc.wrapping_add(2)));
        }
        0xF9 => Instruction::LoadStackPointerHl,
        0xFA => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            return Ok((
                Instruction::Load8(WriteOperand::Accumulator, ReadOperand::Direct(nn)),
                pc.wrapping_add(3),
            ));
        }
        0xFB => Instruction::EnableInterrupts,
        0xFE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            return Ok((Instruction::Compare(ReadOperand::Immediate(n)), pc.wrapping_add(2)));
        }
        opcode => return Err(ParseError::InvalidOpcode { opcode, pc }),
    };

    Ok((instruction, pc.wrapping_add(1)))
}

fn decode_cb_prefixed_opcode(bus: &AddressSpace, pc: u16) -> (Instruction, u16) {
    let opcode = bus.read_address_u8(pc.wrapping_add(1));
    let operand = rmw_operand_from_low_bits(opcode);

    let instruction = match opcode {
        0x00..=0x07 => Instruction::RotateLeftCircular(operand),
        0x08..=0x0F => Instruction::RotateRightCircular(operand),
        0x10..=0x17 => Instruction::RotateLeft(operand),
        0x18..=0x1F => Instruction::RotateRight(operand),
        0x20..=0x27 => Instruction::ShiftLeftArithmetic(operand),
        0x28..=0x2F => Instruction::ShiftRightArithmetic(operand),
        0x30..=0x37 => Instruction::Swap(operand),
        0x38..=0x3F => Instruction::ShiftRightLogical(operand),
        opcode @ 0x40..=0x7F => {
            let bit = (opcode & 0x38) >> 3;
            Instruction::TestBit(bit, read_operand_from_low_bits(opcode))
        }
        opcode @ 0x80..=0xBF => {
            let bit = (opcode & 0x38) >> 3;
            Instruction::ResetBit(bit, operand)
        }
        opcode @ 0xC0..=0xFF => {
            let bit = (opcode & 0x38) >> 3;
            Instruction::SetBit(bit, operand)
        }
    };

    (instruction, pc.wrapping_add(2))
}

fn read_operand_from_low_bits(opcode: u8) -> ReadOperand {
    CpuRegister::from_low_opcode_bits(opcode).map_or(ReadOperand::HlIndirect, ReadOperand::Register)
}

fn rmw_operand_from_low_bits(opcode: u8) -> RmwOperand {
    CpuRegister::from_low_opcode_bits(opcode).map_or(RmwOperand::HlIndirect, RmwOperand::Register)
}

fn rmw_operand_from_mid_bits(opcode: u8) -> RmwOperand {
    CpuRegister::from_mid_opcode_bits(opcode).map_or(RmwOperand::HlIndirect, RmwOperand::Register)
}

fn register_pair_for_other_ops(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::SP,
    }
}

fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::AF,
    }
}

fn parse_jump_condition(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        _ => JumpCondition::C,
    }
}
