use crate::cpu::instructions::{Instruction as I, JumpCondition, ReadOperand, RmwOperand, WriteOperand};
use crate::cpu::{CpuRegister, CpuRegisterPair, CpuRegisters};

#[test]
fn fixed_cycle_counts() {
    let cr = CpuRegisters::new();

    // 8-bit loads
    assert_eq!(
        4,
        I::Load8(WriteOperand::Register(CpuRegister::A), ReadOperand::Register(CpuRegister::B))
            .cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::Register(CpuRegister::A), ReadOperand::Immediate(0))
            .cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::Register(CpuRegister::A), ReadOperand::HlIndirect)
            .cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::HlIndirect, ReadOperand::Register(CpuRegister::A))
            .cycles_required(&cr)
    );
    assert_eq!(
        12,
        I::Load8(WriteOperand::HlIndirect, ReadOperand::Immediate(0)).cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::Accumulator, ReadOperand::BcIndirect).cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::DeIndirect, ReadOperand::Accumulator).cycles_required(&cr)
    );
    assert_eq!(
        16,
        I::Load8(WriteOperand::Accumulator, ReadOperand::Direct(0)).cycles_required(&cr)
    );
    assert_eq!(
        16,
        I::Load8(WriteOperand::Direct(0), ReadOperand::Accumulator).cycles_required(&cr)
    );
    assert_eq!(
        12,
        I::Load8(WriteOperand::Accumulator, ReadOperand::HighPageImmediate(0))
            .cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::HighPageC, ReadOperand::Accumulator).cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::Accumulator, ReadOperand::HlIndirectInc).cycles_required(&cr)
    );
    assert_eq!(
        8,
        I::Load8(WriteOperand::HlIndirectDec, ReadOperand::Accumulator).cycles_required(&cr)
    );

    // 16-bit loads
    assert_eq!(12, I::Load16Immediate(CpuRegisterPair::BC, 0).cycles_required(&cr));
    assert_eq!(20, I::LoadDirectStackPointer(0).cycles_required(&cr));
    assert_eq!(8, I::LoadStackPointerHl.cycles_required(&cr));
    assert_eq!(12, I::LoadHlStackOffset(0).cycles_required(&cr));
    assert_eq!(16, I::Push(CpuRegisterPair::BC).cycles_required(&cr));
    assert_eq!(12, I::Pop(CpuRegisterPair::BC).cycles_required(&cr));

    // 8-bit arithmetic
    assert_eq!(4, I::Add(ReadOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(8, I::Add(ReadOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(8, I::Add(ReadOperand::Immediate(0)).cycles_required(&cr));
    assert_eq!(4, I::AddWithCarry(ReadOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(8, I::Subtract(ReadOperand::Immediate(0)).cycles_required(&cr));
    assert_eq!(8, I::SubtractWithCarry(ReadOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(8, I::Compare(ReadOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(4, I::Increment(RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(12, I::Increment(RmwOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(4, I::Decrement(RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(12, I::Decrement(RmwOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(4, I::And(ReadOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(8, I::Or(ReadOperand::Immediate(0)).cycles_required(&cr));
    assert_eq!(8, I::Xor(ReadOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(4, I::ComplementCarryFlag.cycles_required(&cr));
    assert_eq!(4, I::SetCarryFlag.cycles_required(&cr));
    assert_eq!(4, I::DecimalAdjustAccumulator.cycles_required(&cr));
    assert_eq!(4, I::ComplementAccumulator.cycles_required(&cr));

    // 16-bit arithmetic
    assert_eq!(8, I::AddHl(CpuRegisterPair::BC).cycles_required(&cr));
    assert_eq!(8, I::Increment16(CpuRegisterPair::BC).cycles_required(&cr));
    assert_eq!(8, I::Decrement16(CpuRegisterPair::SP).cycles_required(&cr));
    assert_eq!(16, I::AddStackPointer(0).cycles_required(&cr));

    // Rotates and shifts
    assert_eq!(4, I::RotateLeftCircular(RmwOperand::Accumulator).cycles_required(&cr));
    assert_eq!(4, I::RotateLeft(RmwOperand::Accumulator).cycles_required(&cr));
    assert_eq!(4, I::RotateRightCircular(RmwOperand::Accumulator).cycles_required(&cr));
    assert_eq!(4, I::RotateRight(RmwOperand::Accumulator).cycles_required(&cr));
    assert_eq!(8, I::RotateLeftCircular(RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(16, I::RotateLeftCircular(RmwOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(8, I::ShiftLeftArithmetic(RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(16, I::ShiftRightArithmetic(RmwOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(8, I::ShiftRightLogical(RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(8, I::Swap(RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(16, I::Swap(RmwOperand::HlIndirect).cycles_required(&cr));

    // Single-bit instructions
    assert_eq!(8, I::TestBit(0, ReadOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(12, I::TestBit(0, ReadOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(8, I::SetBit(0, RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(16, I::SetBit(0, RmwOperand::HlIndirect).cycles_required(&cr));
    assert_eq!(8, I::ResetBit(0, RmwOperand::Register(CpuRegister::B)).cycles_required(&cr));
    assert_eq!(16, I::ResetBit(0, RmwOperand::HlIndirect).cycles_required(&cr));

    // Unconditional control flow
    assert_eq!(16, I::Jump(0).cycles_required(&cr));
    assert_eq!(4, I::JumpHl.cycles_required(&cr));
    assert_eq!(12, I::RelativeJump(0).cycles_required(&cr));
    assert_eq!(24, I::Call(0).cycles_required(&cr));
    assert_eq!(16, I::Return.cycles_required(&cr));
    assert_eq!(16, I::ReturnFromInterrupt.cycles_required(&cr));
    assert_eq!(16, I::Restart(0).cycles_required(&cr));

    // Misc
    assert_eq!(4, I::DisableInterrupts.cycles_required(&cr));
    assert_eq!(4, I::EnableInterrupts.cycles_required(&cr));
    assert_eq!(4, I::NoOp.cycles_required(&cr));
    assert_eq!(4, I::Halt.cycles_required(&cr));
    assert_eq!(4, I::Stop.cycles_required(&cr));
}

#[test]
fn conditional_cycle_counts_depend_on_flags() {
    let all_flags_clear = CpuRegisters { f: 0x00, ..CpuRegisters::new() };

    assert_eq!(12, I::JumpConditional(JumpCondition::Z, 0).cycles_required(&all_flags_clear));
    assert_eq!(16, I::JumpConditional(JumpCondition::NZ, 0).cycles_required(&all_flags_clear));

    assert_eq!(
        8,
        I::RelativeJumpConditional(JumpCondition::C, 0).cycles_required(&all_flags_clear)
    );
    assert_eq!(
        12,
        I::RelativeJumpConditional(JumpCondition::NC, 0).cycles_required(&all_flags_clear)
    );

    assert_eq!(12, I::CallConditional(JumpCondition::Z, 0).cycles_required(&all_flags_clear));
    assert_eq!(24, I::CallConditional(JumpCondition::NZ, 0).cycles_required(&all_flags_clear));

    assert_eq!(8, I::ReturnConditional(JumpCondition::Z).cycles_required(&all_flags_clear));
    assert_eq!(20, I::ReturnConditional(JumpCondition::NZ).cycles_required(&all_flags_clear));
}
