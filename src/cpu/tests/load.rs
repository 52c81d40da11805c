use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS};

#[test]
fn ld_register_immediate() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.to_opcode_bits() << 3);

        let mut expected = ExpectedState::empty();
        set_in_state(&mut expected, r, 0x77);

        // LD r, 0x77
        run_test(&format!("{load_opcode:02X}77"), &expected);
    }
}

#[test]
fn ld_register_register() {
    run_test(
        // LD B, 0x3A; LD A, B
        "063A78",
        &ExpectedState { a: Some(0x3A), b: Some(0x3A), ..ExpectedState::empty() },
    );

    run_test(
        // LD E, 0x91; LD D, E
        "1E9153",
        &ExpectedState { d: Some(0x91), e: Some(0x91), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x26; LD H, A; LD L, H
        "3E26676C",
        &ExpectedState { h: Some(0x26), l: Some(0x26), ..ExpectedState::empty() },
    );
}

#[test]
fn ld_indirect_hl() {
    run_test(
        // LD HL, 0xC000; LD (HL), 0x99; LD A, (HL)
        "2100C036997E",
        &ExpectedState {
            a: Some(0x99),
            memory: hash_map! { 0xC000: 0x99 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC555; LD B, 0x77; LD (HL), B
        "2155C5067770",
        &ExpectedState { memory: hash_map! { 0xC555: 0x77 }, ..ExpectedState::empty() },
    );
}

#[test]
fn ld_indirect_hl_increment_decrement() {
    run_test(
        // LD HL, 0xC000; LD A, 0x11; LD (HL+), A
        "2100C03E1122",
        &ExpectedState {
            h: Some(0xC0),
            l: Some(0x01),
            memory: hash_map! { 0xC000: 0x11 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC000; LD A, 0x11; LD (HL-), A
        "2100C03E1132",
        &ExpectedState {
            h: Some(0xBF),
            l: Some(0xFF),
            memory: hash_map! { 0xC000: 0x11 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC080; LD (HL), 0x44; LD A, (HL+)
        "2180C036442A",
        &ExpectedState {
            a: Some(0x44),
            h: Some(0xC0),
            l: Some(0x81),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ld_indirect_bc_de() {
    run_test(
        // LD BC, 0xC100; LD A, 0x77; LD (BC), A; XOR A; LD A, (BC)
        "0100C13E7702AF0A",
        &ExpectedState {
            a: Some(0x77),
            memory: hash_map! { 0xC100: 0x77 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD DE, 0xC200; LD A, 0x88; LD (DE), A
        "1100C23E8812",
        &ExpectedState { memory: hash_map! { 0xC200: 0x88 }, ..ExpectedState::empty() },
    );
}

#[test]
fn ldh_direct() {
    run_test(
        // LD A, 0x66; LDH (0x80), A; XOR A; LDH A, (0x80)
        "3E66E080AFF080",
        &ExpectedState {
            a: Some(0x66),
            memory: hash_map! { 0xFF80: 0x66 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ldh_indirect_c() {
    run_test(
        // LD C, 0x81; LD A, 0x42; LDH (C), A
        "0E813E42E2",
        &ExpectedState { memory: hash_map! { 0xFF81: 0x42 }, ..ExpectedState::empty() },
    );

    run_test(
        // LD C, 0x85; LD A, 0x24; LDH (C), A; XOR A; LDH A, (C)
        "0E853E24E2AFF2",
        &ExpectedState { a: Some(0x24), ..ExpectedState::empty() },
    );
}

#[test]
fn ld_direct_16() {
    run_test(
        // LD A, 0x5A; LD (0xC234), A; XOR A; LD A, (0xC234)
        "3E5AEA34C2AFFA34C2",
        &ExpectedState {
            a: Some(0x5A),
            memory: hash_map! { 0xC234: 0x5A },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ld_register_pair_immediate() {
    run_test(
        // LD BC, 0x1234
        "013412",
        &ExpectedState { b: Some(0x12), c: Some(0x34), ..ExpectedState::empty() },
    );

    run_test(
        // LD SP, 0xDFFE
        "31FEDF",
        &ExpectedState { sp: Some(0xDFFE), ..ExpectedState::empty() },
    );
}

#[test]
fn ld_sp_hl() {
    run_test(
        // LD HL, 0xC177; LD SP, HL
        "2177C1F9",
        &ExpectedState { sp: Some(0xC177), ..ExpectedState::empty() },
    );
}

#[test]
fn ld_direct_sp() {
    run_test(
        // LD SP, 0xC355; LD (0xC000), SP
        "3155C30800C0",
        &ExpectedState {
            memory: hash_map! { 0xC000: 0x55, 0xC001: 0xC3 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_pop() {
    run_test(
        // LD BC, 0x1234; PUSH BC; POP HL
        "013412C5E1",
        &ExpectedState {
            h: Some(0x12),
            l: Some(0x34),
            sp: Some(0xFFFE),
            memory: hash_map! { 0xFFFC: 0x34, 0xFFFD: 0x12 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_decrements_sp_by_two() {
    run_test(
        // LD BC, 0x1234; PUSH BC
        "013412C5",
        &ExpectedState {
            sp: Some(0xFFFC),
            memory: hash_map! { 0xFFFC: 0x34, 0xFFFD: 0x12 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn pop_af_masks_flag_low_nibble() {
    run_test(
        // LD BC, 0x12FF; PUSH BC; POP AF
        "01FF12C5F1",
        &ExpectedState { a: Some(0x12), f: Some(0xF0), ..ExpectedState::empty() },
    );
}
