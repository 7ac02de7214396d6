//! Boot tests built from hand-assembled iNES images.
//!
//! The images are plain byte arrays: a 16-byte header, 32K of PRG (mapper
//! 0, two banks) and 8K of CHR.

use emu_nes::{Cartridge, Cpu, Nes, NesConfig, Observable, Ticks, Value};
use ricoh_ppu_2c02::PALETTE;

const PRG_SIZE: usize = 32768;
const CHR_SIZE: usize = 8192;

/// Empty NROM image with the vectors pointing into `code` at $8000.
fn nrom_image(code: &[u8], nmi: u16) -> Vec<u8> {
    let mut rom = vec![0u8; 16 + PRG_SIZE + CHR_SIZE];
    rom[0..4].copy_from_slice(b"NES\x1a");
    rom[4] = 2; // 2 × 16K PRG banks = 32K
    rom[5] = 1; // 1 × 8K CHR bank
    rom[6] = 0; // Mapper 0, horizontal mirroring

    rom[16..16 + code.len()].copy_from_slice(code);

    let [nmi_lo, nmi_hi] = nmi.to_le_bytes();
    rom[16 + 0x7FFA] = nmi_lo;
    rom[16 + 0x7FFB] = nmi_hi;
    rom[16 + 0x7FFC] = 0x00;
    rom[16 + 0x7FFD] = 0x80;
    rom[16 + 0x7FFE] = nmi_lo;
    rom[16 + 0x7FFF] = nmi_hi;
    rom
}

/// Init, poll $2002 for VBlank twice, then idle at $800F.
fn build_minimal_rom() -> Vec<u8> {
    #[rustfmt::skip]
    let code: &[u8] = &[
        0x78,             // $8000  SEI
        0xD8,             // $8001  CLD
        0xA2, 0xFF,       // $8002  LDX #$FF
        0x9A,             // $8004  TXS
        0xAD, 0x02, 0x20, // $8005  LDA $2002
        0x10, 0xFB,       // $8008  BPL $8005
        0xAD, 0x02, 0x20, // $800A  LDA $2002
        0x10, 0xFB,       // $800D  BPL $800A
        0x4C, 0x0F, 0x80, // $800F  JMP $800F
    ];
    nrom_image(code, 0x8000)
}

#[test]
fn test_boot_minimal() {
    let rom_data = build_minimal_rom();
    let mut nes =
        Nes::with_config(&NesConfig::with_rom(rom_data)).expect("Failed to parse minimal ROM");
    assert_eq!(nes.cpu().regs.pc, 0x8000, "Reset vector should point to $8000");

    // Two VBlank waits need about two frames.
    let idle_range = 0x800Fu16..=0x8011u16;
    for _ in 0..5 {
        assert_eq!(nes.run_frame(), Ticks::new(341 * 262));
        if idle_range.contains(&nes.cpu().pc()) {
            assert_eq!(nes.cpu().regs.s, 0xFF);
            return;
        }
    }
    panic!(
        "NES did not reach idle loop within 5 frames, stuck at ${:04X}",
        nes.cpu().pc()
    );
}

/// Writes a palette and eight tiles of text to nametable 0, then enables
/// background rendering with NMI on.
fn build_hello_rom() -> Vec<u8> {
    #[rustfmt::skip]
    let code: &[u8] = &[
        // Standard init
        0x78,                   // $8000  SEI
        0xD8,                   // $8001  CLD
        0xA2, 0xFF,             // $8002  LDX #$FF
        0x9A,                   // $8004  TXS
        0xA9, 0x00,             // $8005  LDA #$00
        0x8D, 0x01, 0x20,       // $8007  STA $2001
        // VBlank waits
        0xAD, 0x02, 0x20,       // $800A  LDA $2002
        0x10, 0xFB,             // $800D  BPL $800A
        0xAD, 0x02, 0x20,       // $800F  LDA $2002
        0x10, 0xFB,             // $8012  BPL $800F
        0xAD, 0x02, 0x20,       // $8014  LDA $2002
        // Palette at $3F00
        0xA9, 0x3F,             // $8017  LDA #$3F
        0x8D, 0x06, 0x20,       // $8019  STA $2006
        0xA9, 0x00,             // $801C  LDA #$00
        0x8D, 0x06, 0x20,       // $801E  STA $2006
        0xA2, 0x00,             // $8021  LDX #$00
        0xBD, 0x5A, 0x80,       // $8023  LDA $805A,X
        0x8D, 0x07, 0x20,       // $8026  STA $2007
        0xE8,                   // $8029  INX
        0xE0, 0x04,             // $802A  CPX #$04
        0xD0, 0xF5,             // $802C  BNE $8023
        // Text at $21CC (row 14, column 12)
        0xA9, 0x21,             // $802E  LDA #$21
        0x8D, 0x06, 0x20,       // $8030  STA $2006
        0xA9, 0xCC,             // $8033  LDA #$CC
        0x8D, 0x06, 0x20,       // $8035  STA $2006
        0xA2, 0x00,             // $8038  LDX #$00
        0xBD, 0x5E, 0x80,       // $803A  LDA $805E,X
        0x8D, 0x07, 0x20,       // $803D  STA $2007
        0xE8,                   // $8040  INX
        0xE0, 0x09,             // $8041  CPX #$09
        0xD0, 0xF5,             // $8043  BNE $803A
        // Scroll (0, 0)
        0xA9, 0x00,             // $8045  LDA #$00
        0x8D, 0x05, 0x20,       // $8047  STA $2005
        0x8D, 0x05, 0x20,       // $804A  STA $2005
        // Background on, left column shown
        0xA9, 0x0A,             // $804D  LDA #$0A
        0x8D, 0x01, 0x20,       // $804F  STA $2001
        // NMI on, pattern table 0
        0xA9, 0x80,             // $8052  LDA #$80
        0x8D, 0x00, 0x20,       // $8054  STA $2000
        0x4C, 0x57, 0x80,       // $8057  JMP $8057
        // Palette: black, white, grey, dark grey
        0x0F, 0x30, 0x10, 0x00, // $805A
        // "HELLO NES" as tile numbers
        0x01, 0x02, 0x03, 0x03, 0x04, 0x00, 0x05, 0x02, 0x06, // $805E
        0x40,                   // $8067  RTI
    ];
    let mut rom = nrom_image(code, 0x8067);

    // Plane 0 only, so every set bit is colour 1.
    let chr_offset = 16 + PRG_SIZE;
    #[rustfmt::skip]
    let tiles: &[[u8; 8]] = &[
        [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
        [0x88, 0x88, 0x88, 0xF8, 0x88, 0x88, 0x88, 0x00], // H
        [0xF8, 0x80, 0x80, 0xF0, 0x80, 0x80, 0xF8, 0x00], // E
        [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xF8, 0x00], // L
        [0x70, 0x88, 0x88, 0x88, 0x88, 0x88, 0x70, 0x00], // O
        [0x88, 0xC8, 0xA8, 0x98, 0x88, 0x88, 0x88, 0x00], // N
        [0x70, 0x88, 0x80, 0x70, 0x08, 0x88, 0x70, 0x00], // S
    ];
    for (i, tile) in tiles.iter().enumerate() {
        let base = chr_offset + i * 16;
        rom[base..base + 8].copy_from_slice(tile);
    }
    rom
}

#[test]
fn test_background_rendering() {
    let mut nes = Nes::with_config(&NesConfig::with_rom(build_hello_rom()))
        .expect("Failed to parse hello ROM");

    for _ in 0..10 {
        nes.run_frame();
    }

    let pc = nes.cpu().pc();
    assert!(
        (0x8057..=0x8059).contains(&pc),
        "Expected idle loop at $8057-$8059, got PC=${pc:04X}"
    );
    assert_eq!(nes.query("ppu.ctrl"), Some(Value::U8(0x80)));

    let screen = nes.screen();
    assert_eq!(screen.pixel(0, 0), PALETTE[0x0F], "backdrop");
    assert_eq!(screen.pixel(255, 239), PALETTE[0x0F], "backdrop");

    // Top-left of "H": bit 7 of its first row.
    assert_eq!(screen.pixel(96, 112), PALETTE[0x30]);
    assert_eq!(screen.pixel(97, 112), PALETTE[0x0F]);
    // Right stroke of "H" at bit 3.
    assert_eq!(screen.pixel(100, 112), PALETTE[0x30]);
    // Bottom row of every glyph is blank.
    assert_eq!(screen.pixel(96, 119), PALETTE[0x0F]);
    // First "L" is the third tile; its bottom bar fills bits 7..3 of row 6.
    for x in 112..117 {
        assert_eq!(screen.pixel(x, 118), PALETTE[0x30], "L bar at x={x}");
    }

    // The same tiles through the pattern-table debug view.
    let table = nes.pattern_table(0, 0);
    assert_eq!(table.pixel(8, 0), PALETTE[0x30], "tile 1 row 0 bit 7");
    assert_eq!(table.pixel(9, 0), PALETTE[0x0F]);
}

#[test]
fn test_hex_cartridge_multiply() {
    // Multiply 10 by 3 with repeated addition; result in $0002.
    let program = "A2 0A 8E 00 00 A2 03 8E 01 00 AC 00 00 A9 00 18 \
                   6D 01 00 88 D0 FA 8D 02 00 EA EA EA";
    let mut nes = Nes::new();
    nes.insert_cartridge(Cartridge::from_hex_program(program, 0x8000).unwrap());
    nes.reset();

    while nes.cpu().pc() != 0x801A {
        nes.execute_operation();
        assert!(nes.operation_count() < 1000, "program did not finish");
    }
    assert_eq!(nes.query("memory.0x0000"), Some(Value::U8(10)));
    assert_eq!(nes.query("memory.0x0001"), Some(Value::U8(3)));
    assert_eq!(nes.query("memory.0x0002"), Some(Value::U8(30)));

    let listing = nes.disassemble(0x8000, 0x8019);
    assert_eq!(listing[&0x8000], "$8000: LDX #$0A {IMM}");
    assert_eq!(listing[&0x8014], "$8014: BNE $00FA [$8010] {REL}");
}

#[test]
fn test_preloaded_ram_program() {
    // No cartridge: program and reset vector both live in the bus.
    let mut nes = Nes::new();
    nes.preload_memory(0x0600, "A9 05 69 07 85 10 4C 06 06").unwrap();
    nes.set_code_entry(0x0600);
    nes.reset();

    for _ in 0..4 {
        nes.execute_operation();
    }
    assert_eq!(nes.cpu().regs.a, 12);
    assert_eq!(nes.bus().peek_ram(0x0010), 12);
    assert_eq!(nes.cpu().pc(), 0x0606);
}
