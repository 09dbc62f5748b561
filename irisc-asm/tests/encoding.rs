use irisc_asm::{assemble, Instruction, Op, RawInstruction};
use rstest::rstest;

fn representative_instructions() -> Vec<Instruction> {
    use Instruction::*;

    // values picked to exercise field edges
    let r = 0x15;

    vec![
        ADDI(r, r, 0x0bfd),
        ADDI(0, 31, 0xfffc),
        SET0(r, 0, 0xdead),
        SET1(r, r, 0xbeef),
        SET2(r, r, 0x0001),
        SET3(r, r, 0x8000),
        LDB(r, r, 0xfffd),
        LDQ(r, r, 0x3ffd),
        LDUW(r, r, 0),
        LDD(r, r, 0x2aaa),
        LDLW(r, r, 1),
        STB(r, r, 0xbffd),
        STD(r, r, r, 0x1fd),
        STQ(r, r, r, 0x002),
        CALL(0x00bf_fffd),
        JUMP(0x0000_0002),
        BT(0x1d, r, 0xfffd),
        BF(0x00, r, 0x7fff),
        BSET(r, 0x1d, 0x0004),
        BCLR(r, 0x00, 0xfffc),
        ALUR(0x7fd, r, r, r),
        ADD(3, 1, 2),
        SUB(3, 1, 2),
        SUBS(3, 1, 2),
        RETD,
        UNKI(0x12, r, r, 0x1234),
    ]
}

#[test]
fn byte_stream_round_trip() {
    let instructions = representative_instructions();

    let bytes: Vec<u8> = instructions.iter().copied().collect();
    assert_eq!(bytes.len(), instructions.len() * Instruction::LEN);

    let decoded = Instruction::from_bytes_iter(bytes.iter().copied());
    assert_eq!(instructions, decoded);
}

#[test]
fn disassembly_reassembles_to_the_same_word() {
    let mut instructions = representative_instructions();
    // unk.r never comes out of the decoder, but its source form must
    // still survive a print/parse cycle.
    instructions.push(Instruction::UNKR(0x13, 5, 0, 6, 0x034));

    for instruction in instructions {
        let source = instruction.to_string();
        let (code, _) = assemble(0, &source).unwrap();
        assert_eq!(code, instruction.to_bytes(), "for `{source}`");
    }
}

#[test]
fn register_form_raw_word_decodes_as_immediate_form() {
    let unkr = Instruction::UNKR(0x13, 5, 0, 6, 0x034);
    let word = RawInstruction::from(unkr);

    // rt and funct land in the imm16 slot: 6 << 11 | 0x34
    assert_eq!(
        Instruction::from(word),
        Instruction::UNKI(0x13, 5, 0, 0x3034)
    );
}

#[test]
fn every_raw_word_survives_decode_encode() {
    // deterministic sweep over the opcode space with field patterns
    let tails = [
        0x0000_0000,
        0x0000_0001,
        0x0000_0002,
        0x0000_0003,
        0x0000_fffc,
        0x0001_0000,
        0x00ff_ffff,
        0x01ff_fffd,
        0x02aa_aaaa,
        0x03ff_ffff,
    ];
    for op in 0..64u32 {
        for tail in tails {
            let raw = op << 26 | tail;
            assert_eq!(
                RawInstruction::from(Instruction::from(raw)),
                raw,
                "for word {raw:#010x}"
            );
        }
    }

    // and a randomized pass
    for _ in 0..10_000 {
        let raw: u32 = rand::random();
        assert_eq!(
            RawInstruction::from(Instruction::from(raw)),
            raw,
            "for word {raw:#010x}"
        );
    }
}

#[rstest]
#[case("addi r5, r0, 0x1234", 0x0005_1234)]
#[case("addi r1, r0, 1", 0x0001_0001)]
#[case("set0 r1, r0, 0xdead", 0x1801_dead)]
#[case("set1 r5, r5, 0x4321", 0x1ca5_4321)]
#[case("set2 r5, r0, 0xdead", 0x2405_dead)]
#[case("set3 r5, r5, 0xbeef", 0x20a5_beef)]
#[case("add r3, r1, r2", 0xfc23_1000)]
#[case("sub r3, r1, r2", 0xfc23_1004)]
#[case("subs r3, r1, r2", 0xfc23_1005)]
#[case("alu.r 0x00b, r3, r1, r2", 0xfc23_100b)]
#[case("ret.d", 0xfc00_002d)]
#[case("ld.b r1, r2, -4", 0x6041_fffc)]
#[case("ld.q r1, r2, 1", 0x6441_0004)]
#[case("ld.uw r1, r2, 1", 0x6441_0005)]
#[case("ld.d r7, r6, 4", 0x64c7_0012)]
#[case("ld.lw r1, r2, 1", 0x6441_0007)]
#[case("st.b r5, r2, 0x1234", 0x6842_2a34)]
#[case("st.d r1, r2, r3, 8", 0x6c41_1822)]
#[case("st.q r1, r2, r3, 4", 0x7841_1810)]
#[case("call 2", 0x9400_0002)]
#[case("jump -1", 0x95ff_ffff)]
#[case("b.t 0x3, r4, 2", 0xa083_0002)]
#[case("b.f 0x1f, r31, -1", 0xa7ff_ffff)]
#[case("b.set r4, 0x10, 2", 0xa890_0002)]
#[case("b.clr r4, 0x10, 2", 0xac90_0002)]
#[case("unk.i 0x12, r5, r0, 0x1234", 0x4805_1234)]
#[case("unk.r 0x12, r5, r0, r6, 0x34", 0x4805_3034)]
fn golden_encodings(#[case] source: &str, #[case] word: u32) {
    let (code, _) = assemble(0, source).unwrap();
    assert_eq!(code, word.to_be_bytes());
}

#[test]
fn truncated_buffers_are_rejected() {
    let err = Instruction::from_bytes(&[0xfc, 0x00]).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);

    // iterator form drops the unaligned tail instead
    let decoded = Instruction::from_bytes_iter([0xfc, 0x00, 0x00, 0x2d, 0xff]);
    assert_eq!(decoded, vec![Instruction::RETD]);
}

#[test]
fn parse_accepts_canonical_disassembly() {
    let op: Op = "st.d r1, r2, r3, 8".parse().unwrap();
    assert_eq!(op, Op::Inst(Instruction::STD(1, 2, 3, 8)));
}

#[test]
fn serde_round_trip() {
    let instructions = representative_instructions();
    let json = serde_json::to_string(&instructions).unwrap();
    let back: Vec<Instruction> = serde_json::from_str(&json).unwrap();
    assert_eq!(instructions, back);
}
