use std::collections::BTreeMap;

use irisc_asm::Instruction;
use irisc_gen::{assemble_template, render_template, sweep, Shellcode};

/// A fixture in the shape of the real test cases: register setup through
/// the `set` family, a parameterized ALU operation, a conditional branch
/// and stores on both sides of it.
const FIXTURE: &str = r#"
lbl setup
set0 r5, r0, {{ value | shr(n=48) | band(n=65535) | hex }}
set1 r5, r5, {{ value | shr(n=32) | band(n=65535) | hex }}
set2 r5, r5, {{ value | shr(n=16) | band(n=65535) | hex }}
set3 r5, r5, {{ value | band(n=65535) | hex }}
set32 r6, 0x1000

lbl test
alu.r {{ funct }}, r7, r5, r6
b.t {{ cmpop }}, r7, taken
st.d r0, r6, r7, 0
jump out

lbl taken
st.d r1, r6, r7, 8

lbl out
ret.d
"#;

fn parameters(funct: u64, cmpop: u64) -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("value".to_string(), 0x8765_4321_1234_5678),
        ("funct".to_string(), funct),
        ("cmpop".to_string(), cmpop),
    ])
}

#[test]
fn fixture_assembles_and_resolves_labels() {
    let (code, labels) = assemble_template(0, FIXTURE, &parameters(0x004, 3)).unwrap();

    assert_eq!(code.len(), 12 * Instruction::LEN);
    assert_eq!(labels.get("setup"), Some(&0));
    assert_eq!(labels.get("test"), Some(&24));
    assert_eq!(labels.get("taken"), Some(&40));
    assert_eq!(labels.get("out"), Some(&44));

    let decoded = Instruction::from_bytes_iter(code);
    assert_eq!(
        decoded,
        vec![
            Instruction::SET0(5, 0, 0x8765),
            Instruction::SET1(5, 5, 0x4321),
            Instruction::SET2(5, 5, 0x1234),
            Instruction::SET3(5, 5, 0x5678),
            Instruction::SET2(6, 0, 0x0000),
            Instruction::SET3(6, 6, 0x1000),
            Instruction::SUB(7, 5, 6),
            Instruction::BT(3, 7, 3),
            Instruction::STD(0, 6, 7, 0),
            Instruction::JUMP(2),
            Instruction::STD(1, 6, 7, 8),
            Instruction::RETD,
        ]
    );
}

#[test]
fn base_address_moves_labels_without_changing_code() {
    let (low, _) = assemble_template(0, FIXTURE, &parameters(0x004, 3)).unwrap();
    let (high, labels) = assemble_template(0x4000_0000, FIXTURE, &parameters(0x004, 3)).unwrap();

    assert_eq!(low, high);
    assert_eq!(labels.get("taken"), Some(&0x4000_0028));
}

#[test]
fn sweep_varies_only_the_parameterized_words() {
    let combos = sweep(&[
        ("value".to_string(), vec![0x8765_4321_1234_5678]),
        ("funct".to_string(), vec![0x000, 0x004]),
        ("cmpop".to_string(), vec![3]),
    ]);
    assert_eq!(combos.len(), 2);

    let vectors = combos
        .into_iter()
        .map(|parameters| {
            let (code, labels) = assemble_template(0, FIXTURE, &parameters).unwrap();
            Shellcode {
                code,
                parameters,
                labels,
            }
        })
        .collect::<Vec<_>>();

    let first = Instruction::from_bytes_iter(vectors[0].code.iter().copied());
    let second = Instruction::from_bytes_iter(vectors[1].code.iter().copied());

    assert_eq!(first[6], Instruction::ADD(7, 5, 6));
    assert_eq!(second[6], Instruction::SUB(7, 5, 6));
    for (index, (a, b)) in first.iter().zip(&second).enumerate() {
        if index != 6 {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn vectors_serialize_one_record_per_line() {
    let (code, labels) = assemble_template(0, FIXTURE, &parameters(0x004, 3)).unwrap();
    let record = Shellcode {
        code,
        parameters: parameters(0x004, 3),
        labels,
    };

    let line = serde_json::to_string(&record).unwrap();
    assert!(!line.contains('\n'));

    let back: Shellcode = serde_json::from_str(&line).unwrap();
    assert_eq!(record, back);
}

#[test]
fn register_numbers_can_be_parameterized() {
    let (code, _) = render_template(
        "add r{{ rd }}, r1, r2",
        &BTreeMap::from([("rd".to_string(), 3)]),
    )
    .map(|source| irisc_asm::assemble(0, &source).unwrap())
    .unwrap();

    assert_eq!(code, 0xfc23_1000u32.to_be_bytes());
}

#[test]
fn rendering_errors_surface_before_assembly() {
    let err = assemble_template(0, "addi r1, r0, {{ missing }}", &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, irisc_gen::GenError::Template(_)));
}
