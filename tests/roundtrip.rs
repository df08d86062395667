use anyhow::{Result, bail};
use googletest::prelude::*;
use pretty_assertions::assert_eq;
use wadex::load;

fn roundtrip(bytes: &[u8]) -> Result<()> {
    let module = load(bytes)?;
    let encoded = module.to_bytes()?;
    if encoded != bytes {
        bail!("re-encoded module differs:\n  in:  {bytes:02X?}\n  out: {encoded:02X?}");
    }
    Ok(())
}

fn roundtrip_wat(src: &str) -> Result<()> {
    roundtrip(&wat::parse_str(src)?)
}

const SOURCES: &[&str] = &[
    "(module)",
    r#"(module (func (export "add") (param i32 i32) (result i32)
        local.get 0 local.get 1 i32.add))"#,
    r#"(module
        (import "env" "print" (func $print (param i32)))
        (import "env" "t" (table 2 10 funcref))
        (import "env" "m" (memory 1 2))
        (import "env" "g" (global (mut i32)))
        (func (export "main") (call $print (i32.const 42))))"#,
    r#"(module
        (type $t (func (param i32) (result i32)))
        (table 4 funcref)
        (memory (export "mem") 1)
        (global $g (mut i32) (i32.const -1))
        (func $id (type $t) (local.get 0))
        (func $sum (result i32) (local $i i32) (local $acc i32)
          (loop $next
            (local.set $acc (i32.add (local.get $acc) (local.get $i)))
            (local.set $i (i32.add (local.get $i) (i32.const 1)))
            (br_if $next (i32.lt_s (local.get $i) (i32.const 25))))
          (local.get $acc))
        (func (param i32) (result i32)
          (block $b (block $a (br_table $a $b 0 (local.get 0))))
          (if (result i32) (local.get 0) (then (i32.const 1)) (else (i32.const 2)))
          (drop)
          (select (i32.const 1) (i32.const 2) (local.get 0))
          (call_indirect (type $t))
          (i32.store8 offset=3 (i32.const 0) (i32.const 255))
          (memory.grow (i32.const 0))
          (i32.rotl (memory.size))
          (i32.extend8_s)
          (ref.is_null (ref.func $id))
          (i32.add)
          (global.set $g (i32.const 624485))
          (i32.load16_u align=1 (i32.const 2))
          (i32.add))
        (elem (i32.const 1) $id $sum)
        (elem declare func $id)
        (data (i32.const 8) "hello")
        (data "passive")
        (start $sum))"#,
    r#"(module
        (func (result i32) (local f64 i64)
          (f32.const 1.5) (drop)
          (f64.const -0.25) (drop)
          (i64.const -9223372036854775808) (drop)
          (i32.const -2147483648)))"#,
];

#[gtest]
fn wat_modules_roundtrip() {
    for src in SOURCES {
        expect_that!(roundtrip_wat(src), ok(anything()));
    }
}

#[test]
fn hand_written_add_roundtrips() {
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x07, 0x01, 0x60, 0x02, 0x7F, 0x7F, 0x01, 0x7F,
        0x03, 0x02, 0x01, 0x00,
        0x07, 0x07, 0x01, 0x03, b'a', b'd', b'd', 0x00, 0x00,
        0x0A, 0x09, 0x01, 0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6A, 0x0B,
    ];
    roundtrip(&bytes).unwrap();
}

#[test]
fn empty_else_arm_is_preserved() {
    // if with an `else` marker and nothing after it
    #[rustfmt::skip]
    let with_else = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00,
        0x03, 0x02, 0x01, 0x00,
        0x0A, 0x0A, 0x01, 0x08, 0x00, 0x41, 0x01, 0x04, 0x40, 0x05, 0x0B, 0x0B,
    ];
    roundtrip(&with_else).unwrap();
}

#[test]
fn every_element_form_roundtrips() {
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00,
        0x03, 0x02, 0x01, 0x00,
        0x04, 0x04, 0x01, 0x70, 0x00, 0x02,
        0x09, 0x2F, 0x08,
        // 0: active, table 0 implied, funcidx
        0x00, 0x41, 0x00, 0x0B, 0x01, 0x00,
        // 1: passive, elemkind, funcidx
        0x01, 0x00, 0x01, 0x00,
        // 2: active, explicit table, elemkind, funcidx
        0x02, 0x00, 0x41, 0x01, 0x0B, 0x00, 0x01, 0x00,
        // 3: declarative, elemkind, funcidx
        0x03, 0x00, 0x01, 0x00,
        // 4: active, table 0 implied, exprs
        0x04, 0x41, 0x00, 0x0B, 0x01, 0xD2, 0x00, 0x0B,
        // 5: passive, reftype, exprs
        0x05, 0x70, 0x01, 0xD0, 0x70, 0x0B,
        // 6: active, explicit table, reftype, exprs
        0x06, 0x00, 0x41, 0x00, 0x0B, 0x70, 0x00,
        // 7: declarative, reftype, exprs
        0x07, 0x70, 0x00,
        0x0A, 0x04, 0x01, 0x02, 0x00, 0x0B,
    ];
    roundtrip(&bytes).unwrap();
    assert_eq!(load(&bytes).unwrap().elems().len(), 8);
}

#[test]
fn data_count_and_passive_data_roundtrip() {
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x05, 0x03, 0x01, 0x00, 0x01,
        0x0C, 0x01, 0x03,
        0x0B, 0x11, 0x03,
        0x00, 0x41, 0x00, 0x0B, 0x01, 0xAA,
        0x01, 0x02, 0xBB, 0xCC,
        0x02, 0x00, 0x41, 0x04, 0x0B, 0x00,
    ];
    roundtrip(&bytes).unwrap();
    assert_eq!(load(&bytes).unwrap().data_count(), Some(3));
}

#[test]
fn leb128_is_reencoded_in_canonical_form() {
    // i32.const -1 and i32.const 624485 in their shortest encodings
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7F,
        0x03, 0x02, 0x01, 0x00,
        0x0A, 0x0B, 0x01, 0x09, 0x00, 0x41, 0x7F, 0x1A, 0x41, 0xE5, 0x8E, 0x26, 0x0B,
    ];
    let result = roundtrip(&bytes);
    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn padded_leb128_is_rejected_rather_than_rewritten() {
    use wadex::DecodeModuleError;
    use wadex::decode::integer::DecodeIntegerError;

    // type section size written as `84 00` instead of `04`
    #[rustfmt::skip]
    let padded = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x84, 0x00, 0x01, 0x60, 0x00, 0x00,
    ];
    match load(&padded).unwrap_err() {
        DecodeModuleError::DecodeSectionHeader(err) => {
            let source = std::error::Error::source(&err).unwrap();
            assert!(matches!(
                source.downcast_ref::<DecodeIntegerError>(),
                Some(DecodeIntegerError::NonMinimal { bits: 32 })
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // the same module with the shortest size survives unchanged
    let mut canonical = padded.to_vec();
    canonical.splice(9..11, [0x04]);
    roundtrip(&canonical).unwrap();
}
