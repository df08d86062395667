use anyhow::{Result, bail};
use googletest::prelude::*;
use std::rc::Rc;
use std::cell::RefCell;
use wadex::core::types::{FuncType, Limits, RefType, TableType, ValType};
use wadex::{
    CallError, Config, ExecError, Function, Imports, Instance, InstantiateError, Memory, Table,
    Value, load,
};

fn instantiate_with(wat: &str, imports: &Imports, config: Config) -> Instance {
    let bytes = wat::parse_str(wat).unwrap();
    load(&bytes)
        .unwrap()
        .instantiate_with(imports, config)
        .unwrap()
}

fn instantiate(wat: &str) -> Instance {
    instantiate_with(wat, &Imports::new(), Config::default())
}

fn try_instantiate(wat: &str, imports: &Imports) -> std::result::Result<Instance, InstantiateError> {
    let bytes = wat::parse_str(wat).unwrap();
    load(&bytes).unwrap().instantiate(imports)
}

fn call(instance: &mut Instance, name: &str, args: &[i32]) -> std::result::Result<Vec<Value>, CallError> {
    let args: Vec<Value> = args.iter().copied().map(Value::from).collect();
    instance.call(name, &args)
}

const ARITH: &str = r#"
(module
  (func (export "div_s") (param i32 i32) (result i32) (i32.div_s (local.get 0) (local.get 1)))
  (func (export "div_u") (param i32 i32) (result i32) (i32.div_u (local.get 0) (local.get 1)))
  (func (export "rem_s") (param i32 i32) (result i32) (i32.rem_s (local.get 0) (local.get 1)))
  (func (export "rem_u") (param i32 i32) (result i32) (i32.rem_u (local.get 0) (local.get 1))))
"#;

fn expect_division_by_zero(instance: &mut Instance, op: &str) -> Result<()> {
    match call(instance, op, &[7, 0]) {
        Err(CallError::Exec(ExecError::DivisionByZero)) => Ok(()),
        other => bail!("{op}: expected a division by zero error; got {other:?}"),
    }
}

#[gtest]
fn every_division_traps_on_zero() {
    let mut instance = instantiate(ARITH);
    for op in ["div_s", "div_u", "rem_s", "rem_u"] {
        expect_that!(expect_division_by_zero(&mut instance, op), ok(anything()));
    }
    assert!(instance.operand_stack_mut().is_empty());
}

#[test_log::test]
fn signed_division_overflow_traps() {
    let mut instance = instantiate(ARITH);
    assert!(matches!(
        call(&mut instance, "div_s", &[i32::MIN, -1]),
        Err(CallError::Exec(ExecError::IntegerOverflow))
    ));
    assert_eq!(
        call(&mut instance, "rem_s", &[i32::MIN, -1]).unwrap(),
        [Value::I32(0)]
    );
}

#[test_log::test]
fn unreachable_traps() {
    let mut instance = instantiate(r#"(module (func (export "f") unreachable))"#);
    assert!(matches!(
        call(&mut instance, "f", &[]),
        Err(CallError::Exec(ExecError::Unreachable))
    ));
}

#[test_log::test]
fn writing_an_immutable_global_fails() {
    let mut instance = instantiate(
        r#"
        (module
          (global $g (export "g") i32 (i32.const 1))
          (func (export "f") (global.set $g (i32.const 2))))
        "#,
    );
    assert!(matches!(
        call(&mut instance, "f", &[]),
        Err(CallError::Exec(ExecError::ImmutableGlobal))
    ));
    assert_eq!(instance.global_value("g"), Some(Value::I32(1)));
}

#[test_log::test]
fn reserved_number_types_are_unsupported() {
    let mut instance = instantiate(
        r#"(module (func (export "f") (result i32) (drop (i64.const 1)) (i32.const 0)))"#,
    );
    assert!(matches!(
        call(&mut instance, "f", &[]),
        Err(CallError::Exec(ExecError::UnsupportedType(ValType::I64)))
    ));
}

#[test_log::test]
fn branch_past_the_outermost_label_fails() {
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00,
        0x03, 0x02, 0x01, 0x00,
        0x07, 0x05, 0x01, 0x01, b'f', 0x00, 0x00,
        0x0A, 0x06, 0x01, 0x04, 0x00, 0x0C, 0x05, 0x0B,
    ];
    let mut instance = load(&bytes).unwrap().instantiate(&Imports::new()).unwrap();
    assert!(matches!(
        call(&mut instance, "f", &[]),
        Err(CallError::Exec(ExecError::BranchDepth(5)))
    ));
}

#[test_log::test]
fn runaway_recursion_exhausts_the_call_stack() {
    let mut instance = instantiate_with(
        r#"(module (func $f (export "f") (call $f)))"#,
        &Imports::new(),
        Config::default().max_call_depth(16),
    );
    assert!(matches!(
        call(&mut instance, "f", &[]),
        Err(CallError::Exec(ExecError::CallStackExhausted))
    ));
}

#[test_log::test]
fn unbounded_recursion_fails_cleanly_with_the_default_depth() {
    let mut instance = instantiate(r#"(module (func $f (export "f") (call $f)))"#);
    assert!(matches!(
        call(&mut instance, "f", &[]),
        Err(CallError::Exec(ExecError::CallStackExhausted))
    ));
    assert!(instance.operand_stack_mut().is_empty());
}

#[test_log::test]
fn unbounded_indirect_recursion_fails_cleanly_with_the_default_depth() {
    let mut instance = instantiate(
        r#"
        (module
          (type $t (func (param i32) (result i32)))
          (table 1 funcref)
          (elem (i32.const 0) $f)
          (func $f (export "f") (type $t)
            (call_indirect (type $t) (i32.add (local.get 0) (i32.const 1)) (i32.const 0))))
        "#,
    );
    assert!(matches!(
        call(&mut instance, "f", &[0]),
        Err(CallError::Exec(ExecError::CallStackExhausted))
    ));
}

#[test_log::test]
fn oversized_local_declarations_fail_to_link() {
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00,
        0x03, 0x02, 0x01, 0x00,
        0x0A, 0x0A, 0x01, 0x08, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x7F, 0x0B,
    ];
    let module = load(&bytes).unwrap();
    assert_eq!(module.codes()[0].local_count(), u64::from(u32::MAX));
    assert!(matches!(
        module.instantiate(&Imports::new()),
        Err(InstantiateError::TooManyLocals {
            func: 0,
            count,
            limit: 50_000
        }) if count == u64::from(u32::MAX)
    ));
}

#[test_log::test]
fn local_limit_counts_parameters() {
    let bytes = wat::parse_str(
        r#"(module (func (param i32) (local i32 i32) (local i32)))"#,
    )
    .unwrap();
    let module = load(&bytes).unwrap();
    assert!(module
        .instantiate_with(&Imports::new(), Config::default().max_locals(4))
        .is_ok());
    assert!(matches!(
        module.instantiate_with(&Imports::new(), Config::default().max_locals(3)),
        Err(InstantiateError::TooManyLocals {
            func: 0,
            count: 4,
            limit: 3
        })
    ));
}

#[test_log::test]
fn oversized_tables_fail_to_link() {
    #[rustfmt::skip]
    let bytes = [
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        0x04, 0x08, 0x01, 0x70, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F,
    ];
    assert!(matches!(
        load(&bytes).unwrap().instantiate(&Imports::new()),
        Err(InstantiateError::TableTooLarge {
            index: 0,
            min: u32::MAX,
            limit: 10_000_000
        })
    ));

    let bytes = wat::parse_str(
        r#"(module (import "env" "t" (table 1 funcref)) (table 8 funcref))"#,
    )
    .unwrap();
    let imported = Table::new(TableType {
        reftype: RefType::Func,
        limits: Limits { min: 1, max: None },
    });
    let mut imports = Imports::new();
    imports.define("env", "t", Rc::new(RefCell::new(imported)));
    assert!(matches!(
        load(&bytes)
            .unwrap()
            .instantiate_with(&imports, Config::default().max_table_elements(7)),
        Err(InstantiateError::TableTooLarge {
            index: 1,
            min: 8,
            limit: 7
        })
    ));
}

#[test_log::test]
fn infinite_loops_run_out_of_fuel() {
    let mut instance = instantiate_with(
        r#"(module (func (export "spin") (loop $l (br $l))))"#,
        &Imports::new(),
        Config::default().fuel(Some(1_000)),
    );
    assert!(matches!(
        call(&mut instance, "spin", &[]),
        Err(CallError::Exec(ExecError::FuelExhausted))
    ));
}

#[test_log::test]
fn host_errors_propagate() {
    let fail = Function::host(FuncType::new([], []), |_| Err(ExecError::Host("boom".into())));
    let short = Function::host(FuncType::new([], [ValType::I32]), |_| Ok(vec![]));
    let mut imports = Imports::new();
    imports.define("env", "fail", fail).define("env", "short", short);

    let bytes = wat::parse_str(
        r#"
        (module
          (import "env" "fail" (func $fail))
          (import "env" "short" (func $short (result i32)))
          (func (export "fail") (call $fail))
          (func (export "short") (result i32) (call $short)))
        "#,
    )
    .unwrap();
    let mut instance = load(&bytes).unwrap().instantiate(&imports).unwrap();

    match call(&mut instance, "fail", &[]) {
        Err(CallError::Exec(ExecError::Host(msg))) => assert_eq!(msg, "boom"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        call(&mut instance, "short", &[]),
        Err(CallError::Exec(ExecError::HostResultArity {
            expected: 1,
            actual: 0
        }))
    ));
}

#[test_log::test]
fn calls_to_missing_or_non_function_exports_fail() {
    let mut instance = instantiate(r#"(module (memory (export "mem") 1))"#);
    assert!(matches!(
        call(&mut instance, "nope", &[]),
        Err(CallError::UnknownExport(name)) if name == "nope"
    ));
    assert!(matches!(
        call(&mut instance, "mem", &[]),
        Err(CallError::NotAFunction(name)) if name == "mem"
    ));
}

const PRINT: &str = r#"
(module
  (import "env" "print" (func (param i32))))
"#;

#[test_log::test]
fn missing_imports_fail_to_link() {
    assert!(matches!(
        try_instantiate(PRINT, &Imports::new()),
        Err(InstantiateError::UnknownImport { module, name }) if module == "env" && name == "print"
    ));
}

#[test_log::test]
fn imports_of_the_wrong_kind_fail_to_link() {
    let mut imports = Imports::new();
    let mem = Memory::new(Limits { min: 1, max: None }).unwrap();
    imports.define("env", "print", Rc::new(RefCell::new(mem)));
    assert!(matches!(
        try_instantiate(PRINT, &imports),
        Err(InstantiateError::ImportKindMismatch {
            expected: "function",
            actual: "memory",
            ..
        })
    ));
}

#[test_log::test]
fn imports_of_the_wrong_type_fail_to_link() {
    let mut imports = Imports::new();
    let print = Function::host(FuncType::new([ValType::I32], [ValType::I32]), |_| {
        Ok(vec![Value::I32(0)])
    });
    imports.define("env", "print", print);
    assert!(matches!(
        try_instantiate(PRINT, &imports),
        Err(InstantiateError::ImportTypeMismatch { .. })
    ));

    let mut imports = Imports::new();
    let mem = Memory::new(Limits { min: 1, max: None }).unwrap();
    imports.define("env", "mem", Rc::new(RefCell::new(mem)));
    assert!(matches!(
        try_instantiate(r#"(module (import "env" "mem" (memory 2)))"#, &imports),
        Err(InstantiateError::ImportTypeMismatch { .. })
    ));
}

#[test_log::test]
fn data_segments_out_of_bounds_fail_to_link() {
    let err = try_instantiate(
        r#"(module (memory 1) (data (i32.const 65535) "ab"))"#,
        &Imports::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InstantiateError::Segment {
            kind: "data",
            index: 0,
            source: ExecError::MemoryOutOfBounds { .. }
        }
    ));
}

#[test_log::test]
fn element_segments_out_of_bounds_fail_to_link() {
    let err = try_instantiate(
        r#"(module (table 1 funcref) (func $f) (elem (i32.const 1) $f))"#,
        &Imports::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InstantiateError::Segment {
            kind: "element",
            index: 0,
            source: ExecError::TableOutOfBounds { .. }
        }
    ));
}

#[test_log::test]
fn trapping_start_function_fails_instantiation() {
    let err = try_instantiate(
        r#"(module (func $s unreachable) (start $s))"#,
        &Imports::new(),
    )
    .unwrap_err();
    assert!(matches!(err, InstantiateError::Start(ExecError::Unreachable)));
}
