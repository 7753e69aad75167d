//! Clove 集成测试
//!
//! 从源码读取、分析、解释执行和发射，检查两种执行方式结果一致。

use std::sync::Arc;
use std::thread;

use clove::Compiler;
use clove::ast::{Expr, ExprContext, NIL_EXPR};
use clove::codegen::{
    CodeBuffer, CompileUnit, ConstSlot, Immediate, Op, TargetSpec, emit_body, exec,
};
use clove::error::CloveError;
use clove::reader;
use clove::value::{HostObject, Value};
use pretty_assertions::assert_eq;

const SOURCES: &[&str] = &[
    "nil",
    "true",
    "false",
    "7",
    "-2147483649",
    "9223372036854775807",
    "0x7f",
    "3.25",
    "\\a",
    "\\newline",
    "\"Hello, Clove\"",
    ":keyword",
    "'symbol",
    "'(def x 1)",
    "[1 2.5 \"three\" :four]",
    "{:a [1 2] :b {\"nested\" nil}}",
    "()",
];

/// 发射一个表达式并在栈机上执行
fn emit_and_run(expr: &Expr, target: TargetSpec) -> Value {
    let mut unit = CompileUnit::new("it");
    let mut code = CodeBuffer::new(target);
    expr.emit(ExprContext::Return, &mut unit, &mut code).unwrap();
    exec::run(&unit.finish(code)).unwrap()
}

#[test]
fn test_eval_and_emit_agree_on_every_target() {
    let compiler = Compiler::new();
    for source in SOURCES {
        let expected = compiler.eval_string(source).unwrap();
        let expr = compiler.analyze_string(source).unwrap().remove(0);
        for target in [TargetSpec::stack(), TargetSpec::compact(), TargetSpec::register()] {
            let name = target.name.clone();
            assert_eq!(emit_and_run(&expr, target), expected, "{} on {}", source, name);
        }
    }
}

#[test]
fn test_compile_and_run_program() {
    for target in [TargetSpec::stack(), TargetSpec::register()] {
        let compiler = Compiler::with_target(target);
        let compiled = compiler
            .compile_string("program", "1 \"discarded\" [:x 'y] \"result\"")
            .unwrap();
        assert_eq!(compiled.constants, vec![Value::string("result")]);
        assert_eq!(exec::run(&compiled).unwrap(), Value::string("result"));
    }
}

#[test]
fn test_large_string_emitted_twice_uses_one_slot() {
    let text = "lorem ipsum ".repeat(1000);
    let first = Expr::literal(Value::String(text.clone()));
    let second = Expr::literal(Value::String(text.clone()));

    let mut unit = CompileUnit::new("strings");
    let mut code = CodeBuffer::new(TargetSpec::stack());
    first.emit(ExprContext::Expression, &mut unit, &mut code).unwrap();
    second.emit(ExprContext::Expression, &mut unit, &mut code).unwrap();

    assert_eq!(code.ops(), &[Op::LoadConst(ConstSlot(0)), Op::LoadConst(ConstSlot(0))]);
    let compiled = unit.finish(code);
    assert_eq!(compiled.constants, vec![Value::String(text)]);
}

#[test]
fn test_nil_in_return_context_needs_no_pool() {
    for target in [TargetSpec::stack(), TargetSpec::register()] {
        let mut unit = CompileUnit::new("nil");
        let mut code = CodeBuffer::new(target);
        NIL_EXPR.emit(ExprContext::Return, &mut unit, &mut code).unwrap();
        assert!(code.is_terminated());
        let compiled = unit.finish(code);
        assert!(compiled.constants.is_empty());
        assert_eq!(exec::run(&compiled).unwrap(), Value::Nil);
    }
}

#[test]
fn test_context_changes_emitted_code() {
    let expr = Expr::literal(Value::Int(5));
    let emit = |ctx, target| {
        let mut unit = CompileUnit::new("ctx");
        let mut code = CodeBuffer::new(target);
        expr.emit(ctx, &mut unit, &mut code).unwrap();
        code.into_ops()
    };

    let statement = emit(ExprContext::Statement, TargetSpec::stack());
    let expression = emit(ExprContext::Expression, TargetSpec::stack());
    let ret = emit(ExprContext::Return, TargetSpec::stack());
    let direct = emit(ExprContext::Return, TargetSpec::register());

    assert!(statement.is_empty());
    assert_eq!(expression, vec![Op::LoadImm(Immediate::Int(5))]);
    assert_eq!(ret, vec![Op::LoadImm(Immediate::Int(5)), Op::Return]);
    assert_eq!(direct, vec![Op::ReturnImm(Immediate::Int(5))]);
}

#[test]
fn test_shared_tree_emitted_concurrently() {
    let compiler = Compiler::new();
    let body = Arc::new(
        compiler
            .analyze_string("\"shared\" :k [1 2 3] \"shared\"")
            .unwrap(),
    );

    let listings: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let body = Arc::clone(&body);
                s.spawn(move || {
                    let mut unit = CompileUnit::new(format!("unit-{}", i));
                    let mut code = CodeBuffer::new(TargetSpec::stack());
                    for expr in body.iter() {
                        expr.emit(ExprContext::Expression, &mut unit, &mut code).unwrap();
                    }
                    let compiled = unit.finish(code);
                    (compiled.constants, compiled.ops)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (constants, ops) in &listings {
        assert_eq!(constants.len(), 3);
        assert_eq!(ops, &listings[0].1);
        assert_eq!(ops[0], ops[3]);
    }
}

#[test]
fn test_host_object_constants() {
    let widget = Expr::literal(Value::Object(HostObject::new("Widget", 11)));
    let body = vec![widget.clone()];

    let mut unit = CompileUnit::new("objects");
    let mut code = CodeBuffer::new(TargetSpec::stack());
    let err = emit_body(&body, ExprContext::Return, &mut unit, &mut code).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Can't embed Widget constant in code for target 'stack'"
    );

    assert_eq!(
        emit_and_run(&widget, TargetSpec::register()),
        Value::Object(HostObject::new("Widget", 11))
    );
}

#[test]
fn test_reader_errors_surface_with_location() {
    let err = Compiler::new().compile_string("bad", "[1 2\n  (3").unwrap_err();
    assert!(matches!(err, CloveError::Reader { line: 2, .. }));

    let err = Compiler::new().eval_string("(def x 1)").unwrap_err();
    assert!(matches!(err, CloveError::Analyzer(_)));
    assert!(reader::read_string("(def x 1)").is_ok());
}

#[test]
fn test_malformed_tokens_are_errors() {
    let compiler = Compiler::new();
    for source in ["\\nx", "1abc", "[1 2.5.3]", "{:a 1 :a 2}"] {
        let err = compiler.eval_string(source).unwrap_err();
        assert!(err.location().is_some(), "{}: {}", source, err);
    }
    assert_eq!(compiler.eval_string("\\u0041").unwrap(), Value::Char('A'));

    let nested = "[".repeat(200_000);
    let err = compiler.compile_string("deep", &nested).unwrap_err();
    assert!(matches!(err, CloveError::Reader { message, .. } if message == "Nesting too deep"));
}

#[test]
fn test_maps_equal_regardless_of_written_order() {
    let compiler = Compiler::new();
    assert_eq!(
        compiler.eval_string("{:a 1 :b 2}").unwrap(),
        compiler.eval_string("{:b 2 :a 1}").unwrap()
    );
    let body = compiler.analyze_string("{:a 1 :b 2} {:b 2 :a 1}").unwrap();
    let mut unit = CompileUnit::new("maps");
    let mut code = CodeBuffer::new(TargetSpec::stack());
    for expr in &body {
        expr.emit(ExprContext::Expression, &mut unit, &mut code).unwrap();
    }
    assert_eq!(code.ops(), &[Op::LoadConst(ConstSlot(0)), Op::LoadConst(ConstSlot(0))]);
    assert_eq!(unit.pool().len(), 1);
}

#[test]
fn test_compile_file_writes_listing() {
    let dir = std::env::temp_dir().join(format!("clove-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("hello.clj");
    let output = dir.join("hello.lst");
    std::fs::write(&input, "; greeting\n\"Hello, Clove\"\n").unwrap();

    let compiled = Compiler::new().compile_file(&input, &output).unwrap();
    assert_eq!(compiled.name, "hello");
    let listing = std::fs::read_to_string(&output).unwrap();
    assert!(listing.contains("#0 = \"Hello, Clove\""));
    assert!(listing.contains("load.const #0"));

    let missing = Compiler::new().compile_file(&dir.join("missing.clj"), &output);
    assert!(matches!(missing, Err(CloveError::Io(_))));

    let _ = std::fs::remove_dir_all(&dir);
}
