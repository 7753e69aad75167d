//! 发射结果的执行器：一个很小的栈机，用来对照解释执行的结果
use crate::codegen::op::{ConstSlot, Op};
use crate::codegen::unit::CompiledUnit;
use crate::error::{CloveResult, eval_error};
use crate::value::Value;

fn load_const(unit: &CompiledUnit, slot: ConstSlot) -> CloveResult<Value> {
    unit.constant(slot)
        .cloned()
        .ok_or_else(|| eval_error(format!("constant slot {} out of range in unit {}", slot, unit.name)))
}

/// 执行编译单元。执行到末尾而没有返回指令时，返回栈顶值（空栈为 nil）。
pub fn run(unit: &CompiledUnit) -> CloveResult<Value> {
    let mut stack: Vec<Value> = Vec::new();

    for op in &unit.ops {
        match op {
            Op::LoadImm(imm) => stack.push(imm.to_value()),
            Op::LoadConst(slot) => stack.push(load_const(unit, *slot)?),
            Op::Return => {
                return stack
                    .pop()
                    .ok_or_else(|| eval_error("stack underflow on ret"));
            }
            Op::ReturnImm(imm) => return Ok(imm.to_value()),
            Op::ReturnConst(slot) => return load_const(unit, *slot),
        }
    }

    Ok(stack.pop().unwrap_or(Value::Nil))
}
