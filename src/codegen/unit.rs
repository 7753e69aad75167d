//! 编译单元
use std::fmt;
use tracing::debug;

use crate::codegen::op::{ConstSlot, Op};
use crate::codegen::pool::{ConstantPool, slot_at};
use crate::codegen::target::{CodeBuffer, CodeSink};
use crate::error::CloveResult;
use crate::value::Value;

/// 一个编译单元（一个顶层 form 及其子树）在发射过程中的可变状态。
/// 每个单元独占自己的常量池，不同单元可以在不同线程上并行编译。
#[derive(Debug, Clone)]
pub struct CompileUnit {
    name: String,
    pool: ConstantPool,
}

impl CompileUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pool: ConstantPool::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &ConstantPool {
        &self.pool
    }

    pub fn intern(&mut self, value: &Value) -> CloveResult<ConstSlot> {
        self.pool.intern(value)
    }

    /// 结束发射，得到可执行的编译结果
    pub fn finish(self, code: CodeBuffer) -> CompiledUnit {
        let target = code.target().name.clone();
        let ops = code.into_ops();
        debug!(
            unit = %self.name,
            ops = ops.len(),
            constants = self.pool.len(),
            "finished compile unit"
        );
        CompiledUnit {
            name: self.name,
            target,
            constants: self.pool.into_values(),
            ops,
        }
    }
}

/// 编译完成的单元：指令序列和它引用的常量
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUnit {
    pub name: String,
    pub target: String,
    pub constants: Vec<Value>,
    pub ops: Vec<Op>,
}

impl CompiledUnit {
    pub fn constant(&self, slot: ConstSlot) -> Option<&Value> {
        self.constants.get(slot.0 as usize)
    }
}

impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; unit {} (target {})", self.name, self.target)?;
        if !self.constants.is_empty() {
            writeln!(f, "; constants")?;
            for (i, value) in self.constants.iter().enumerate() {
                let slot = slot_at(i).map_err(|_| fmt::Error)?;
                writeln!(f, ";   {} = {}", slot, value)?;
            }
        }
        for (i, op) in self.ops.iter().enumerate() {
            writeln!(f, "{:>4}: {}", i, op)?;
        }
        Ok(())
    }
}
