//! 目标后端描述和代码接收器
use tracing::trace;

use crate::ast::ExprContext;
use crate::codegen::op::{Immediate, Op};
use crate::error::{CloveError, CloveResult, context_error};
use crate::types::Type;
use crate::value::Value;

/// 常量在目标上的编码方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoding {
    /// 直接编码进指令
    Immediate(Immediate),
    /// 放入编译单元的常量池，按槽位引用
    Pooled,
}

/// 目标后端的能力描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: String,
    /// 可内联整数的有符号位宽，0 表示整数一律入池
    pub immediate_int_bits: u32,
    pub inline_floats: bool,
    pub inline_chars: bool,
    /// 是否支持 `ret.imm` / `ret.const` 这类直接返回编码
    pub direct_return: bool,
    /// 是否能把宿主对象嵌入常量池
    pub embed_host_objects: bool,
}

impl TargetSpec {
    /// 默认的栈式目标
    pub fn stack() -> Self {
        Self {
            name: "stack".to_string(),
            immediate_int_bits: 32,
            inline_floats: false,
            inline_chars: true,
            direct_return: false,
            embed_host_objects: false,
        }
    }

    /// 指令尽量短：只内联 8 位整数
    pub fn compact() -> Self {
        Self {
            name: "compact".to_string(),
            immediate_int_bits: 8,
            inline_floats: false,
            inline_chars: false,
            direct_return: false,
            embed_host_objects: false,
        }
    }

    /// 寄存器式目标：64 位立即数，支持直接返回
    pub fn register() -> Self {
        Self {
            name: "register".to_string(),
            immediate_int_bits: 64,
            inline_floats: true,
            inline_chars: true,
            direct_return: true,
            embed_host_objects: true,
        }
    }

    pub fn named(name: &str) -> Option<Self> {
        match name {
            "stack" => Some(Self::stack()),
            "compact" => Some(Self::compact()),
            "register" => Some(Self::register()),
            _ => None,
        }
    }

    pub fn fits_immediate_int(&self, n: i64) -> bool {
        match self.immediate_int_bits {
            0 => false,
            bits if bits >= 64 => true,
            bits => {
                let max = (1i64 << (bits - 1)) - 1;
                let min = -max - 1;
                (min..=max).contains(&n)
            }
        }
    }

    /// 按节点的静态类型决定常量的编码方式
    ///
    /// 没有静态类型的只有 `nil`，直接内联；标量类型在目标允许时内联；
    /// 其余类型一律装箱放入常量池。宿主对象无法嵌入时返回 `UnrepresentableConstant`。
    pub fn encoding(&self, value: &Value, static_type: Option<&Type>) -> CloveResult<Encoding> {
        let Some(ty) = static_type else {
            return Ok(if value.is_nil() {
                Encoding::Immediate(Immediate::Nil)
            } else {
                Encoding::Pooled
            });
        };

        if !ty.is_primitive() {
            return match ty {
                Type::Object(type_name) if !self.embed_host_objects => {
                    Err(CloveError::UnrepresentableConstant {
                        type_name: type_name.clone(),
                        target: self.name.clone(),
                    })
                }
                _ => Ok(Encoding::Pooled),
            };
        }

        let immediate = match (ty, value) {
            (Type::Bool, Value::Bool(b)) => Some(Immediate::Bool(*b)),
            (Type::Int64, Value::Int(n)) if self.fits_immediate_int(*n) => Some(Immediate::Int(*n)),
            (Type::Float64, Value::Float(x)) if self.inline_floats => Some(Immediate::Float(*x)),
            (Type::Char, Value::Char(c)) if self.inline_chars => Some(Immediate::Char(*c)),
            _ => None,
        };
        Ok(immediate.map_or(Encoding::Pooled, Encoding::Immediate))
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::stack()
    }
}

/// 代码接收器：节点把指令按发射顺序追加到这里
pub trait CodeSink {
    fn target(&self) -> &TargetSpec;

    fn encoding(&self, value: &Value, static_type: Option<&Type>) -> CloveResult<Encoding> {
        self.target().encoding(value, static_type)
    }

    fn emit_op(&mut self, op: Op) -> CloveResult<()>;
}

/// 内存中的指令缓冲区
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    target: TargetSpec,
    ops: Vec<Op>,
    terminated: bool,
}

impl CodeBuffer {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            target,
            ops: Vec::new(),
            terminated: false,
        }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    /// 是否已经发射了返回指令
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl CodeSink for CodeBuffer {
    fn target(&self) -> &TargetSpec {
        &self.target
    }

    fn emit_op(&mut self, op: Op) -> CloveResult<()> {
        if self.terminated {
            return Err(context_error(
                ExprContext::Return,
                format!("code after return point is unreachable: {}", op),
            ));
        }
        trace!(op = %op, "emit");
        self.terminated = op.is_return();
        self.ops.push(op);
        Ok(())
    }
}
