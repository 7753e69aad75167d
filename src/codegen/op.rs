use std::fmt;

use crate::value::Value;

/// 常量池槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstSlot(pub u32);

impl fmt::Display for ConstSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 可以直接编码进指令的常量
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
}

impl Immediate {
    pub fn to_value(self) -> Value {
        match self {
            Immediate::Nil => Value::Nil,
            Immediate::Bool(b) => Value::Bool(b),
            Immediate::Int(n) => Value::Int(n),
            Immediate::Float(x) => Value::Float(x),
            Immediate::Char(c) => Value::Char(c),
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Nil => write!(f, "nil"),
            Immediate::Bool(b) => write!(f, "bool {}", b),
            Immediate::Int(n) => write!(f, "int {}", n),
            Immediate::Float(x) => write!(f, "float {}", Value::Float(*x)),
            Immediate::Char(c) => write!(f, "char {:?}", c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// 把立即数压栈
    LoadImm(Immediate),
    /// 把常量池槽位中的值压栈
    LoadConst(ConstSlot),
    /// 以栈顶值返回
    Return,
    /// 直接返回立即数（目标支持直接返回编码时使用）
    ReturnImm(Immediate),
    /// 直接返回常量池中的值
    ReturnConst(ConstSlot),
}

impl Op {
    pub fn is_return(&self) -> bool {
        matches!(self, Op::Return | Op::ReturnImm(_) | Op::ReturnConst(_))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::LoadImm(imm) => write!(f, "load.imm {}", imm),
            Op::LoadConst(slot) => write!(f, "load.const {}", slot),
            Op::Return => write!(f, "ret"),
            Op::ReturnImm(imm) => write!(f, "ret.imm {}", imm),
            Op::ReturnConst(slot) => write!(f, "ret.const {}", slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_listing() {
        assert_eq!(Op::LoadImm(Immediate::Int(-3)).to_string(), "load.imm int -3");
        assert_eq!(Op::LoadImm(Immediate::Float(2.0)).to_string(), "load.imm float 2.0");
        assert_eq!(Op::LoadConst(ConstSlot(4)).to_string(), "load.const #4");
        assert_eq!(Op::ReturnImm(Immediate::Nil).to_string(), "ret.imm nil");
        assert_eq!(Op::ReturnImm(Immediate::Char('x')).to_string(), "ret.imm char 'x'");
    }

    #[test]
    fn test_return_ops() {
        assert!(Op::Return.is_return());
        assert!(Op::ReturnConst(ConstSlot(0)).is_return());
        assert!(!Op::LoadImm(Immediate::Bool(true)).is_return());
    }
}
