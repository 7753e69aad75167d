//! 表达式节点
//!
//! 每个节点都支持两种执行方式：直接求值（[`Expr::eval`]，与上下文无关）
//! 和按上下文发射代码（`Expr::emit`，见 `codegen::emit`）。
//! 节点构造后不可变，因此同一棵树可以被多个线程同时读取和发射。

use std::fmt;

use crate::error::CloveResult;
use crate::types::Type;
use crate::value::Value;

/// 表达式在语法上所处的位置，决定发射策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprContext {
    /// 值被丢弃
    Statement,
    /// 值必须留给外层代码使用
    Expression,
    /// 值即函数返回值（尾位置）
    Return,
}

impl fmt::Display for ExprContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprContext::Statement => write!(f, "statement"),
            ExprContext::Expression => write!(f, "expression"),
            ExprContext::Return => write!(f, "return"),
        }
    }
}

/// 表达式节点。新增节点种类时，所有 `match` 都必须处理它。
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
}

/// 字面量节点：持有一个编译期已知、构造后不再改变的值
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    value: Value,
}

pub const NIL_EXPR: Expr = Expr::Literal(LiteralExpr { value: Value::Nil });
pub const TRUE_EXPR: Expr = Expr::Literal(LiteralExpr { value: Value::Bool(true) });
pub const FALSE_EXPR: Expr = Expr::Literal(LiteralExpr { value: Value::Bool(false) });

impl LiteralExpr {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn eval(&self) -> Value {
        self.value.clone()
    }

    pub fn static_type(&self) -> Option<Type> {
        self.value.static_type()
    }
}

impl Expr {
    pub fn literal(value: Value) -> Self {
        Expr::Literal(LiteralExpr::new(value))
    }

    /// 解释执行
    pub fn eval(&self) -> CloveResult<Value> {
        match self {
            Expr::Literal(lit) => Ok(lit.eval()),
        }
    }

    pub fn has_static_type(&self) -> bool {
        self.static_type().is_some()
    }

    pub fn static_type(&self) -> Option<Type> {
        match self {
            Expr::Literal(lit) => lit.static_type(),
        }
    }

    /// 执行后控制流能否顺序落到后续代码
    pub fn has_normal_exit(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
        }
    }
}
