//! 表达式代码发射
use tracing::{debug, trace};

use crate::ast::{Expr, ExprContext, LiteralExpr, NIL_EXPR};
use crate::codegen::op::Op;
use crate::codegen::target::{CodeSink, Encoding};
use crate::codegen::unit::CompileUnit;
use crate::error::CloveResult;

impl Expr {
    /// 按上下文把节点发射到代码接收器，常量登记到 `unit` 的常量池
    pub fn emit(&self, ctx: ExprContext, unit: &mut CompileUnit, sink: &mut dyn CodeSink) -> CloveResult<()> {
        match self {
            Expr::Literal(lit) => lit.emit(ctx, unit, sink),
        }
    }
}

impl LiteralExpr {
    /// 生成字面量代码
    ///
    /// 编码方式由节点的静态类型决定：标量可以内联，其余类型装箱入池。
    /// 语句上下文什么都不发射（产生常量没有副作用），但仍会检查目标
    /// 能否表示该常量，使错误与节点所处位置无关。
    pub fn emit(&self, ctx: ExprContext, unit: &mut CompileUnit, sink: &mut dyn CodeSink) -> CloveResult<()> {
        let static_type = self.static_type();
        let encoding = sink.encoding(self.value(), static_type.as_ref())?;

        if ctx == ExprContext::Statement {
            trace!(value = %self.value(), "literal in statement position elided");
            return Ok(());
        }

        let (load, fused_return) = match encoding {
            Encoding::Immediate(imm) => (Op::LoadImm(imm), Op::ReturnImm(imm)),
            Encoding::Pooled => {
                let slot = unit.intern(self.value())?;
                (Op::LoadConst(slot), Op::ReturnConst(slot))
            }
        };

        match ctx {
            ExprContext::Statement | ExprContext::Expression => sink.emit_op(load),
            ExprContext::Return if sink.target().direct_return => sink.emit_op(fused_return),
            ExprContext::Return => {
                sink.emit_op(load)?;
                sink.emit_op(Op::Return)
            }
        }
    }
}

/// 顺序执行时可达的前缀长度：到第一个没有正常出口的节点为止（含该节点）
fn reachable_len<T>(items: &[T], has_normal_exit: impl Fn(&T) -> bool) -> usize {
    items
        .iter()
        .position(|item| !has_normal_exit(item))
        .map_or(items.len(), |i| i + 1)
}

/// 发射一串顺序执行的节点：除最后一个外都在语句上下文中发射，
/// 最后一个使用 `ctx`。空序列等价于 `nil`。
/// 没有正常出口的节点之后的代码不可达，直接省略，该节点本身使用 `ctx`。
pub fn emit_body(body: &[Expr], ctx: ExprContext, unit: &mut CompileUnit, sink: &mut dyn CodeSink) -> CloveResult<()> {
    let reachable = reachable_len(body, Expr::has_normal_exit);
    if reachable < body.len() {
        debug!(
            unit = %unit.name(),
            elided = body.len() - reachable,
            "unreachable code after non-returning expression"
        );
    }

    let Some((last, init)) = body[..reachable].split_last() else {
        return NIL_EXPR.emit(ctx, unit, sink);
    };

    for expr in init {
        expr.emit(ExprContext::Statement, unit, sink)?;
    }
    last.emit(ctx, unit, sink)
}
