//! Clove 代码生成
//!
//! 把表达式树按执行上下文发射为目标指令，常量登记在编译单元的常量池中。

pub mod op;
pub mod target;
pub mod pool;
pub mod unit;
pub mod exec;
mod emit;

pub use emit::emit_body;
pub use op::{ConstSlot, Immediate, Op};
pub use pool::ConstantPool;
pub use target::{CodeBuffer, CodeSink, Encoding, TargetSpec};
pub use unit::{CompileUnit, CompiledUnit};
