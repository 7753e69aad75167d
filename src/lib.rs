pub mod error;
pub mod types;
pub mod value;
pub mod lexer;
pub mod reader;
pub mod analyzer;
pub mod ast;
pub mod codegen;

use std::path::Path;
use tracing::debug;

use ast::{Expr, ExprContext};
use codegen::{CodeBuffer, CompileUnit, CompiledUnit, TargetSpec};
use error::{CloveError, CloveResult};
use value::Value;

pub struct Compiler {
    target: TargetSpec,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_target(TargetSpec::default())
    }

    pub fn with_target(target: TargetSpec) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    /// 读取一个顶层 form 并直接解释执行
    pub fn eval_string(&self, source: &str) -> CloveResult<Value> {
        let form = reader::read_string(source)?;
        let expr = analyzer::analyze(&form)?;
        expr.eval()
    }

    /// 读取并分析源码中的全部顶层 form
    pub fn analyze_string(&self, source: &str) -> CloveResult<Vec<Expr>> {
        let forms = reader::read_all(source)?;
        forms.iter().map(analyzer::analyze).collect()
    }

    /// 把源码中的全部顶层 form 编译为一个单元，最后一个 form 的值作为返回值
    pub fn compile_string(&self, name: &str, source: &str) -> CloveResult<CompiledUnit> {
        let body = self.analyze_string(source)?;
        debug!(unit = name, forms = body.len(), target = %self.target.name, "compiling unit");

        let mut unit = CompileUnit::new(name);
        let mut code = CodeBuffer::new(self.target.clone());
        codegen::emit_body(&body, ExprContext::Return, &mut unit, &mut code)?;
        Ok(unit.finish(code))
    }

    /// 编译源文件，并把指令清单写到 `output_path`
    pub fn compile_file(&self, input_path: &Path, output_path: &Path) -> CloveResult<CompiledUnit> {
        let source = std::fs::read_to_string(input_path)
            .map_err(|e| CloveError::Io(format!("{}: {}", input_path.display(), e)))?;
        let name = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("main");
        let compiled = self.compile_string(name, &source)?;

        std::fs::write(output_path, compiled.to_string())
            .map_err(|e| CloveError::Io(format!("{}: {}", output_path.display(), e)))?;

        Ok(compiled)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
