//! 运行时值
//!
//! 读取器产生的 form 和解释执行得到的结果共用同一种表示。
use std::fmt;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;

use crate::types::Type;

/// 宿主对象的不透明句柄。读取器永远不会产生它，只能由宿主代码构造。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostObject {
    pub type_name: Arc<str>,
    pub id: u64,
}

impl HostObject {
    pub fn new(type_name: &str, id: u64) -> Self {
        Self {
            type_name: Arc::from(type_name),
            id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
    /// 关键字，不含前导 `:`
    Keyword(String),
    Symbol(String),
    List(Vec<Value>),
    Vector(Vec<Value>),
    /// 保持书写顺序的键值对，键互不相同；比较和哈希与顺序无关
    Map(Vec<(Value, Value)>),
    Object(HostObject),
}

impl Value {
    pub fn keyword(name: &str) -> Self {
        Value::Keyword(name.to_string())
    }

    pub fn symbol(name: &str) -> Self {
        Value::Symbol(name.to_string())
    }

    pub fn string(s: &str) -> Self {
        Value::String(s.to_string())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// 值的静态类型；`nil` 没有静态类型
    pub fn static_type(&self) -> Option<Type> {
        let ty = match self {
            Value::Nil => return None,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int64,
            Value::Float(_) => Type::Float64,
            Value::Char(_) => Type::Char,
            Value::String(_) => Type::String,
            Value::Keyword(_) => Type::Keyword,
            Value::Symbol(_) => Type::Symbol,
            Value::List(_) => Type::List,
            Value::Vector(_) => Type::Vector,
            Value::Map(_) => Type::Map,
            Value::Object(obj) => Type::Object(obj.type_name.to_string()),
        };
        Some(ty)
    }

    /// 用于错误信息的类型名
    pub fn type_name(&self) -> String {
        self.static_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "nil".to_string())
    }
}

// 常量池按结构去重：变体必须相同，浮点数按位比较（NaN 等于自身，0.0 与 -0.0 不同），
// map 按键值对集合比较。
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a.len() == b.len() && a.iter().all(|e| b.contains(e)),
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Char(c) => c.hash(state),
            Value::String(s) | Value::Keyword(s) | Value::Symbol(s) => s.hash(state),
            Value::List(items) | Value::Vector(items) => items.hash(state),
            Value::Map(entries) => {
                let mut sum = 0u64;
                for entry in entries {
                    let mut hasher = DefaultHasher::new();
                    entry.hash(&mut hasher);
                    sum = sum.wrapping_add(hasher.finish());
                }
                entries.len().hash(state);
                sum.hash(state);
            }
            Value::Object(obj) => obj.hash(state),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    /// 以读取器语法打印
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => {
                if x.is_nan() {
                    write!(f, "##NaN")
                } else if x.is_infinite() {
                    write!(f, "{}", if *x > 0.0 { "##Inf" } else { "##-Inf" })
                } else if x.fract() == 0.0 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Value::Char(c) => match c {
                '\n' => write!(f, "\\newline"),
                ' ' => write!(f, "\\space"),
                '\t' => write!(f, "\\tab"),
                _ => write!(f, "\\{}", c),
            },
            Value::String(s) => {
                let escaped = s.replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n")
                    .replace('\t', "\\t");
                write!(f, "\"{}\"", escaped)
            }
            Value::Keyword(k) => write!(f, ":{}", k),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => write_seq(f, "(", items, ")"),
            Value::Vector(items) => write_seq(f, "[", items, "]"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => write!(f, "#object[{} {}]", obj.type_name, obj.id),
        }
    }
}
