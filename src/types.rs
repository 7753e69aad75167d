use std::fmt;

/// 编译期可知的静态类型描述符
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int64,
    Float64,
    Char,
    String,
    Keyword,
    Symbol,
    List,
    Vector,
    Map,
    /// 宿主对象，携带宿主类型名
    Object(String),
}

impl Type {
    /// 可以不装箱直接传递的标量类型
    pub fn is_primitive(&self) -> bool {
        matches!(self,
            Type::Bool |
            Type::Int64 |
            Type::Float64 |
            Type::Char
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int64 => write!(f, "long"),
            Type::Float64 => write!(f, "double"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::Keyword => write!(f, "keyword"),
            Type::Symbol => write!(f, "symbol"),
            Type::List => write!(f, "list"),
            Type::Vector => write!(f, "vector"),
            Type::Map => write!(f, "map"),
            Type::Object(name) => write!(f, "{}", name),
        }
    }
}
