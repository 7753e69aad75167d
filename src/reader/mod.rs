//! 读取器
//!
//! 把词法单元流读取为 form。form 直接用 [`Value`] 表示，
//! `'x` 读取为 `(quote x)`。

use std::collections::HashSet;

use crate::error::{CloveResult, SourceLocation, reader_error};
use crate::lexer::{self, Token, TokenWithLocation};
use crate::value::Value;

/// 集合与 quote 的最大嵌套层数
pub const MAX_NESTING_DEPTH: usize = 256;

/// 读取器
pub struct Reader {
    /// 令牌流
    tokens: Vec<TokenWithLocation>,
    /// 当前读取位置
    pos: usize,
    /// 输入末尾的位置，用于报告"意外结束"
    end: SourceLocation,
    /// 当前嵌套层数
    depth: usize,
}

impl Reader {
    pub fn new(tokens: Vec<TokenWithLocation>, end: SourceLocation) -> Self {
        Self { tokens, pos: 0, end, depth: 0 }
    }

    pub fn from_source(source: &str) -> CloveResult<Self> {
        let tokens = lexer::lex(source)?;
        let end = SourceLocation {
            line: source.lines().count().max(1),
            column: source.lines().last().map_or(0, |l| l.chars().count()) + 1,
        };
        Ok(Self::new(tokens, end))
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_loc(&self) -> SourceLocation {
        self.tokens.get(self.pos).map_or(self.end, |t| t.loc)
    }

    fn advance(&mut self) -> Option<TokenWithLocation> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// 读取下一个顶层 form
    pub fn read_form(&mut self) -> CloveResult<Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(reader_error(self.current_loc(), "Nesting too deep"));
        }
        self.depth += 1;
        let form = self.read_form_at_depth();
        self.depth -= 1;
        form
    }

    fn read_form_at_depth(&mut self) -> CloveResult<Value> {
        let Some(TokenWithLocation { token, loc }) = self.advance() else {
            return Err(reader_error(self.end, "EOF while reading"));
        };

        match token {
            Token::Nil => Ok(Value::Nil),
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::IntegerLiteral(n) => Ok(Value::Int(n)),
            Token::FloatLiteral(x) => Ok(Value::Float(x)),
            Token::StringLiteral(s) => Ok(Value::String(s)),
            Token::CharLiteral(c) => Ok(Value::Char(c)),
            Token::Keyword(k) => Ok(Value::Keyword(k)),
            Token::Symbol(s) => Ok(Value::Symbol(s)),
            Token::Quote => {
                let quoted = self.read_form()?;
                Ok(Value::List(vec![Value::symbol("quote"), quoted]))
            }
            Token::LParen => Ok(Value::List(self.read_delimited(Token::RParen, loc)?)),
            Token::LBracket => Ok(Value::Vector(self.read_delimited(Token::RBracket, loc)?)),
            Token::LBrace => {
                let items = self.read_delimited(Token::RBrace, loc)?;
                if items.len() % 2 != 0 {
                    return Err(reader_error(loc, "Map literal must contain an even number of forms"));
                }
                if let Some(key) = first_duplicate(items.iter().step_by(2)) {
                    return Err(reader_error(loc, format!("Duplicate key: {}", key)));
                }
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut items = items.into_iter();
                while let (Some(k), Some(v)) = (items.next(), items.next()) {
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            Token::RParen | Token::RBracket | Token::RBrace => {
                Err(reader_error(loc, format!("Unmatched delimiter: {}", token.describe())))
            }
        }
    }

    fn read_delimited(&mut self, close: Token, open_loc: SourceLocation) -> CloveResult<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            match self.tokens.get(self.pos) {
                None => {
                    return Err(reader_error(
                        self.current_loc(),
                        format!("EOF while reading, starting at line {}", open_loc.line),
                    ));
                }
                Some(t) if t.token == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }
}

/// 返回第一个重复出现的键
pub(crate) fn first_duplicate<'a>(mut keys: impl Iterator<Item = &'a Value>) -> Option<&'a Value> {
    let mut seen = HashSet::new();
    keys.find(|key| !seen.insert(*key))
}

/// 从文本中读取一个顶层 form，之后的输入被忽略
pub fn read_string(source: &str) -> CloveResult<Value> {
    Reader::from_source(source)?.read_form()
}

/// 读取文本中的所有顶层 form
pub fn read_all(source: &str) -> CloveResult<Vec<Value>> {
    let mut reader = Reader::from_source(source)?;
    let mut forms = Vec::new();
    while !reader.is_at_end() {
        forms.push(reader.read_form()?);
    }
    Ok(forms)
}
