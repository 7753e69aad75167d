use logos::Logos;
use crate::error::{CloveResult, lexer_error};
use crate::error::SourceLocation;

fn unescape_string(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }
    Some(out)
}

fn char_literal(body: &str) -> Option<char> {
    match body {
        "newline" => Some('\n'),
        "space" => Some(' '),
        "tab" => Some('\t'),
        "return" => Some('\r'),
        _ if body.len() == 5 && body.starts_with('u') => {
            let code = u32::from_str_radix(&body[1..], 16).ok()?;
            char::from_u32(code)
        }
        _ => {
            let mut chars = body.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(c)
        }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f,]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    // 分隔符
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("'")]
    Quote,

    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // 字面量
    #[regex(r"[+-]?(?:0[xX][0-9a-fA-F]+|[0-9]+)", priority = 10, callback = |lex| {
        let slice = lex.slice();
        let (negative, digits) = match slice.as_bytes()[0] {
            b'-' => (true, &slice[1..]),
            b'+' => (false, &slice[1..]),
            _ => (false, slice),
        };
        let magnitude = if digits.starts_with("0x") || digits.starts_with("0X") {
            i128::from_str_radix(&digits[2..], 16).ok()?
        } else {
            digits.parse::<i128>().ok()?
        };
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value).ok()
    })]
    IntegerLiteral(i64),

    #[regex(r"[+-]?[0-9]+(?:\.[0-9]*(?:[eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)", priority = 10, callback = |lex| {
        lex.slice().parse::<f64>().ok()
    })]
    FloatLiteral(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    StringLiteral(String),

    #[regex(r"\\(?:newline|space|tab|return|u[0-9a-fA-F]{4}|[^ \t\r\n\f,()\[\]{}])", |lex| {
        char_literal(&lex.slice()[1..])
    })]
    CharLiteral(char),

    #[regex(r":[a-zA-Z0-9*+!_?<>=/.\-]+", |lex| lex.slice()[1..].to_string())]
    Keyword(String),

    // 标识符
    #[regex(r"[a-zA-Z*+!_?<>=/.\-&][a-zA-Z0-9*+!_?<>=/.\-&']*", |lex| lex.slice().to_string())]
    Symbol(String),
}

/// 数字和字符字面量之后必须紧跟的分隔字符
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | '"' | '(' | ')' | '[' | ']' | '{' | '}')
}

impl Token {
    /// 数字和字符字面量不能与后面的字符粘连
    fn needs_delimiter(&self) -> bool {
        matches!(
            self,
            Token::IntegerLiteral(_) | Token::FloatLiteral(_) | Token::CharLiteral(_)
        )
    }

    /// 用于错误信息的简短描述
    pub fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Quote => "quote".to_string(),
            Token::Nil => "nil".to_string(),
            Token::True => "true".to_string(),
            Token::False => "false".to_string(),
            Token::IntegerLiteral(n) => format!("integer {}", n),
            Token::FloatLiteral(x) => format!("float {}", x),
            Token::StringLiteral(_) => "string literal".to_string(),
            Token::CharLiteral(c) => format!("character {:?}", c),
            Token::Keyword(k) => format!("keyword :{}", k),
            Token::Symbol(s) => format!("symbol {}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenWithLocation {
    pub token: Token,
    pub loc: SourceLocation,
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    line: usize,
    line_start: usize,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            line: 1,
            line_start: 0,
            cursor: 0,
        }
    }

    /// 把行列位置推进到字节偏移 `offset` 处
    fn advance_to(&mut self, offset: usize) -> SourceLocation {
        for (i, b) in self.source.as_bytes()[self.cursor..offset].iter().enumerate() {
            if *b == b'\n' {
                self.line += 1;
                self.line_start = self.cursor + i + 1;
            }
        }
        self.cursor = offset;
        SourceLocation {
            line: self.line,
            column: self.source[self.line_start..offset].chars().count() + 1,
        }
    }

    pub fn tokenize(&mut self) -> CloveResult<Vec<TokenWithLocation>> {
        let mut tokens = Vec::new();

        while let Some(token_result) = self.inner.next() {
            let span = self.inner.span();
            let loc = self.advance_to(span.start);
            match token_result {
                Ok(token) => {
                    let rest = &self.source[span.end..];
                    if token.needs_delimiter() && !rest.starts_with(is_delimiter) && !rest.is_empty() {
                        let end = rest.find(is_delimiter).map_or(self.source.len(), |i| span.end + i);
                        let text = &self.source[span.start..end];
                        let message = match token {
                            Token::CharLiteral(_) => format!("Unsupported character: {}", text),
                            _ => format!("Invalid number: {}", text),
                        };
                        return Err(lexer_error(loc.line, loc.column, message));
                    }
                    tokens.push(TokenWithLocation { token, loc });
                }
                Err(_) => {
                    let text = &self.source[span];
                    let message = if text.starts_with('"') {
                        format!("Invalid string literal: {}", text)
                    } else if text.starts_with('\\') {
                        format!("Unsupported character: {}", text)
                    } else if text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
                        format!("Invalid number: {}", text)
                    } else {
                        format!("Unexpected character: '{}'", text)
                    };
                    return Err(lexer_error(loc.line, loc.column, message));
                }
            }
        }

        Ok(tokens)
    }
}

pub fn lex(source: &str) -> CloveResult<Vec<TokenWithLocation>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}
