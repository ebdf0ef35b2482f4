//! Python literal rendering and parsing.
//!
//! Field values are JSON values; scripts carry them as Python literals. The
//! renderer emits what Python's `repr` would for the same data (single quoted
//! strings, `True`/`False`/`None`), always on one line. The parser accepts
//! that output back, plus double quoted strings and tuples, which is enough
//! to read any generated script.

use rifs_core::{Error, Result};
use serde_json::{Map, Number, Value};

/// Render a value as a Python literal.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Render ordered keyword arguments as a Python dict literal.
pub fn render_kwargs(kwargs: &[(String, Value)]) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in kwargs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_str(&mut out, key);
        out.push_str(": ");
        write_value(&mut out, value);
    }
    out.push('}');
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_str(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_str(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        // Debug keeps a trailing `.0` on whole floats, which Python needs to
        // read the value back as a float.
        out.push_str(&format!("{f:?}"));
    }
}

fn write_str(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{code:02x}"));
                } else {
                    out.push_str(&format!("\\u{code:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Parse a single Python literal.
///
/// # Errors
///
/// Returns [`Error::Literal`] with the byte offset of the first problem.
pub fn parse(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.finish()?;
    Ok(value)
}

/// Parse a Python dict literal with string keys, keeping key order.
///
/// # Errors
///
/// Returns [`Error::Literal`] if the text is not such a dict.
pub fn parse_kwargs(text: &str) -> Result<Vec<(String, Value)>> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let entries = parser.dict_entries()?;
    parser.finish()?;
    Ok(entries)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::literal(self.pos, message)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        if self.pos < self.src.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(())
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_ws();
        match self.peek() {
            Some('\'' | '"') => self.string().map(Value::String),
            Some('[') => {
                self.pos += 1;
                self.sequence(']').map(Value::Array)
            }
            Some('(') => {
                self.pos += 1;
                self.sequence(')').map(Value::Array)
            }
            Some('{') => {
                let entries = self.dict_entries()?;
                Ok(Value::Object(entries.into_iter().collect::<Map<_, _>>()))
            }
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.keyword(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn keyword(&mut self) -> Result<Value> {
        let start = self.pos;
        while let Some(c) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
            self.pos += c.len_utf8();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            other => Err(Error::literal(start, format!("unsupported name '{other}'"))),
        }
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.pos += 1;
                    }
                    continue;
                }
                _ => break,
            }
            self.pos += 1;
        }

        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let text = text.strip_prefix('+').unwrap_or(&text);
        let invalid = || Error::literal(start, format!("invalid number '{text}'"));

        if is_float {
            let f: f64 = text.parse().map_err(|_| invalid())?;
            Number::from_f64(f).map(Value::Number).ok_or_else(invalid)
        } else if let Ok(i) = text.parse::<i64>() {
            Ok(Value::Number(i.into()))
        } else {
            text.parse::<u64>()
                .map(|u| Value::Number(u.into()))
                .map_err(|_| invalid())
        }
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        let quote = self.bump().ok_or_else(|| self.error("expected a string"))?;
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(Error::literal(start, "unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        let simple = match c {
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            'x' => return self.hex_escape(2),
            'u' => return self.hex_escape(4),
            'U' => return self.hex_escape(8),
            other => return Err(self.error(format!("unsupported escape '\\{other}'"))),
        };
        Ok(simple)
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char> {
        let start = self.pos;
        let end = start + digits;
        let hex = self
            .src
            .get(start..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| Error::literal(start, "escape is not a valid character"))
    }

    /// Items up to `close`; the opening bracket is already consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            if !self.eat(',') {
                self.skip_ws();
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn dict_entries(&mut self) -> Result<Vec<(String, Value)>> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(entries);
            }
            if !matches!(self.peek(), Some('\'' | '"')) {
                return Err(self.error("dict keys must be strings"));
            }
            let key = self.string()?;
            self.skip_ws();
            self.expect(':')?;
            let value = self.value()?;
            entries.push((key, value));
            self.skip_ws();
            if !self.eat(',') {
                self.skip_ws();
                self.expect('}')?;
                return Ok(entries);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn renders_python_scalars() {
        assert_eq!(render(&json!(null)), "None");
        assert_eq!(render(&json!(true)), "True");
        assert_eq!(render(&json!(false)), "False");
        assert_eq!(render(&json!(42)), "42");
        assert_eq!(render(&json!(-7)), "-7");
        assert_eq!(render(&json!(1.5)), "1.5");
        assert_eq!(render(&json!(2.0)), "2.0");
        assert_eq!(render(&json!("world")), "'world'");
    }

    #[test]
    fn renders_strings_like_repr() {
        assert_eq!(render(&json!("it's")), "\"it's\"");
        assert_eq!(render(&json!("a'b\"c")), "'a\\'b\"c'");
        assert_eq!(render(&json!("C:\\comp\nv2")), "'C:\\\\comp\\nv2'");
        assert_eq!(render(&json!("\u{1}")), "'\\x01'");
    }

    #[test]
    fn renders_containers() {
        assert_eq!(render(&json!(["me", "you"])), "['me', 'you']");
        assert_eq!(render(&json!([])), "[]");
        assert_eq!(render(&json!({"a": 1, "b": [true]})), "{'a': 1, 'b': [True]}");
    }

    #[test]
    fn kwargs_keep_order() {
        let kwargs = vec![
            ("subject".to_string(), json!("world")),
            ("name".to_string(), json!("demo")),
        ];
        assert_eq!(render_kwargs(&kwargs), "{'subject': 'world', 'name': 'demo'}");
        assert_eq!(render_kwargs(&[]), "{}");
    }

    #[test]
    fn parses_rendered_output() {
        let value = json!({
            "frames": "1001-1100",
            "gpu": true,
            "nodes": ["Write1", "Write2"],
            "scale": 0.5,
            "count": 3,
            "missing": null,
            "quote": "it's \"here\"",
            "path": "C:\\shots\n",
        });
        assert_eq!(parse(&render(&value)).unwrap(), value);
    }

    #[test]
    fn parses_python_extras() {
        assert_eq!(parse("('a', 1,)").unwrap(), json!(["a", 1]));
        assert_eq!(parse("\"double\"").unwrap(), json!("double"));
        assert_eq!(parse("1_000").unwrap(), json!(1000));
        assert_eq!(parse("-1e3").unwrap(), json!(-1000.0));
        assert_eq!(parse("'\\u00e9'").unwrap(), json!("\u{e9}"));
        assert_eq!(parse(" [1, 2, ] ").unwrap(), json!([1, 2]));
    }

    #[test]
    fn parse_kwargs_keeps_order() {
        let kwargs = parse_kwargs("{'z': 1, 'a': 'two'}").unwrap();
        let keys: Vec<&str> = kwargs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn parse_errors_carry_offsets() {
        assert_matches!(parse("'open"), Err(Error::Literal { offset: 0, .. }));
        assert_matches!(parse("[1, 2"), Err(Error::Literal { offset: 5, .. }));
        assert_matches!(parse("print"), Err(Error::Literal { .. }));
        assert_matches!(parse("1 2"), Err(Error::Literal { offset: 2, .. }));
        assert_matches!(parse_kwargs("{1: 2}"), Err(Error::Literal { offset: 1, .. }));
        assert_matches!(parse_kwargs("[]"), Err(Error::Literal { .. }));
    }
}
