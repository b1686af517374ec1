//! Safe evaluation of container and number literals found in inlists.
//!
//! Accepts integers, floats, quoted strings, `True`/`False`/`None`, and
//! arbitrarily nested lists `[...]` and tuples `(...)`. Nothing is executed;
//! any other construct is rejected.

use crate::domain::error::DomainError;
use crate::domain::value::InlistValue;

/// Evaluate a literal expression
pub fn evaluate(text: &str) -> Result<InlistValue, DomainError> {
    let mut parser = LiteralParser {
        src: text,
        chars: text.char_indices().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(parser.fail("unexpected trailing characters"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl LiteralParser<'_> {
    fn fail(&self, message: &str) -> DomainError {
        let offset = self
            .chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.src.len());
        DomainError::invalid_literal(self.src, format!("{} at offset {}", message, offset))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Result<InlistValue, DomainError> {
        self.skip_ws();
        match self.peek() {
            Some('[') => {
                self.pos += 1;
                let (items, _) = self.sequence(']')?;
                Ok(InlistValue::List(items))
            }
            Some('(') => {
                self.pos += 1;
                let (mut items, trailing_comma) = self.sequence(')')?;
                // `(x)` is a parenthesized value, `(x,)` a one-element tuple
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(InlistValue::Tuple(items))
                }
            }
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                self.string(q).map(InlistValue::Str)
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '.' | '+' | '-') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(_) => Err(self.fail("unsupported expression")),
            None => Err(self.fail("unexpected end of input")),
        }
    }

    /// Comma separated values up to `close`; reports whether a trailing comma was present
    fn sequence(&mut self, close: char) -> Result<(Vec<InlistValue>, bool), DomainError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.eat(close) {
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            trailing_comma = self.eat(',');
            if !trailing_comma {
                if self.eat(close) {
                    return Ok((items, false));
                }
                return Err(self.fail(&format!("expected ',' or '{}'", close)));
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, DomainError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.fail("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.fail("unterminated escape"))?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' => out.push(escaped),
                        '\n' => {}
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn name(&mut self) -> Result<InlistValue, DomainError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
        match ident.as_str() {
            "True" => Ok(InlistValue::Bool(true)),
            "False" => Ok(InlistValue::Bool(false)),
            "None" => Ok(InlistValue::None),
            _ => {
                self.pos = start;
                Err(self.fail(&format!("name '{}' is not a literal", ident)))
            }
        }
    }

    fn number(&mut self) -> Result<InlistValue, DomainError> {
        // At most one sign; `--8` is not a literal.
        let mut negative = false;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            negative = sign == '-';
            self.pos += 1;
            self.skip_ws();
        }

        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
            || (matches!(self.peek(), Some('+' | '-')) && self.after_exponent_marker())
        {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
        if raw.is_empty() {
            return Err(self.fail("expected a number"));
        }

        if let Some(int) = parse_int(&raw, negative) {
            let int = int.map_err(|message| DomainError::invalid_literal(self.src, message))?;
            return Ok(InlistValue::Int(int));
        }

        let float = parse_float(&raw)
            .ok_or_else(|| DomainError::invalid_literal(self.src, format!("invalid number '{}'", raw)))?;
        Ok(InlistValue::Float(if negative { -float } else { float }))
    }

    // A sign only continues a number directly after a decimal exponent marker.
    fn after_exponent_marker(&self) -> bool {
        let Some((_, prev)) = self.pos.checked_sub(1).and_then(|i| self.chars.get(i)) else {
            return false;
        };
        if !matches!(*prev, 'e' | 'E') {
            return false;
        }
        let start = self.chars[..self.pos]
            .iter()
            .rposition(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(*c, '_' | '.')))
            .map_or(0, |i| i + 1);
        let head: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
        !head.starts_with("0x") && !head.starts_with("0X")
    }
}

fn strip_underscores(digits: &str) -> Option<String> {
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }
    Some(digits.replace('_', ""))
}

/// `None` when `raw` is not integer-shaped; `Some(Err)` on overflow.
/// The sign is applied before the range check so `i64::MIN` fits.
fn parse_int(raw: &str, negative: bool) -> Option<Result<i64, String>> {
    let lower = raw.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest.trim_start_matches('_'), 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest.trim_start_matches('_'), 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest.trim_start_matches('_'), 2)
    } else if lower.chars().all(|c| c.is_ascii_digit() || c == '_') {
        // leading zeros are only allowed for zero itself
        let trimmed = lower.replace('_', "");
        if trimmed.len() > 1 && trimmed.starts_with('0') && trimmed.chars().any(|c| c != '0') {
            return None;
        }
        (lower.as_str(), 10)
    } else {
        return None;
    };
    let clean = strip_underscores(digits)?;
    if !clean.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let signed = if negative { format!("-{clean}") } else { clean };
    Some(
        i64::from_str_radix(&signed, radix)
            .map_err(|_| format!("integer '{}' does not fit in 64 bits", raw)),
    )
}

fn parse_float(raw: &str) -> Option<f64> {
    let lower = raw.to_ascii_lowercase();
    let (mantissa, exponent) = match lower.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (lower.as_str(), None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return None;
    }
    let mut text = String::new();
    if !int_part.is_empty() {
        text.push_str(&strip_underscores(int_part)?);
    }
    if let Some(frac) = frac_part {
        text.push('.');
        if !frac.is_empty() {
            text.push_str(&strip_underscores(frac)?);
        }
    }
    if let Some(exp) = exponent {
        let (sign, digits) = match exp.strip_prefix(['+', '-']) {
            Some(rest) => (&exp[..1], rest),
            None => ("", exp),
        };
        text.push('e');
        text.push_str(sign);
        text.push_str(&strip_underscores(digits)?);
    } else if frac_part.is_none() {
        return None;
    }
    if !text.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-')) {
        return None;
    }
    text.parse::<f64>().ok()
}
