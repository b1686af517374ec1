use crate::domain::error::DomainError;
use crate::domain::lexer::{self, TokenKind};
use crate::domain::typer;
use crate::domain::value::{InlistMap, InlistValue};

/// Renders inlist values back into custom `key = value` text
pub struct InlistRenderer;

impl Default for InlistRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl InlistRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render using this renderer instance
    pub fn render_map(&self, values: &InlistMap) -> Result<String, DomainError> {
        Self::render(values)
    }

    /// Render all entries, one assignment per line.
    ///
    /// Every entry is read back through the lexer and typer before it is
    /// written; a key or value that would come back different is
    /// `Unrepresentable`.
    pub fn render(values: &InlistMap) -> Result<String, DomainError> {
        let mut output = String::new();
        for (key, value) in values {
            if !is_plain_key(key) {
                return Err(DomainError::unrepresentable(key));
            }
            let mut text = String::new();
            Self::render_value(key, value, &mut text)?;
            if !reads_back_as(key, &text, value) {
                return Err(DomainError::unrepresentable(key));
            }
            output.push_str(key);
            output.push_str(" = ");
            output.push_str(&text);
            output.push('\n');
        }
        Ok(output)
    }

    fn render_value(
        key: &str,
        value: &InlistValue,
        output: &mut String,
    ) -> Result<(), DomainError> {
        match value {
            InlistValue::None => output.push_str("None"),
            InlistValue::Bool(true) => output.push_str("True"),
            InlistValue::Bool(false) => output.push_str("False"),
            InlistValue::Int(i) => output.push_str(&i.to_string()),
            InlistValue::Float(f) if !f.is_finite() => return Err(DomainError::unrepresentable(key)),
            InlistValue::Float(f) => output.push_str(&render_float(*f)),
            InlistValue::Str(s) => output.push_str(&quote(s)),
            InlistValue::List(items) => {
                output.push('[');
                Self::render_items(key, items, output)?;
                output.push(']');
            }
            InlistValue::Tuple(items) => {
                output.push('(');
                Self::render_items(key, items, output)?;
                if items.len() == 1 {
                    output.push(',');
                }
                output.push(')');
            }
            InlistValue::Table(_) => return Err(DomainError::unrepresentable(key)),
        }
        Ok(())
    }

    fn render_items(
        key: &str,
        items: &[InlistValue],
        output: &mut String,
    ) -> Result<(), DomainError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                output.push(',');
            }
            Self::render_value(key, item, output)?;
        }
        Ok(())
    }
}

fn is_plain_key(key: &str) -> bool {
    matches!(
        lexer::tokenize(key).as_deref(),
        Ok([token]) if token.kind == TokenKind::Word && token.text == key
    )
}

/// Whether `text` lexes as one token that types back to `expected`.
fn reads_back_as(key: &str, text: &str, expected: &InlistValue) -> bool {
    // Substring typing misreads e.g. `[True,False]` as a bool, and `['50%']`
    // loses its tail to the comment marker.
    match lexer::tokenize(text).as_deref() {
        Ok([token]) if token.text == text => {
            typer::type_value(key, &token.text).is_ok_and(|value| &value == expected)
        }
        _ => false,
    }
}

/// Floats always carry a `.` or an exponent so they read back as floats
fn render_float(f: f64) -> String {
    let text = format!("{:?}", f);
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{}.0", text)
    }
}

fn quote(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parsers::InlistHandler;

    fn sample() -> InlistMap {
        let mut map = InlistMap::new();
        map.insert("flag".into(), false.into());
        map.insert("count".into(), (-4i64).into());
        map.insert("ratio".into(), 8.0.into());
        map.insert("tiny".into(), 1e-20.into());
        map.insert("name".into(), "a b c".into());
        map.insert("path".into(), "/path/to/somewhere".into());
        map.insert("nothing".into(), InlistValue::None);
        map.insert("list".into(), InlistValue::from(vec![1i64, 2, 3]));
        map.insert("names".into(), InlistValue::from(vec!["x", "y"]));
        map.insert("single".into(), InlistValue::Tuple(vec![2.5.into()]));
        map.insert("empty".into(), InlistValue::List(vec![]));
        map
    }

    #[test]
    fn renders_assignments() {
        let text = InlistRenderer::render(&sample()).unwrap();
        assert!(text.contains("flag = False\n"));
        assert!(text.contains("ratio = 8.0\n"));
        assert!(text.contains("name = 'a b c'\n"));
        assert!(text.contains("names = ['x','y']\n"));
        assert!(text.contains("single = (2.5,)\n"));
    }

    #[test]
    fn rendered_text_parses_back() {
        let values = sample();
        let text = InlistRenderer::new().render_map(&values).unwrap();
        let reparsed = InlistHandler::new().parse_str(&text, None).unwrap();
        assert_eq!(reparsed, values);
    }

    fn render_one(value: InlistValue) -> Result<String, DomainError> {
        let mut map = InlistMap::new();
        map.insert("v".into(), value);
        InlistRenderer::render(&map)
    }

    #[test]
    fn values_the_typer_would_misread_are_rejected() {
        let cases = vec![
            InlistValue::from(vec![true, false]),
            InlistValue::List(vec![InlistValue::None, 1i64.into()]),
            InlistValue::Tuple(vec![true.into(), 2i64.into()]),
            InlistValue::from(vec!["a b", "c"]),
            InlistValue::from(vec!["50%"]),
            InlistValue::from("it's \"x\""),
            InlistValue::from("'x"),
            InlistValue::from("x'"),
        ];
        for value in cases {
            assert_eq!(
                render_one(value.clone()).unwrap_err(),
                DomainError::unrepresentable("v"),
                "{value:?}"
            );
        }
    }

    #[test]
    fn mixed_lists_and_awkward_strings_survive() {
        let cases = vec![
            InlistValue::List(vec!["on".into(), true.into(), InlistValue::None]),
            InlistValue::from(vec!["it's", "b"]),
            InlistValue::from("50% done"),
            InlistValue::from("say \"hi\""),
            InlistValue::from(vec![-1i64, 0, 1]),
            InlistValue::from("True story"),
            InlistValue::from("None"),
        ];
        for value in cases {
            let text = render_one(value.clone()).unwrap();
            let reparsed = InlistHandler::new().parse_str(&text, None).unwrap();
            assert_eq!(reparsed["v"], value, "{text}");
        }
    }

    #[test]
    fn keys_must_be_plain_words() {
        let mut map = InlistMap::new();
        map.insert("two words".into(), 1i64.into());
        assert_eq!(
            InlistRenderer::render(&map).unwrap_err(),
            DomainError::unrepresentable("two words")
        );
    }

    #[test]
    fn tables_cannot_be_rendered() {
        let mut map = InlistMap::new();
        map.insert("t".into(), InlistValue::Table(InlistMap::new()));
        assert_eq!(
            InlistRenderer::render(&map).unwrap_err(),
            DomainError::unrepresentable("t")
        );
    }
}
