//! Raw artifact text to re-embeddable blueprint literal, and back.
//!
//! Literals sit between `"""` delimiters and are instantiated with brace-format
//! semantics, so converting raw text escapes:
//!
//! | raw            | literal        |
//! |----------------|----------------|
//! | `\`            | `\\`           |
//! | `"""`          | `\"\"\"`       |
//! | trailing `"`   | `\"`           |
//! | `{` / `}`      | `{{` / `}}`    |
//! | parameter value| `{name}`       |

use stencil_core::ParameterSet;

use crate::error::BlueprintError;

const TRIPLE: &str = "\"\"\"";
const ESCAPED_TRIPLE: &str = "\\\"\\\"\\\"";

/// Convert raw artifact text into its literal form.
///
/// Parameter values are matched longest first, so a value that is a prefix of
/// another never splits it. Emitted `{name}` tokens are never rescanned.
pub fn literalize(raw: &str, params: &ParameterSet) -> String {
    let mut needles: Vec<(&str, &str)> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (value, name))
        .collect();
    needles.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.1.cmp(b.1)));

    let mut out = String::with_capacity(raw.len() + raw.len() / 8);
    let mut rest = raw;

    'scan: while let Some(ch) = rest.chars().next() {
        for (value, name) in &needles {
            if rest.starts_with(value) {
                out.push('{');
                out.push_str(name);
                out.push('}');
                rest = &rest[value.len()..];
                continue 'scan;
            }
        }
        if rest.starts_with(TRIPLE) {
            out.push_str(ESCAPED_TRIPLE);
            rest = &rest[TRIPLE.len()..];
            continue;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            // Would merge with the closing delimiter.
            '"' if rest.len() == 1 => out.push_str("\\\""),
            _ => out.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Expand a literal back into raw text by undoing the escapes and
/// substituting every `{name}` with its parameter value.
pub fn expand(literal: &str, params: &ParameterSet) -> Result<String, BlueprintError> {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&(_, next @ ('\\' | '"' | '\''))) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            '{' => {
                if let Some(&(_, '{')) = chars.peek() {
                    out.push('{');
                    chars.next();
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(BlueprintError::BadLiteral {
                        offset,
                        detail: "unclosed '{'".to_string(),
                    });
                }
                if name.is_empty() {
                    return Err(BlueprintError::BadLiteral {
                        offset,
                        detail: "empty placeholder".to_string(),
                    });
                }
                let value = params
                    .get(&name)
                    .ok_or(BlueprintError::UnknownPlaceholder { name, offset })?;
                out.push_str(value);
            }
            '}' => {
                if let Some(&(_, '}')) = chars.peek() {
                    out.push('}');
                    chars.next();
                } else {
                    return Err(BlueprintError::BadLiteral {
                        offset,
                        detail: "single '}' outside a placeholder".to_string(),
                    });
                }
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParameterSet {
        [
            ("packName", "demo"),
            ("packNameLong", "demo_tools"),
            ("version", "0.1.0"),
            ("empty", ""),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn longest_value_wins() {
        let lit = literalize("import demo_tools.demo\n", &params());
        assert_eq!(lit, "import {packNameLong}.{packName}\n");
    }

    #[test]
    fn braces_and_backslashes_are_escaped() {
        let lit = literalize("d = {'k': '\\n'}", &params());
        assert_eq!(lit, "d = {{'k': '\\\\n'}}");
    }

    #[test]
    fn triple_quotes_and_trailing_quote_are_escaped() {
        let lit = literalize("doc = \"\"\"x\"\"\"\nsay \"hi\"", &params());
        assert_eq!(lit, "doc = \\\"\\\"\\\"x\\\"\\\"\\\"\nsay \"hi\\\"");
    }

    #[test]
    fn empty_values_never_match() {
        let lit = literalize("plain text", &params());
        assert_eq!(lit, "plain text");
    }

    #[test]
    fn tokens_are_not_rescanned() {
        // "packName" is itself a value here; the emitted token must survive.
        let params: ParameterSet = [("a", "demo"), ("b", "packName")].into_iter().collect();
        assert_eq!(literalize("demo", &params), "{a}");
    }

    #[test]
    fn expand_inverts_literalize() {
        let raw = "from demo_tools import demo\nVERSION = \"0.1.0\"\nd = {1: '\\t'}\n\"\"\"doc\"\"\"\nend\"";
        let lit = literalize(raw, &params());
        assert_eq!(expand(&lit, &params()).unwrap(), raw);
    }

    #[test]
    fn literalize_inverts_expand_for_canonical_literals() {
        let lit = "name = \"{packName}\"\nversion = \"{version}\"\nmap = {{}}\n";
        let raw = expand(lit, &params()).unwrap();
        assert_eq!(raw, "name = \"demo\"\nversion = \"0.1.0\"\nmap = {}\n");
        assert_eq!(literalize(&raw, &params()), lit);
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = expand("x {nope} y", &params()).unwrap_err();
        assert_eq!(
            err,
            BlueprintError::UnknownPlaceholder {
                name: "nope".to_string(),
                offset: 2
            }
        );
    }

    #[test]
    fn stray_braces_are_errors() {
        assert!(matches!(
            expand("a } b", &params()),
            Err(BlueprintError::BadLiteral { offset: 2, .. })
        ));
        assert!(matches!(
            expand("a {open", &params()),
            Err(BlueprintError::BadLiteral { .. })
        ));
        assert!(matches!(
            expand("a {} b", &params()),
            Err(BlueprintError::BadLiteral { .. })
        ));
    }
}
