//! Positional template formatting and HTML escaping for outgoing text.
//!
//! Templates use the positional subset of Python-style format strings:
//! `{}` takes the next argument, `{N}` takes argument `N`, `{{` and `}}`
//! are literal braces.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// `{` without a closing `}`, or a lone `}`.
    UnmatchedBrace { position: usize },
    /// A field that is neither empty nor a plain index.
    InvalidField(String),
    /// `{}` and `{N}` used in the same template.
    MixedNumbering,
    /// The template asks for more arguments than were given.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedBrace { position } => write!(f, "unmatched brace at byte {}", position),
            Self::InvalidField(field) => write!(f, "unsupported replacement field '{{{}}}'", field),
            Self::MixedNumbering => {
                write!(f, "cannot mix automatic and explicit field numbering")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "argument index {} out of range ({} given)", index, len)
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Substitute positional `args` into `template`.
pub fn format_positional<S: AsRef<str>>(template: &str, args: &[S]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    let mut next_auto = 0usize;
    let mut used_auto = false;
    let mut used_explicit = false;

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if let Some(&(_, '{')) = chars.peek() {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut field = String::new();
                let mut closed = false;
                for (_, fc) in chars.by_ref() {
                    if fc == '}' {
                        closed = true;
                        break;
                    }
                    field.push(fc);
                }
                if !closed {
                    return Err(FormatError::UnmatchedBrace { position: pos });
                }

                let index = if field.is_empty() {
                    if used_explicit {
                        return Err(FormatError::MixedNumbering);
                    }
                    used_auto = true;
                    next_auto += 1;
                    next_auto - 1
                } else if field.bytes().all(|b| b.is_ascii_digit()) {
                    if used_auto {
                        return Err(FormatError::MixedNumbering);
                    }
                    used_explicit = true;
                    field.parse().map_err(|_| FormatError::InvalidField(field.clone()))?
                } else {
                    return Err(FormatError::InvalidField(field));
                };

                let arg = args.get(index).ok_or(FormatError::IndexOutOfRange {
                    index,
                    len: args.len(),
                })?;
                out.push_str(arg.as_ref());
            }
            '}' => {
                if let Some(&(_, '}')) = chars.peek() {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(FormatError::UnmatchedBrace { position: pos });
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Escape user-supplied text for messages sent with the HTML parse mode.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}
