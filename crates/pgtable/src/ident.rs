//! Validated SQL identifiers.
//!
//! Every schema, table and column name in a table descriptor goes through
//! [`Ident::parse`] when the descriptor is built, so derived statements only
//! ever contain identifiers of these two shapes:
//!
//! - unquoted parts matching `[A-Za-z_][A-Za-z0-9_$]*`
//! - quoted parts (`"Any Text"`), where `""` stands for a literal quote and
//!   NUL is rejected
//!
//! Parts are joined with `.`: `app.users`, `public."UserTable"`.

use crate::error::{TableError, TableResult};
use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

impl fmt::Display for IdentPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentPart::Unquoted(name) => f.write_str(name),
            IdentPart::Quoted(name) => write!(f, "\"{}\"", name.replace('"', "\"\"")),
        }
    }
}

/// A possibly qualified SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    pub fn parse(s: &str) -> TableResult<Self> {
        if s.is_empty() {
            return Err(TableError::validation("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(TableError::validation(
                "identifier cannot contain a NUL character",
            ));
        }

        let mut chars = s.chars().peekable();
        let mut parts = vec![parse_part(&mut chars)?];
        while let Some(c) = chars.next() {
            if c != '.' {
                return Err(TableError::validation(format!(
                    "expected '.' between identifier parts in '{s}', got '{c}'"
                )));
            }
            if chars.peek().is_none() {
                return Err(TableError::validation(format!(
                    "trailing '.' in identifier '{s}'"
                )));
            }
            parts.push(parse_part(&mut chars)?);
        }
        Ok(Self { parts })
    }

    /// Render as SQL text, quoting where the source was quoted.
    pub fn to_sql(&self) -> String {
        self.to_string()
    }

    /// `schema` joined with `table` gives `schema.table`.
    pub fn join(&self, other: &Ident) -> Ident {
        Ident {
            parts: self.parts.iter().chain(&other.parts).cloned().collect(),
        }
    }

    /// The final part only (`public.users` -> `users`).
    ///
    /// Inside a statement Postgres exposes a table under its bare name, so
    /// column qualifiers use this form.
    pub fn last(&self) -> Ident {
        Ident {
            parts: self.parts.last().cloned().into_iter().collect(),
        }
    }

    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl FromStr for Ident {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_part(chars: &mut Peekable<Chars<'_>>) -> TableResult<IdentPart> {
    if chars.next_if_eq(&'"').is_some() {
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('"') if chars.next_if_eq(&'"').is_some() => name.push('"'),
                Some('"') => break,
                Some(c) => name.push(c),
                None => return Err(TableError::validation("unclosed quoted identifier")),
            }
        }
        if name.is_empty() {
            return Err(TableError::validation("empty quoted identifier"));
        }
        return Ok(IdentPart::Quoted(name));
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' {
            break;
        }
        let valid = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !valid {
            return Err(TableError::validation(format!(
                "invalid character '{c}' in identifier"
            )));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(TableError::validation("empty identifier segment"));
    }
    Ok(IdentPart::Unquoted(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(s: &str) -> String {
        Ident::parse(s).unwrap().to_sql()
    }

    #[test]
    fn renders_what_it_parsed() {
        for s in [
            "users",
            "public.users",
            "schema.table.column",
            r#""CamelCase""#,
            r#""has""quote""#,
            r#"public."UserTable".id"#,
            "my_var$1",
        ] {
            assert_eq!(roundtrip(s), s);
        }
    }

    #[test]
    fn quoted_part_keeps_raw_name() {
        let ident: Ident = r#""has""quote".x"#.parse().unwrap();
        assert_eq!(
            ident.parts,
            vec![
                IdentPart::Quoted("has\"quote".into()),
                IdentPart::Unquoted("x".into())
            ]
        );
    }

    #[test]
    fn rejects_malformed() {
        for s in [
            "",
            "1table",
            "my table",
            "schema..table",
            "schema.",
            ".table",
            r#""unclosed"#,
            r#""""#,
            r#""a"b"#,
            "users; DROP TABLE users",
            "na\0me",
        ] {
            assert!(Ident::parse(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn join_and_last() {
        let schema = Ident::parse("accounts").unwrap();
        let table = Ident::parse(r#""UserTable""#).unwrap();
        let qualified = schema.join(&table);
        assert_eq!(qualified.to_sql(), r#"accounts."UserTable""#);
        assert_eq!(qualified.last().to_sql(), r#""UserTable""#);
        assert!(!qualified.is_simple());
        assert!(qualified.last().is_simple());
    }
}
