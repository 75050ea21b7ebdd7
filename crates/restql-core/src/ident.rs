//! Identifier quoting.
//!
//! Identifiers are wrapped in backticks. Embedded backticks are left as is,
//! so names must come from a trusted schema.

/// The identifier quote character.
pub const IDENTIFIER_QUOTE: char = '`';

/// Quotes an identifier.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("{IDENTIFIER_QUOTE}{name}{IDENTIFIER_QUOTE}")
}

/// Renders `` `table`.`column` ``, or `` `table`.* `` for the wildcard.
#[must_use]
pub fn qualify(table: &str, column: &str) -> String {
    if column == "*" {
        format!("{}.*", quote_identifier(table))
    } else {
        format!("{}.{}", quote_identifier(table), quote_identifier(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("we`ird"), "`we`ird`");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("users", "name"), "`users`.`name`");
        assert_eq!(qualify("users", "*"), "`users`.*");
    }
}
