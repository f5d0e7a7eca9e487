use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::error::TokenizeError;
use crate::utils::{quote, source_context};

lazy_static! {
    static ref COMMENT:    Regex = Regex::new(r"^#[^\n]*").unwrap();
    static ref KEYWORD:    Regex = Regex::new(r"^(import|from|struct|oneof|service|rpc|channel|optional)[ \t\r\n]").unwrap();
    static ref QUOTED:     Regex = Regex::new(r#"^"([^"\n]*)""#).unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r"^[:,.<>]").unwrap();
    static ref NEWLINE:    Regex = Regex::new(r"^[ \t\r]*\n").unwrap();
    static ref INDENT:     Regex = Regex::new(r"^(  |\t)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"^[ \t\r]+").unwrap();
    static ref NAME:       Regex = Regex::new(r"^[A-Za-z0-9_]+").unwrap();
}

const CONTEXT_WINDOW: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Import,
    From,
    Struct,
    OneOf,
    Service,
    Rpc,
    Channel,
    Optional,
    Colon,
    Comma,
    Period,
    LeftAngle,
    RightAngle,
    Newline,
    /// Two spaces or one tab at the start of a line.
    Indent,
    BlockOpen,
    BlockClose,
    Name(String),
    Quoted(String),
}

impl TokenKind {
    fn keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "import"   => TokenKind::Import,
            "from"     => TokenKind::From,
            "struct"   => TokenKind::Struct,
            "oneof"    => TokenKind::OneOf,
            "service"  => TokenKind::Service,
            "rpc"      => TokenKind::Rpc,
            "channel"  => TokenKind::Channel,
            "optional" => TokenKind::Optional,
            _ => return None,
        })
    }

    fn punctuation(c: char) -> Option<TokenKind> {
        Some(match c {
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Period,
            '<' => TokenKind::LeftAngle,
            '>' => TokenKind::RightAngle,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Import     => f.write_str("\"import\""),
            TokenKind::From       => f.write_str("\"from\""),
            TokenKind::Struct     => f.write_str("\"struct\""),
            TokenKind::OneOf      => f.write_str("\"oneof\""),
            TokenKind::Service    => f.write_str("\"service\""),
            TokenKind::Rpc        => f.write_str("\"rpc\""),
            TokenKind::Channel    => f.write_str("\"channel\""),
            TokenKind::Optional   => f.write_str("\"optional\""),
            TokenKind::Colon      => f.write_str("\":\""),
            TokenKind::Comma      => f.write_str("\",\""),
            TokenKind::Period     => f.write_str("\".\""),
            TokenKind::LeftAngle  => f.write_str("\"<\""),
            TokenKind::RightAngle => f.write_str("\">\""),
            TokenKind::Newline    => f.write_str("newline"),
            TokenKind::Indent     => f.write_str("indentation"),
            TokenKind::BlockOpen  => f.write_str("indented block"),
            TokenKind::BlockClose => f.write_str("end of block"),
            TokenKind::Name(text)   => write!(f, "name {}", quote(text)),
            TokenKind::Quoted(text) => write!(f, "string {}", quote(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind:   TokenKind,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token { kind, line, column }
    }
}

/// Splits schema text into tokens. Comments, blank lines and mid-line
/// whitespace produce nothing; indentation is only recognised at the start of
/// a line.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut line   = 1;
    let mut column = 1;
    let mut pos    = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let at_line_start = matches!(
            tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Indent)
        );

        let consumed = if let Some(m) = COMMENT.find(rest) {
            m.end()
        } else if let Some(caps) = KEYWORD.captures(rest) {
            let word = &caps[1];
            if let Some(kind) = TokenKind::keyword(word) {
                tokens.push(Token::new(kind, line, column));
            }
            word.len()
        } else if let Some(caps) = QUOTED.captures(rest) {
            tokens.push(Token::new(TokenKind::Quoted(caps[1].to_string()), line, column));
            caps[0].len()
        } else if let Some(m) = PUNCTUATION.find(rest) {
            if let Some(kind) = rest.chars().next().and_then(TokenKind::punctuation) {
                tokens.push(Token::new(kind, line, column));
            }
            m.end()
        } else if let Some(m) = NEWLINE.find(rest) {
            while matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Indent)) {
                tokens.pop();
            }
            if !matches!(tokens.last().map(|t| &t.kind), None | Some(TokenKind::Newline)) {
                tokens.push(Token::new(TokenKind::Newline, line, column + m.end() - 1));
            }
            m.end()
        } else if let Some(m) = INDENT.find(rest).filter(|_| at_line_start) {
            tokens.push(Token::new(TokenKind::Indent, line, column));
            m.end()
        } else if let Some(m) = WHITESPACE.find(rest) {
            m.end()
        } else if let Some(m) = NAME.find(rest) {
            tokens.push(Token::new(TokenKind::Name(m.as_str().to_string()), line, column));
            m.end()
        } else {
            let expected = if rest.starts_with('"') {
                "a closing '\"' on the same line"
            } else {
                "a keyword, name, quoted string, ':', ',', '.', '<', '>', indentation or newline"
            };
            return Err(TokenizeError {
                expected: expected.to_string(),
                line,
                column,
                context:  source_context(text, pos, CONTEXT_WINDOW),
            });
        };

        let part = &rest[..consumed];
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            column = part.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
        } else {
            column += part.chars().count();
        }
        pos += consumed;
    }

    // A trailing newline (and any indentation left dangling before end of
    // input) carries no structure.
    while matches!(
        tokens.last().map(|t| &t.kind),
        Some(TokenKind::Newline) | Some(TokenKind::Indent)
    ) {
        tokens.pop();
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize_schema(text)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn name(text: &str) -> TokenKind {
        TokenKind::Name(text.to_string())
    }

    #[test]
    fn test_tokenize_simple() {
        let input = "struct Dog:\n  name: string";
        let expected = vec![
            Token::new(TokenKind::Struct, 1, 1),
            Token::new(name("Dog"), 1, 8),
            Token::new(TokenKind::Colon, 1, 11),
            Token::new(TokenKind::Newline, 1, 12),
            Token::new(TokenKind::Indent, 2, 1),
            Token::new(name("name"), 2, 3),
            Token::new(TokenKind::Colon, 2, 7),
            Token::new(name("string"), 2, 9),
        ];
        assert_eq!(tokenize_schema(input).unwrap(), expected);
    }

    #[test]
    fn test_tokenize_keywords_need_a_boundary() {
        assert_eq!(
            kinds("structure: optionalValue\nstruct X"),
            vec![
                name("structure"),
                TokenKind::Colon,
                name("optionalValue"),
                TokenKind::Newline,
                TokenKind::Struct,
                name("X"),
            ]
        );
    }

    #[test]
    fn test_tokenize_import() {
        assert_eq!(
            kinds("import Person, Pet from \"./people.conduit\""),
            vec![
                TokenKind::Import,
                name("Person"),
                TokenKind::Comma,
                name("Pet"),
                TokenKind::From,
                TokenKind::Quoted("./people.conduit".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_comments_keep_the_newline() {
        assert_eq!(
            kinds("struct A: # the A\n\tx: integer # trailing\n# whole line\n\n   \nstruct B:"),
            vec![
                TokenKind::Struct,
                name("A"),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                name("x"),
                TokenKind::Colon,
                name("integer"),
                TokenKind::Newline,
                TokenKind::Struct,
                name("B"),
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn test_tokenize_indent_only_at_line_start() {
        assert_eq!(
            kinds("    a:  List  < b >\n"),
            vec![
                TokenKind::Indent,
                TokenKind::Indent,
                name("a"),
                TokenKind::Colon,
                name("List"),
                TokenKind::LeftAngle,
                name("b"),
                TokenKind::RightAngle,
            ]
        );
    }

    #[test]
    fn test_tokenize_drops_trailing_newline() {
        assert_eq!(kinds("x\n"), vec![name("x")]);
        assert_eq!(kinds("\n\n"), vec![]);
        assert_eq!(kinds(""), vec![]);
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let err = tokenize_schema("struct A:\n  name: str@ng").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 12);
        assert_eq!(err.context, "  name: str@ng\n           ^");
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize_schema("import A from \"nowhere\n").unwrap_err();
        assert_eq!(err.column, 15);
        assert!(err.expected.contains("closing"));
    }
}
