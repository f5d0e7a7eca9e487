use std::path::Path;

use crate::{
    error::ParseError,
    tokenizer::{Token, TokenKind},
    types::{Declaration, DeclarationValue, Field, Reference, SchemaFile},
    utils::quote,
};

const DECLARATION: &str = "\"struct\", \"oneof\", \"service\", \"rpc\" or \"channel\"";

/// Position in a normalized token buffer. Every production advances it
/// explicitly; nothing is consumed on a failed `eat`.
struct Cursor<'a> {
    tokens: &'a [Token],
    index:  usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Cursor { tokens, index: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(&kind.to_string()))
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Name(text)) => {
                self.index += 1;
                Ok(text.clone())
            }
            _ => Err(self.error("name")),
        }
    }

    fn expect_quoted(&mut self) -> Result<String, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Quoted(text)) => {
                self.index += 1;
                Ok(text.clone())
            }
            _ => Err(self.error("quoted path")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&TokenKind::Newline) {}
    }

    /// Builds an error describing the token under the cursor.
    fn error(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError {
                expected: expected.to_string(),
                found:    tok.kind.to_string(),
                line:     tok.line,
                column:   tok.column,
            },
            None => {
                let (line, column) = self.tokens.last().map_or((1, 1), |t| (t.line, t.column));
                ParseError {
                    expected: expected.to_string(),
                    found:    "end of input".to_string(),
                    line,
                    column,
                }
            }
        }
    }
}

/// Parses a normalized token stream into the reference AST of one file.
pub fn parse_schema(tokens: &[Token], path: &Path) -> Result<SchemaFile<Reference>, ParseError> {
    let mut cursor       = Cursor::new(tokens);
    let mut declarations = Vec::new();

    loop {
        cursor.skip_newlines();
        if cursor.at_end() {
            break;
        }

        let declaration = if cursor.peek_kind() == Some(&TokenKind::Import) {
            parse_import(&mut cursor)?
        } else {
            parse_declaration(&mut cursor)?
        };
        declarations.push(declaration);

        if !cursor.at_end() {
            cursor.expect(&TokenKind::Newline)?;
        }
    }

    Ok(SchemaFile {
        path: path.to_path_buf(),
        declarations,
    })
}

/// `import Name (',' Name)* from "path"`
fn parse_import(cursor: &mut Cursor) -> Result<Declaration<Reference>, ParseError> {
    cursor.expect(&TokenKind::Import)?;

    let mut imported_names = vec![cursor.expect_name()?];
    while cursor.eat(&TokenKind::Comma) {
        imported_names.push(cursor.expect_name()?);
    }

    cursor.expect(&TokenKind::From)?;
    let path = cursor.expect_quoted()?;

    Ok(Declaration {
        name:  path.clone(),
        value: DeclarationValue::Import { imported_names, path },
    })
}

/// Any block declaration. Which kinds are allowed where is checked by the
/// validator, not here.
fn parse_declaration(cursor: &mut Cursor) -> Result<Declaration<Reference>, ParseError> {
    let keyword = match cursor.peek() {
        Some(tok) => tok,
        None => return Err(cursor.error(DECLARATION)),
    };

    let value_of = match keyword.kind {
        TokenKind::Struct
        | TokenKind::OneOf
        | TokenKind::Rpc
        | TokenKind::Channel
        | TokenKind::Service => keyword.kind.clone(),
        _ => return Err(cursor.error(DECLARATION)),
    };
    cursor.index += 1;

    let name = cursor.expect_name()?;
    parse_block_header(cursor)?;

    let value = match value_of {
        TokenKind::Struct => DeclarationValue::Struct {
            fields: parse_fields(cursor)?,
        },
        TokenKind::OneOf => DeclarationValue::OneOf {
            fields: parse_fields(cursor)?,
        },
        TokenKind::Rpc => {
            let [request, response] = exact_fields(parse_fields(cursor)?, ["request", "response"], keyword)?;
            DeclarationValue::Rpc { request, response }
        }
        TokenKind::Channel => {
            let [incoming, outgoing] = exact_fields(parse_fields(cursor)?, ["incoming", "outgoing"], keyword)?;
            DeclarationValue::Channel { incoming, outgoing }
        }
        _ => DeclarationValue::Service {
            members: parse_members(cursor)?,
        },
    };

    Ok(Declaration { name, value })
}

/// `':' NEWLINE OPEN`
fn parse_block_header(cursor: &mut Cursor) -> Result<(), ParseError> {
    cursor.expect(&TokenKind::Colon)?;
    cursor.expect(&TokenKind::Newline)?;
    cursor.expect(&TokenKind::BlockOpen)
}

fn parse_members(cursor: &mut Cursor) -> Result<Vec<Declaration<Reference>>, ParseError> {
    let mut members = Vec::new();
    loop {
        cursor.skip_newlines();
        members.push(parse_declaration(cursor)?);
        if cursor.eat(&TokenKind::BlockClose) {
            return Ok(members);
        }
        cursor.expect(&TokenKind::Newline)?;
    }
}

fn parse_fields(cursor: &mut Cursor) -> Result<Vec<Field<Reference>>, ParseError> {
    let mut fields = Vec::new();
    loop {
        cursor.skip_newlines();
        fields.push(parse_field(cursor)?);
        if cursor.eat(&TokenKind::BlockClose) {
            return Ok(fields);
        }
        if !cursor.eat(&TokenKind::Newline) {
            return Err(cursor.error("newline or end of block"));
        }
    }
}

/// `Name ':' 'optional'? Reference`
fn parse_field(cursor: &mut Cursor) -> Result<Field<Reference>, ParseError> {
    let name = cursor.expect_name()?;
    cursor.expect(&TokenKind::Colon)?;
    let optional = cursor.eat(&TokenKind::Optional);
    let type_ = parse_reference(cursor)?;
    Ok(Field { name, optional, type_ })
}

/// `Name ('.' Name)* ('<' Reference (',' Reference)* '>')?`
fn parse_reference(cursor: &mut Cursor) -> Result<Reference, ParseError> {
    let mut name = cursor.expect_name()?;
    while cursor.eat(&TokenKind::Period) {
        name.push('.');
        name.push_str(&cursor.expect_name()?);
    }

    let mut type_arguments = Vec::new();
    if cursor.eat(&TokenKind::LeftAngle) {
        loop {
            type_arguments.push(parse_reference(cursor)?);
            if cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if cursor.eat(&TokenKind::RightAngle) {
                break;
            }
            return Err(cursor.error("\",\" or \">\""));
        }
    }

    Ok(Reference { name, type_arguments })
}

/// Rpcs and channels take exactly two fields with fixed names, in any order.
fn exact_fields(
    fields: Vec<Field<Reference>>,
    names: [&str; 2],
    keyword: &Token,
) -> Result<[Field<Reference>; 2], ParseError> {
    let mismatch = |fields: &[Field<Reference>]| {
        let found: Vec<String> = fields.iter().map(|f| quote(&f.name)).collect();
        ParseError {
            expected: format!("exactly the fields {} and {}", quote(names[0]), quote(names[1])),
            found:    format!("fields {}", found.join(", ")),
            line:     keyword.line,
            column:   keyword.column,
        }
    };

    let complete = fields.len() == 2
        && names.iter().all(|n| fields.iter().any(|f| f.name == *n));
    if !complete {
        return Err(mismatch(&fields));
    }

    let mut iter = fields.into_iter();
    match (iter.next(), iter.next()) {
        (Some(first), Some(second)) if first.name == names[0] => Ok([first, second]),
        (Some(first), Some(second)) => Ok([second, first]),
        _ => Err(mismatch(&[])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_blocks;
    use crate::tokenizer::tokenize_schema;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn parse(text: &str) -> Result<SchemaFile<Reference>, ParseError> {
        let tokens = normalize_blocks(tokenize_schema(text).unwrap());
        parse_schema(&tokens, Path::new("test.conduit"))
    }

    fn field_type(text: &str) -> Reference {
        let file = parse(&format!("struct A:\n  x: {}\n", text)).unwrap();
        match &file.declarations[0].value {
            DeclarationValue::Struct { fields } => fields[0].type_.clone(),
            other => panic!("expected a struct, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_struct_and_oneof() {
        let file = parse(
            "struct Person:\n  name: string\n  nickname: optional string\n\noneof Pet:\n  dog: Dog\n  cat: Cat\n",
        )
        .unwrap();
        assert_eq!(file.path, Path::new("test.conduit"));
        assert_eq!(
            file.declarations,
            vec![
                Declaration {
                    name:  "Person".into(),
                    value: DeclarationValue::Struct {
                        fields: vec![
                            Field::new("name", false, Reference::named("string")),
                            Field::new("nickname", true, Reference::named("string")),
                        ],
                    },
                },
                Declaration {
                    name:  "Pet".into(),
                    value: DeclarationValue::OneOf {
                        fields: vec![
                            Field::new("dog", false, Reference::named("Dog")),
                            Field::new("cat", false, Reference::named("Cat")),
                        ],
                    },
                },
            ]
        );
    }

    #[test]
    fn test_parse_service() {
        let file = parse(
            "service Chat:\n  struct Message:\n    text: string\n  rpc Send:\n    response: boolean\n    request: Message\n  channel Live:\n    incoming: Message\n    outgoing: Chat.Message\n",
        )
        .unwrap();
        assert_eq!(file.declarations.len(), 1);
        let members = match &file.declarations[0].value {
            DeclarationValue::Service { members } => members,
            other => panic!("expected a service, got {:?}", other),
        };
        assert_eq!(members.len(), 3);
        assert_eq!(
            members[1].value,
            DeclarationValue::Rpc {
                request:  Field::new("request", false, Reference::named("Message")),
                response: Field::new("response", false, Reference::named("boolean")),
            }
        );
        assert_eq!(
            members[2].value,
            DeclarationValue::Channel {
                incoming: Field::new("incoming", false, Reference::named("Message")),
                outgoing: Field::new("outgoing", false, Reference::named("Chat.Message")),
            }
        );
    }

    #[test]
    fn test_parse_import() {
        let file = parse("import Person, Pet from \"../shared/people.conduit\"\n").unwrap();
        assert_eq!(
            file.declarations[0],
            Declaration {
                name:  "../shared/people.conduit".into(),
                value: DeclarationValue::Import {
                    imported_names: vec!["Person".into(), "Pet".into()],
                    path:           "../shared/people.conduit".into(),
                },
            }
        );
    }

    #[test]
    fn test_parse_generic_reference() {
        assert_eq!(
            field_type("List<Map<string,Cat>>"),
            Reference::generic(
                "List",
                vec![Reference::generic(
                    "Map",
                    vec![Reference::named("string"), Reference::named("Cat")]
                )]
            )
        );
        assert_eq!(field_type("List<Map<string,Cat>>"), field_type("List  < Map <string  ,Cat  > >"));
    }

    #[test]
    fn test_parse_rpc_requires_exact_fields() {
        let err = parse("service S:\n  rpc R:\n    request: A\n").unwrap_err();
        assert_eq!(err.expected, "exactly the fields \"request\" and \"response\"");
        assert_eq!(err.found, "fields \"request\"");
        assert_eq!((err.line, err.column), (2, 3));

        let err = parse("service S:\n  channel C:\n    incoming: A\n    outgoing: B\n    extra: C\n").unwrap_err();
        assert_eq!(err.found, "fields \"incoming\", \"outgoing\", \"extra\"");

        assert!(parse("service S:\n  rpc R:\n    request: A\n    request: B\n").is_err());
    }

    #[test]
    fn test_parse_reports_found_token() {
        let err = parse("struct A\n  x: string").unwrap_err();
        assert_eq!(err.expected, "\":\"");
        assert_eq!(err.found, "newline");

        let err = parse("message A:\n  x: string").unwrap_err();
        assert_eq!(err.expected, DECLARATION);
        assert_eq!(err.found, "name \"message\"");

        let err = parse("struct A:\n  x: List<string").unwrap_err();
        assert_eq!(err.found, "end of block");

        let err = parse("import A from ").unwrap_err();
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn test_parse_rejects_import_inside_service() {
        let err = parse("service S:\n  import A from \"a\"\n").unwrap_err();
        assert_eq!(err.found, "\"import\"");
    }

    #[test]
    fn test_parse_allows_any_declaration_kind_at_top_level() {
        // Placement rules belong to the validator.
        let file = parse("rpc R:\n  request: A\n  response: B\n").unwrap();
        assert!(matches!(file.declarations[0].value, DeclarationValue::Rpc { .. }));
    }

    proptest! {
        #[test]
        fn spacing_inside_references_is_ignored(gaps in prop::collection::vec(0usize..4, 8)) {
            let parts = ["List", "<", "Map", "<", "string", ",", "Cat", ">", ">"];
            let mut text = String::from(parts[0]);
            for (part, gap) in parts[1..].iter().zip(gaps) {
                text.push_str(&" ".repeat(gap));
                text.push_str(part);
            }
            prop_assert_eq!(field_type(&text), field_type("List<Map<string, Cat>>"));
        }
    }
}
