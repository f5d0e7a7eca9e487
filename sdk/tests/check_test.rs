use std::path::Path;

use conduit::{check_json, check_message, compile_schema, message_type, CheckError, MemoryLoader, PrimitiveKind, Representable};
use pretty_assertions::assert_eq;

const CHAT: &str = r#"
struct Person:
  name: string
  sonicFast: boolean

oneof Payload:
  text: string
  person: Person

service Chat:
  struct Message:
    author: Person
    payload: Payload
    seen: optional List<integer>

  rpc Send:
    request: Message
    response: boolean
"#;

fn chat() -> conduit::types::SchemaFile<Representable> {
    compile_schema(CHAT, Path::new("chat.conduit"), &MemoryLoader::new()).unwrap()
}

#[test]
fn test_message_type_paths() {
    let file = chat();

    assert!(matches!(
        message_type(&file, "Person"),
        Some(Representable::Struct { ref name, .. }) if name == "Person"
    ));
    assert!(matches!(
        message_type(&file, "Payload"),
        Some(Representable::OneOf { ref variants, .. }) if variants.len() == 2
    ));
    assert!(matches!(
        message_type(&file, "Chat.Message"),
        Some(Representable::Struct { ref name, .. }) if name == "Message"
    ));
    assert_eq!(
        message_type(&file, "Chat.Send.response"),
        Some(Representable::primitive(PrimitiveKind::Boolean))
    );

    assert_eq!(message_type(&file, "Message"), None);
    assert_eq!(message_type(&file, "Chat"), None);
    assert_eq!(message_type(&file, "Chat.Send"), None);
    assert!(matches!(
        message_type(&file, "Chat.Send.request.author"),
        Some(Representable::Struct { ref name, .. }) if name == "Person"
    ));
    assert_eq!(
        message_type(&file, "Chat.Message.author.sonicFast"),
        Some(Representable::primitive(PrimitiveKind::Boolean))
    );
    assert_eq!(
        message_type(&file, "Payload.text"),
        Some(Representable::primitive(PrimitiveKind::String))
    );
    assert_eq!(message_type(&file, "Chat.Send.request.nope"), None);
    assert_eq!(message_type(&file, "Person.name.length"), None);
}

#[test]
fn test_check_message_accepts_valid_payloads() {
    let file = chat();
    let value = check_message(
        &file,
        "Chat.Send.request",
        r#"{
            "author": { "name": "Sonic", "sonicFast": true },
            "payload": { "text": "hi", "person": null }
        }"#,
    )
    .unwrap();
    assert_eq!(value["author"]["name"], "Sonic");
}

#[test]
fn test_check_message_reports_where_it_failed() {
    let file = chat();

    let err = check_message(
        &file,
        "Chat.Message",
        r#"{ "author": { "name": "Sonic", "sonicFast": true }, "payload": { "text": "hi" }, "seen": [1, "two"] }"#,
    )
    .unwrap_err();
    match err {
        CheckError::Value(e) => assert_eq!(e.path, "/seen/1"),
        other => panic!("expected a value error, got {:?}", other),
    }

    assert!(matches!(
        check_message(&file, "Chat.Nope", "{}"),
        Err(CheckError::UnknownType(ref name)) if name == "Chat.Nope"
    ));
    assert!(matches!(check_json(&Representable::primitive(PrimitiveKind::Null), "{"), Err(CheckError::Json(_))));
}
