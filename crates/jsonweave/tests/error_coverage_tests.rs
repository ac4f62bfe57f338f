//! Error messages and conversions

use jsonweave::*;
use pretty_assertions::assert_eq;

fn fails_with(result: Result<Value>) -> JsonError {
    result.unwrap_err()
}

#[test]
fn test_umbrella_conversions() {
    let err = fails_with(parse("[").map_err(Into::into));
    assert!(matches!(err, JsonError::Parse(_)));

    let doc = parse("{}").unwrap();
    let err = fails_with(path::get(&doc, &["x"]).map_err(Into::into));
    assert!(matches!(err, JsonError::Path(PathError::NotFound { .. })));

    let err = fails_with(Value::number("x").map_err(Into::into));
    assert!(matches!(err, JsonError::Value(ValueError::InvalidNumber(_))));
}

#[test]
fn test_question_mark_into_json_error() {
    fn pipeline(text: &str) -> Result<Value> {
        let mut engine = Engine::new();
        let doc = engine.parse(text)?;
        let name = path::get(&doc, &["name"])?;
        let template = engine.parse(r#"{"hello":"~S:n"}"#)?;
        Ok(engine.template(&template, &Bindings::single("n", name))?)
    }

    assert_eq!(
        pipeline(r#"{"name":"ada"}"#).unwrap().to_string(),
        r#"{"hello":"ada"}"#
    );
    assert!(matches!(pipeline("{}"), Err(JsonError::Path(_))));
    assert!(matches!(pipeline("{"), Err(JsonError::Parse(_))));
}

#[test]
fn test_parse_error_offsets() {
    let cases = [
        ("", ParseErrorKind::NoValue, 0),
        ("[1,2", ParseErrorKind::UnterminatedArray, 0),
        ("{\"a\":1}x", ParseErrorKind::TrailingGarbage, 7),
        ("[\"ü\", ?]", ParseErrorKind::IllegalCharacter, 6),
    ];
    for (text, kind, offset) in cases {
        let err = parse(text).unwrap_err();
        assert_eq!((err.kind, err.offset), (kind, offset), "{text:?}");
    }
}

#[test]
fn test_path_error_messages() {
    assert_eq!(
        PathError::BadIndex { step: "x".into() }.to_string(),
        "Expected an integer index or end(+/-integer)?, got x"
    );
    assert_eq!(
        PathError::NotFound { step: "k".into() }.to_string(),
        "Path element \"k\" not found"
    );
}

#[test]
fn test_template_error_messages() {
    let err = TemplateError::NotABoolean {
        name: "flag".into(),
        value: "maybe".into(),
    };
    assert_eq!(
        err.to_string(),
        "Error substituting value from \"flag\" into template, not a boolean: \"maybe\""
    );

    let err = TemplateError::DuplicateKey {
        name: "k".into(),
        key: "b".into(),
    };
    assert_eq!(
        err.to_string(),
        "Error substituting value from \"k\" into template, duplicate object key \"b\""
    );

    let mut engine = Engine::new();
    let doc = engine.parse(r#"["~J:doc"]"#).unwrap();
    let err = engine
        .template(&doc, &Bindings::single("doc", "{oops"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::InvalidJson { ref name, .. } if name == "doc"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_iterate_error_messages() {
    assert_eq!(
        IterateError::NotIterable("number").to_string(),
        "Cannot iterate over JSON type number"
    );
}
