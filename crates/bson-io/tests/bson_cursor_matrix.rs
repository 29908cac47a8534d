use bson_io::{
    decode_document, encode_document, BsonBinary, BsonBinaryReader, BsonBinaryWriter,
    BsonDbPointer, BsonDecimal128, BsonDocument, BsonError, BsonJavaScriptCode,
    BsonJavaScriptCodeWithScope, BsonObjectId, BsonReader, BsonReaderState,
    BsonRegularExpression, BsonSymbol, BsonTimestamp, BsonType, BsonValue, BsonWriter,
    BsonWriterState,
};
use proptest::prelude::*;

fn doc(fields: &[(&str, BsonValue)]) -> BsonDocument {
    fields
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn object_id() -> BsonObjectId {
    BsonObjectId::from_bytes([0x12, 0x34, 0x56, 0x78, 0, 1, 2, 3, 4, 5, 1, 2])
}

#[test]
fn bson_document_roundtrip_matrix() {
    let docs = vec![
        doc(&[]),
        doc(&[("null", BsonValue::Null), ("undef", BsonValue::Undefined)]),
        doc(&[("bool", BsonValue::Boolean(true)), ("no", BsonValue::Boolean(false))]),
        doc(&[
            ("i32", BsonValue::Int32(-123)),
            ("i64", BsonValue::Int64(12_321_321_123)),
            ("f64", BsonValue::Double(123.456)),
        ]),
        doc(&[
            ("str", BsonValue::String("hello".into())),
            ("unicode", BsonValue::String("yes! - \u{1F44D}\u{1F3FB}".into())),
            ("empty", BsonValue::String(String::new())),
        ]),
        doc(&[(
            "arr",
            BsonValue::Array(vec![
                BsonValue::Int32(1),
                BsonValue::Array(vec![]),
                BsonValue::String("x".into()),
            ]),
        )]),
        doc(&[(
            "obj",
            BsonValue::Document(doc(&[
                ("foo", BsonValue::String("bar".into())),
                ("baz", BsonValue::Document(doc(&[]))),
            ])),
        )]),
        doc(&[(
            "bin",
            BsonValue::Binary(BsonBinary {
                subtype: 0x80,
                data: vec![1, 2, 3],
            }),
        )]),
        doc(&[("id", BsonValue::ObjectId(object_id()))]),
        doc(&[("date", BsonValue::DateTime(1_388_534_400_000))]),
        doc(&[(
            "re",
            BsonValue::RegularExpression(BsonRegularExpression {
                pattern: "^a.*b$".into(),
                options: "im".into(),
            }),
        )]),
        doc(&[(
            "ptr",
            BsonValue::DbPointer(BsonDbPointer {
                namespace: "users".into(),
                id: object_id(),
            }),
        )]),
        doc(&[(
            "code",
            BsonValue::JavaScriptCode(BsonJavaScriptCode {
                code: "function() { return 42; }".into(),
            }),
        )]),
        doc(&[(
            "sym",
            BsonValue::Symbol(BsonSymbol {
                symbol: "sym".into(),
            }),
        )]),
        doc(&[(
            "scope",
            BsonValue::JavaScriptCodeWithScope(BsonJavaScriptCodeWithScope {
                code: "function() { return x; }".into(),
                scope: doc(&[("x", BsonValue::Int32(42))]),
            }),
        )]),
        doc(&[(
            "ts",
            BsonValue::Timestamp(BsonTimestamp {
                time: 1_700_000_000,
                increment: 3,
            }),
        )]),
        doc(&[(
            "dec",
            BsonValue::Decimal128(BsonDecimal128 {
                bytes: [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x40, 0x30],
            }),
        )]),
        doc(&[("min", BsonValue::MinKey), ("max", BsonValue::MaxKey)]),
    ];

    for d in docs {
        let bytes = encode_document(&d).expect("encode");
        let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(declared as usize, bytes.len(), "size prefix for {d:?}");
        assert_eq!(decode_document(&bytes).expect("decode"), d);
    }
}

#[test]
fn bson_wire_layout_matrix() {
    let cases: Vec<(BsonDocument, Vec<u8>)> = vec![
        (
            doc(&[("b", BsonValue::Boolean(true))]),
            vec![9, 0, 0, 0, 0x08, b'b', 0, 1, 0],
        ),
        (
            doc(&[("s", BsonValue::String("hi".into()))]),
            vec![15, 0, 0, 0, 0x02, b's', 0, 3, 0, 0, 0, b'h', b'i', 0, 0],
        ),
        (
            doc(&[("n", BsonValue::Null)]),
            vec![8, 0, 0, 0, 0x0a, b'n', 0, 0],
        ),
        (
            doc(&[(
                "t",
                BsonValue::Timestamp(BsonTimestamp {
                    time: 2,
                    increment: 1,
                }),
            )]),
            vec![
                16, 0, 0, 0, 0x11, b't', 0, 1, 0, 0, 0, 2, 0, 0, 0, 0,
            ],
        ),
        (
            doc(&[("k", BsonValue::MinKey)]),
            vec![8, 0, 0, 0, 0xff, b'k', 0, 0],
        ),
    ];
    for (d, expected) in cases {
        assert_eq!(encode_document(&d).expect("encode"), expected, "{d:?}");
    }
}

#[test]
fn bson_decode_error_matrix() {
    let cases: Vec<(&str, Vec<u8>, BsonError)> = vec![
        ("empty input", vec![], BsonError::UnexpectedEof),
        ("short size", vec![5, 0], BsonError::UnexpectedEof),
        ("size below minimum", vec![4, 0, 0, 0], BsonError::InvalidDocumentSize(4)),
        (
            "size beyond input",
            vec![6, 0, 0, 0, 0],
            BsonError::InvalidDocumentSize(6),
        ),
        (
            "unknown tag",
            vec![8, 0, 0, 0, 0x42, b'x', 0, 0],
            BsonError::UnsupportedType(0x42),
        ),
        (
            "bad utf8 name",
            vec![8, 0, 0, 0, 0x0a, 0xff, 0, 0],
            BsonError::InvalidUtf8,
        ),
        (
            "zero string length",
            vec![12, 0, 0, 0, 0x02, b's', 0, 0, 0, 0, 0, 0],
            BsonError::InvalidStringLength(0),
        ),
        (
            "trailing bytes",
            vec![5, 0, 0, 0, 0, 1, 2],
            BsonError::TrailingBytes(2),
        ),
    ];
    for (name, bytes, expected) in cases {
        assert_eq!(decode_document(&bytes), Err(expected), "{name}");
    }
}

#[test]
fn bson_reader_skips_every_element_type() {
    let d = doc(&[
        ("a", BsonValue::Double(1.5)),
        ("b", BsonValue::String("s".into())),
        ("c", BsonValue::Document(doc(&[("x", BsonValue::Int32(1))]))),
        ("d", BsonValue::Array(vec![BsonValue::Null])),
        ("e", BsonValue::Binary(BsonBinary::generic(vec![9, 9]))),
        ("f", BsonValue::ObjectId(object_id())),
        ("g", BsonValue::Boolean(false)),
        ("h", BsonValue::DateTime(-1)),
        (
            "i",
            BsonValue::RegularExpression(BsonRegularExpression {
                pattern: "x".into(),
                options: String::new(),
            }),
        ),
        (
            "j",
            BsonValue::JavaScriptCodeWithScope(BsonJavaScriptCodeWithScope {
                code: "x".into(),
                scope: doc(&[]),
            }),
        ),
        ("k", BsonValue::Int64(7)),
        ("l", BsonValue::MaxKey),
        ("m", BsonValue::Int32(99)),
    ]);
    let bytes = encode_document(&d).expect("encode");
    let mut reader = BsonBinaryReader::new(&bytes);
    reader.read_bson_type().expect("top");
    reader.read_start_document().expect("start");
    let mut names = Vec::new();
    while let Some(ty) = reader.read_bson_type().expect("type") {
        let name = reader.read_name().expect("name");
        if name == "m" {
            assert_eq!(ty, BsonType::Int32);
            assert_eq!(reader.read_int32().expect("int32"), 99);
        } else {
            reader.skip_value().expect("skip");
        }
        names.push(name);
    }
    reader.read_end_document().expect("end");
    assert_eq!(reader.state(), BsonReaderState::Done);
    assert_eq!(names.len(), d.len());
}

#[test]
fn bson_writer_state_matrix() {
    let mut writer = BsonBinaryWriter::new();
    assert_eq!(writer.state(), BsonWriterState::Initial);
    writer.write_start_document().unwrap();
    assert_eq!(writer.state(), BsonWriterState::Name);
    writer.write_name("list").unwrap();
    assert_eq!(writer.state(), BsonWriterState::Value);
    writer.write_start_array().unwrap();
    assert_eq!(writer.state(), BsonWriterState::Value);
    writer.write_int32(1).unwrap();
    writer.write_bytes(&[1, 2]).unwrap();
    assert!(writer.write_end_document().is_err());
    writer.write_end_array().unwrap();
    assert_eq!(writer.state(), BsonWriterState::Name);
    assert!(writer.write_end_array().is_err());
    writer.write_end_document().unwrap();
    assert_eq!(writer.state(), BsonWriterState::Done);
    assert!(writer.write_start_document().is_err());

    let decoded = decode_document(&writer.into_bytes().unwrap()).unwrap();
    assert_eq!(
        decoded,
        doc(&[(
            "list",
            BsonValue::Array(vec![
                BsonValue::Int32(1),
                BsonValue::Binary(BsonBinary::generic(vec![1, 2])),
            ]),
        )])
    );
}

fn leaf() -> impl Strategy<Value = BsonValue> {
    prop_oneof![
        Just(BsonValue::Null),
        any::<bool>().prop_map(BsonValue::Boolean),
        any::<i32>().prop_map(BsonValue::Int32),
        any::<i64>().prop_map(BsonValue::Int64),
        (-1.0e12f64..1.0e12).prop_map(BsonValue::Double),
        any::<i64>().prop_map(BsonValue::DateTime),
        any::<String>().prop_map(BsonValue::String),
        proptest::collection::vec(any::<u8>(), 0..16)
            .prop_map(|data| BsonValue::Binary(BsonBinary::generic(data))),
    ]
}

fn value() -> impl Strategy<Value = BsonValue> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(BsonValue::Array),
            proptest::collection::vec(("[a-z]{0,6}", inner), 0..4)
                .prop_map(BsonValue::Document),
        ]
    })
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(
        fields in proptest::collection::vec(("[a-zA-Z_]{1,8}", value()), 0..6)
    ) {
        let bytes = encode_document(&fields).unwrap();
        prop_assert_eq!(decode_document(&bytes).unwrap(), fields);
    }

    #[test]
    fn truncated_documents_never_decode(
        fields in proptest::collection::vec(("[a-z]{1,4}", leaf()), 1..4),
        cut in 1usize..8,
    ) {
        let bytes = encode_document(&fields).unwrap();
        let cut = cut.min(bytes.len());
        prop_assert!(decode_document(&bytes[..bytes.len() - cut]).is_err());
    }
}
