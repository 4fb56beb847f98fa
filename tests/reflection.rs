//! Integration tests for schema construction and descriptor interchange
//!
//! Builds reflection graphs from JSON descriptors and checks lookup,
//! validation failures, extension resolution, and the JSON round trip.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proto_codec::{CodecError, Root};

#[test]
fn test_lookup_by_dotted_path() {
    let root = Root::from_json_str(
        r#"{
            "nested": {
                "pkg": {
                    "nested": {
                        "Outer": {
                            "fields": { "id": { "type": "uint32", "id": 1 } },
                            "nested": {
                                "Inner": {
                                    "fields": { "flag": { "type": "bool", "id": 1 } }
                                }
                            }
                        },
                        "Color": { "values": { "RED": 0, "GREEN": 1 } },
                        "Watcher": {
                            "methods": {
                                "Check": { "requestType": "Outer", "responseType": "Outer" }
                            }
                        }
                    }
                }
            }
        }"#,
    )
    .expect("schema should load");

    let outer = root.lookup_type("pkg.Outer").unwrap();
    assert_eq!(outer.full_name(), "pkg.Outer");
    assert_eq!(outer.name(), "Outer");

    let inner = root.lookup_type("pkg.Outer.Inner").unwrap();
    assert_eq!(inner.full_name(), "pkg.Outer.Inner");

    let color = root.lookup_enum("pkg.Color").unwrap();
    assert_eq!(color.value_by_name("GREEN"), Some(1));
    assert_eq!(color.name_by_number(0), Some("RED"));

    let watcher = root.lookup_service("pkg.Watcher").unwrap();
    let method = watcher.method("Check").unwrap();
    let request = watcher.request_type(method).expect("resolved");
    assert_eq!(request.full_name(), "pkg.Outer");
}

#[test]
fn test_lookup_kind_mismatch() {
    let root = Root::from_json_str(
        r#"{ "nested": { "Color": { "values": { "RED": 0 } } } }"#,
    )
    .unwrap();

    assert!(matches!(
        root.lookup_type("Color"),
        Err(CodecError::KindMismatch { expected: "type", .. })
    ));
    assert!(matches!(
        root.lookup_enum("Missing"),
        Err(CodecError::TypeNotFound { .. })
    ));
}

#[test]
fn test_relative_type_references_ascend_scopes() {
    // Inner refers to "Sibling" declared in the enclosing package.
    let root = Root::from_json_str(
        r#"{
            "nested": {
                "pkg": {
                    "nested": {
                        "Sibling": { "fields": { "n": { "type": "int32", "id": 1 } } },
                        "Holder": {
                            "fields": { "s": { "type": "Sibling", "id": 1 } }
                        }
                    }
                }
            }
        }"#,
    )
    .unwrap();

    let holder = root.lookup_type("pkg.Holder").unwrap();
    let field = holder.field_by_name("s").unwrap();
    assert!(field.resolved.is_some());
}

#[test]
fn test_duplicate_field_id_rejected() {
    let err = Root::from_json_str(
        r#"{
            "nested": {
                "T": {
                    "fields": {
                        "a": { "type": "int32", "id": 1 },
                        "b": { "type": "int32", "id": 1 }
                    }
                }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::DuplicateId { id: 1, .. }));
}

#[test]
fn test_reserved_ids_and_names_rejected() {
    let err = Root::from_json_str(
        r#"{
            "nested": {
                "T": {
                    "reserved": [[5, 9], "legacy"],
                    "fields": { "x": { "type": "int32", "id": 7 } }
                }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::ReservedField { .. }));

    let err = Root::from_json_str(
        r#"{
            "nested": {
                "T": {
                    "reserved": [[5, 9], "legacy"],
                    "fields": { "legacy": { "type": "int32", "id": 1 } }
                }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::ReservedField { .. }));
}

#[test]
fn test_enum_alias_gated_on_option() {
    let err = Root::from_json_str(
        r#"{ "nested": { "E": { "values": { "A": 0, "B": 0 } } } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::DuplicateEnumValue { value: 0, .. }));

    let root = Root::from_json_str(
        r#"{
            "nested": {
                "E": {
                    "options": { "allow_alias": true },
                    "values": { "A": 0, "ALIAS": 0 }
                }
            }
        }"#,
    )
    .unwrap();
    let e = root.lookup_enum("E").unwrap();
    assert_eq!(e.name_by_number(0), Some("A"));
    assert_eq!(e.value_by_name("ALIAS"), Some(0));
}

#[test]
fn test_map_key_type_allow_list() {
    let err = Root::from_json_str(
        r#"{
            "nested": {
                "T": {
                    "fields": {
                        "m": { "keyType": "double", "type": "int32", "id": 1 }
                    }
                }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::InvalidMapKeyType { .. }));
}

#[test]
fn test_oneof_members_must_be_singular() {
    let err = Root::from_json_str(
        r#"{
            "nested": {
                "T": {
                    "oneofs": { "choice": { "oneof": ["a", "b"] } },
                    "fields": {
                        "a": { "type": "int32", "id": 1 },
                        "b": { "rule": "repeated", "type": "int32", "id": 2 }
                    }
                }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::InvalidRule { .. }));
}

#[test]
fn test_extension_resolves_across_declaration_order() {
    // Extender is declared before its target exists; resolution is deferred
    // until Target is registered.
    let root = Root::from_json_str(
        r#"{
            "nested": {
                "Extender": {
                    "fields": {
                        "extra": { "type": "string", "id": 100, "extend": "Target" }
                    }
                },
                "Target": {
                    "extensions": [[100, 200]],
                    "fields": { "base": { "type": "int32", "id": 1 } }
                }
            }
        }"#,
    )
    .unwrap();

    let target = root.lookup_type("Target").unwrap();
    let sister = target.field_by_id(100).expect("sister field materialized");
    assert_eq!(sister.name, "extra");
    assert!(sister.is_extension);
}

#[test]
fn test_unresolved_extension_fails_resolution() {
    let err = Root::from_json_str(
        r#"{
            "nested": {
                "Extender": {
                    "fields": {
                        "extra": { "type": "string", "id": 100, "extend": "Nowhere" }
                    }
                }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::UnresolvedExtension { .. }));
}

#[test]
fn test_unknown_type_reference_fails_resolution() {
    let err = Root::from_json_str(
        r#"{
            "nested": {
                "T": { "fields": { "x": { "type": "Ghost", "id": 1 } } }
            }
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::TypeNotFound { .. }));
}

#[test]
fn test_descriptor_json_round_trip() {
    let text = r#"{
        "nested": {
            "pkg": {
                "nested": {
                    "Status": {
                        "options": { "allow_alias": true },
                        "values": { "OK": 0, "FINE": 0, "BAD": 1 }
                    },
                    "Item": {
                        "fields": {
                            "name": { "type": "string", "id": 1 },
                            "tags": { "rule": "repeated", "type": "string", "id": 2 },
                            "attrs": { "keyType": "string", "type": "int32", "id": 3 },
                            "status": { "type": "Status", "id": 4 }
                        },
                        "reserved": [[50, 60], "old_name"]
                    }
                }
            }
        }
    }"#;

    let first = Root::from_json_str(text).unwrap();
    let emitted = first.to_json();
    let second = Root::from_json(emitted).expect("emitted descriptor should reload");

    let item = second.lookup_type("pkg.Item").unwrap();
    assert!(item.field_by_name("attrs").unwrap().is_map());
    assert_eq!(item.field_by_name("tags").unwrap().rule, proto_codec::Rule::Repeated);
    assert_eq!(
        second.lookup_enum("pkg.Status").unwrap().value_by_name("FINE"),
        Some(0)
    );
}

#[test]
fn test_namespaces_merge_instead_of_colliding() {
    let mut root = Root::new();
    let first = root.define("a.b").unwrap();
    let second = root.define("a.b").unwrap();
    assert_eq!(first, second);
}
