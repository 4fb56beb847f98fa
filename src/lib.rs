//! # proto-codec
//!
//! Schema-driven Protocol Buffers wire codec with runtime reflection.
//!
//! Schemas are loaded at runtime as JSON descriptors into a [`Root`]
//! reflection graph; a single generic interpreter then encodes, decodes,
//! verifies and converts dynamically-typed message instances against any
//! type in the graph. No code generation step is involved.
//!
//! ## Components
//! - **wire**: varint and fixed-width primitives, [`Reader`] and [`Writer`]
//! - **reflect**: the schema graph ([`Root`], [`MessageType`], [`EnumType`],
//!   [`ServiceType`]) and JSON descriptor interchange
//! - **codec**: the interpreter behind `encode`/`decode`/`verify` and the
//!   JSON conversions
//! - **value**: [`DynamicMessage`] instances and their field [`Value`]s
//!
//! ## Example
//! ```
//! use proto_codec::{Root, Value};
//!
//! let root = Root::from_json_str(r#"{
//!     "nested": {
//!         "Greeting": {
//!             "fields": {
//!                 "text":  { "type": "string", "id": 1 },
//!                 "count": { "type": "int32",  "id": 2 }
//!             }
//!         }
//!     }
//! }"#)?;
//!
//! let greeting = root.lookup_type("Greeting")?;
//! let mut msg = greeting.create();
//! greeting.set(&mut msg, "text", Value::String("hello".into()))?;
//! greeting.set(&mut msg, "count", Value::I32(3))?;
//!
//! let bytes = greeting.encode(&msg)?;
//! let back = greeting.decode(bytes)?;
//! assert_eq!(greeting.get(&back, "count"), Some(&Value::I32(3)));
//! # Ok::<(), proto_codec::CodecError>(())
//! ```
//!
//! ## Concurrency
//! A resolved [`Root`] is immutable and may be shared read-only across
//! threads; every encode/decode call works on its own instance and buffers.

pub mod codec;
pub mod config;
pub mod error;
pub mod reflect;
pub mod utils;
pub mod value;
pub mod wire;

pub use codec::{BytesRepr, ConversionOptions, EnumRepr, LongRepr};
pub use config::CodecConfig;
pub use error::{CodecError, Result};
pub use reflect::{
    EnumType, FieldData, MessageType, Method, NodeId, OneOf, Root, Rule, ScalarType, ServiceType,
};
pub use utils::{BufferPool, PooledBuffer};
pub use value::{DynamicMessage, MapKey, Value};
pub use wire::{Reader, WireType, Writer};
