// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample record types.

use serde::{Deserialize, Serialize};
use tinystore_core::{FieldDecl, FieldKind, Record};

/// Nested value stored in [`Sample::meta`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMeta {
    pub tags: Vec<String>,
    pub score: Option<u32>,
}

/// A record with one field of every kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub label: String,
    pub int: isize,
    pub int8: i8,
    pub int16: i16,
    pub int32: i32,
    pub int64: i64,
    pub uint: usize,
    pub uint8: u8,
    pub uint16: u16,
    pub uint32: u32,
    pub uint64: u64,
    pub float: f32,
    pub double: f64,
    pub flag: bool,
    pub meta: SampleMeta,
}

impl Sample {
    /// Ordinary values, with `rank` in the numeric fields.
    pub fn new(id: impl Into<String>, rank: u32) -> Self {
        Self {
            id: id.into(),
            label: format!("sample {rank}"),
            int: rank as isize,
            int8: (rank % 100) as i8,
            int16: rank as i16,
            int32: rank as i32,
            int64: i64::from(rank),
            uint: rank as usize,
            uint8: (rank % 200) as u8,
            uint16: rank as u16,
            uint32: rank,
            uint64: u64::from(rank),
            float: rank as f32 + 0.5,
            double: f64::from(rank) / 3.0,
            flag: rank % 2 == 0,
            meta: SampleMeta {
                tags: vec![format!("r{rank}")],
                score: Some(rank),
            },
        }
    }

    /// Boundary values for every width.
    pub fn extremes(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: "it's \"quoted\"; DROP TABLE x; --".into(),
            int: isize::MIN,
            int8: i8::MIN,
            int16: i16::MAX,
            int32: i32::MIN,
            int64: i64::MAX,
            uint: usize::MAX,
            uint8: u8::MAX,
            uint16: u16::MAX,
            uint32: u32::MAX,
            uint64: u64::MAX,
            float: -0.1,
            double: 1.0e-300,
            flag: false,
            meta: SampleMeta {
                tags: vec!["ünïcödé".into(), String::new()],
                score: None,
            },
        }
    }
}

impl Record for Sample {
    const FIELDS: &'static [FieldDecl] = &[
        FieldDecl::new("label", FieldKind::String),
        FieldDecl::new("int", FieldKind::Int),
        FieldDecl::new("int8", FieldKind::Int8),
        FieldDecl::new("int16", FieldKind::Int16),
        FieldDecl::new("int32", FieldKind::Int32),
        FieldDecl::new("int64", FieldKind::Int64),
        FieldDecl::new("uint", FieldKind::UInt),
        FieldDecl::new("uint8", FieldKind::UInt8),
        FieldDecl::new("uint16", FieldKind::UInt16),
        FieldDecl::new("uint32", FieldKind::UInt32),
        FieldDecl::new("uint64", FieldKind::UInt64),
        FieldDecl::new("float", FieldKind::Float),
        FieldDecl::new("double", FieldKind::Double),
        FieldDecl::new("flag", FieldKind::Bool),
        FieldDecl::new("meta", FieldKind::Object),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn template() -> Self {
        Self::new("template", 1)
    }
}

/// A contact card. `email` is required on decode; `nickname` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: u32,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl Contact {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: u32) -> Self {
        let id = id.into();
        Self {
            email: format!("{id}@example.com"),
            id,
            name: name.into(),
            age,
            nickname: None,
        }
    }
}

impl Record for Contact {
    const FIELDS: &'static [FieldDecl] = &[
        FieldDecl::new("name", FieldKind::String),
        FieldDecl::new("email", FieldKind::String),
        FieldDecl::new("age", FieldKind::UInt32),
        FieldDecl::new("nickname", FieldKind::String),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn template() -> Self {
        Self {
            id: String::new(),
            name: "name".into(),
            email: "email".into(),
            age: 1,
            nickname: Some("nick".into()),
        }
    }
}
