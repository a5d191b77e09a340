//! Static field tables that drive [`ByteCursor`] reads.
//!
//! A layout lists fields in binary order; reading produces a [`Record`] by
//! running the typed read for each field in turn. Order is significant and
//! must match the on-disk layout exactly.

use crate::cursor::ByteCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16Le,
    U16Be,
    U32Le,
    U32Be,
    /// Fixed-length Latin-1 string of this many bytes.
    Str(usize),
    /// Raw bytes.
    Bytes(usize),
    /// Little-endian `u16` array occupying this many bytes.
    U16ArrayLe(usize),
    /// Little-endian `u32` array occupying this many bytes.
    U32ArrayLe(usize),
}

impl FieldKind {
    /// Bytes consumed from the input by this field.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16Le | FieldKind::U16Be => 2,
            FieldKind::U32Le | FieldKind::U32Be => 4,
            FieldKind::Str(n)
            | FieldKind::Bytes(n)
            | FieldKind::U16ArrayLe(n)
            | FieldKind::U32ArrayLe(n) => n,
        }
    }

    fn read(self, cursor: &mut ByteCursor<'_>) -> FieldValue {
        match self {
            FieldKind::U8 => FieldValue::Int(u32::from(cursor.read_u8())),
            FieldKind::U16Le => FieldValue::Int(u32::from(cursor.read_u16_le())),
            FieldKind::U16Be => FieldValue::Int(u32::from(cursor.read_u16_be())),
            FieldKind::U32Le => FieldValue::Int(cursor.read_u32_le()),
            FieldKind::U32Be => FieldValue::Int(cursor.read_u32_be()),
            FieldKind::Str(n) => FieldValue::Str(cursor.read_string(n)),
            FieldKind::Bytes(n) => FieldValue::Bytes(cursor.read_u8_array(n)),
            FieldKind::U16ArrayLe(n) => FieldValue::U16s(cursor.read_u16_array_le(n)),
            FieldKind::U32ArrayLe(n) => FieldValue::U32s(cursor.read_u32_array_le(n)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StructLayout {
    fields: &'static [Field],
}

impl StructLayout {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Total encoded size in bytes.
    pub const fn size(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.fields.len() {
            total += self.fields[i].kind.width();
            i += 1;
        }
        total
    }

    pub fn read(&self, cursor: &mut ByteCursor<'_>) -> Record {
        let values = self
            .fields
            .iter()
            .map(|f| (f.name, f.kind.read(cursor)))
            .collect();
        Record { values }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Int(u32),
    Str(String),
    Bytes(Vec<u8>),
    U16s(Vec<u16>),
    U32s(Vec<u32>),
}

/// Field values in layout order, addressable by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    values: Vec<(&'static str, FieldValue)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Integer field value; zero when absent or not an integer.
    pub fn int(&self, name: &str) -> u32 {
        match self.get(name) {
            Some(FieldValue::Int(v)) => *v,
            _ => 0,
        }
    }

    pub fn str(&self, name: &str) -> &str {
        match self.get(name) {
            Some(FieldValue::Str(s)) => s,
            _ => "",
        }
    }

    pub fn bytes(&self, name: &str) -> &[u8] {
        match self.get(name) {
            Some(FieldValue::Bytes(v)) => v,
            _ => &[],
        }
    }

    pub fn u16s(&self, name: &str) -> &[u16] {
        match self.get(name) {
            Some(FieldValue::U16s(v)) => v,
            _ => &[],
        }
    }

    pub fn u32s(&self, name: &str) -> &[u32] {
        match self.get(name) {
            Some(FieldValue::U32s(v)) => v,
            _ => &[],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }
}

/// A structure with a fixed binary layout.
pub trait FromRecord: Sized {
    const LAYOUT: StructLayout;

    fn from_record(record: &Record) -> Self;
}
