//! The comparable value model.
//!
//! Rust has no runtime reflection, so every value the kernel compares is
//! first reified into a [`Value`]: a closed tree that keeps exactly the
//! information the comparison rules need (numeric width, sequence variant,
//! record field names and readability) and nothing else.
//!
//! Values are owned trees. They carry no identity and are never mutated
//! by a comparison.

use serde::ser::{SerializeStruct, SerializeTuple};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Struct name under which a [`Record`] travels through serde.
pub(crate) const RECORD_TOKEN: &str = "$same_kernel::private::Record";

/// Struct name under which an [`Opaque`] travels through serde.
pub(crate) const OPAQUE_TOKEN: &str = "$same_kernel::private::Opaque";

/// Struct name used by [`crate::Canonical`] to attach canonical text.
pub(crate) const CANONICAL_TOKEN: &str = "$same_kernel::private::Canonical";

/// Declared bit width of an integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    W128,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
            Self::W128 => 128,
        }
    }
}

/// Declared precision of a float.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FloatWidth {
    F32,
    F64,
}

/// Whether a sequence has a length fixed by its type (arrays, tuples) or
/// a growable one (vectors, slices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    Fixed,
    Growable,
}

/// A dynamically shaped value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The universal absent value.
    Null,
    Int(i128, IntWidth),
    Uint(u128, IntWidth),
    /// Always stored at full precision; `f32` inputs are widened losslessly.
    Float(f64, FloatWidth),
    Bool(bool),
    Text(String),
    Sequence(SequenceKind, Vec<Value>),
    /// Entries in whatever order the source enumerated them.
    Mapping(Vec<(Value, Value)>),
    Record(Record),
    /// One level of indirection. See [`Value::resolve`].
    Ref(Box<Value>),
    /// A value the kernel has no comparison rule for.
    Opaque(Opaque),
}

impl Value {
    /// A growable sequence.
    pub fn seq(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Sequence(
            SequenceKind::Growable,
            items.into_iter().map(Into::into).collect(),
        )
    }

    /// A fixed-length sequence.
    pub fn array(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Sequence(
            SequenceKind::Fixed,
            items.into_iter().map(Into::into).collect(),
        )
    }

    /// A mapping with dynamically typed keys and values.
    pub fn mapping<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// An indirection to `target`.
    pub fn reference(target: impl Into<Value>) -> Self {
        Self::Ref(Box::new(target.into()))
    }

    pub fn opaque(type_name: impl Into<String>, rendering: impl Into<String>) -> Self {
        Self::Opaque(Opaque {
            type_name: type_name.into(),
            rendering: rendering.into(),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Follow indirections until a non-`Ref` value is reached.
    pub fn resolve(&self) -> &Value {
        let mut current = self;
        while let Self::Ref(target) = current {
            current = target;
        }
        current
    }
}

/// A struct-like value with named fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    name: String,
    fields: Vec<Field>,
    canonical: Option<String>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            canonical: None,
        }
    }

    /// Append a readable field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Append a field that exists but cannot be read from outside.
    pub fn with_hidden_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: None,
        });
        self
    }

    /// Attach the record's canonical text rendering.
    ///
    /// When both sides of a record comparison carry canonical text, the
    /// texts are compared and the fields are ignored.
    pub fn with_canonical(mut self, text: impl Into<String>) -> Self {
        self.canonical = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn canonical(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    /// Field count, hidden fields included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The first field declared with `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub(crate) fn from_parts(
        name: String,
        fields: Vec<Field>,
        canonical: Option<String>,
    ) -> Self {
        Self {
            name,
            fields,
            canonical,
        }
    }

    pub(crate) fn set_canonical(&mut self, text: String) {
        self.canonical = Some(text);
    }
}

/// One named field of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// `None` when the field is not externally readable.
    pub value: Option<Value>,
}

impl Field {
    pub fn is_readable(&self) -> bool {
        self.value.is_some()
    }
}

/// A value outside the kernel's comparison rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Opaque {
    pub type_name: String,
    pub rendering: String,
}

macro_rules! from_int {
    ($($ty:ty => $variant:ident, $width:ident;)*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::$variant(n.into(), IntWidth::$width)
                }
            }
        )*
    };
}

from_int! {
    i8 => Int, W8;
    i16 => Int, W16;
    i32 => Int, W32;
    i64 => Int, W64;
    i128 => Int, W128;
    u8 => Uint, W8;
    u16 => Uint, W16;
    u32 => Uint, W32;
    u64 => Uint, W64;
    u128 => Uint, W128;
}

impl From<isize> for Value {
    fn from(n: isize) -> Self {
        Value::Int(n as i128, IntWidth::W64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Uint(n as u128, IntWidth::W64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f.into(), FloatWidth::F32)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f, FloatWidth::F64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::seq(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Value::reference(v),
            None => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(n, _) => write!(f, "{n}"),
            Self::Uint(n, _) => write!(f, "{n}"),
            Self::Float(x, FloatWidth::F32) if f64::from(*x as f32) == *x => {
                write!(f, "{}", *x as f32)
            }
            Self::Float(x, _) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Sequence(_, items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Self::Record(record) => write!(f, "{record}"),
            Self::Ref(target) => write!(f, "&{target}"),
            Self::Opaque(opaque) => write!(f, "{}", opaque.rendering),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.canonical {
            return write!(f, "{text}");
        }
        if self.fields.is_empty() {
            return write!(f, "{}", self.name);
        }
        write!(f, "{} {{ ", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &field.value {
                Some(value) => write!(f, "{}: {value}", field.name)?,
                None => write!(f, "{}: <hidden>", field.name)?,
            }
        }
        write!(f, " }}")
    }
}

// Records and opaques serialize as token structs so that capture can
// rebuild them exactly; other serializers see ordinary structs.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            // Narrow only when the value fits its declared width; otherwise
            // emit all 128 bits so nothing is truncated.
            Self::Int(n, width) => {
                let n = *n;
                match width {
                    IntWidth::W8 => match i8::try_from(n) {
                        Ok(v) => serializer.serialize_i8(v),
                        Err(_) => serializer.serialize_i128(n),
                    },
                    IntWidth::W16 => match i16::try_from(n) {
                        Ok(v) => serializer.serialize_i16(v),
                        Err(_) => serializer.serialize_i128(n),
                    },
                    IntWidth::W32 => match i32::try_from(n) {
                        Ok(v) => serializer.serialize_i32(v),
                        Err(_) => serializer.serialize_i128(n),
                    },
                    IntWidth::W64 => match i64::try_from(n) {
                        Ok(v) => serializer.serialize_i64(v),
                        Err(_) => serializer.serialize_i128(n),
                    },
                    IntWidth::W128 => serializer.serialize_i128(n),
                }
            }
            Self::Uint(n, width) => {
                let n = *n;
                match width {
                    IntWidth::W8 => match u8::try_from(n) {
                        Ok(v) => serializer.serialize_u8(v),
                        Err(_) => serializer.serialize_u128(n),
                    },
                    IntWidth::W16 => match u16::try_from(n) {
                        Ok(v) => serializer.serialize_u16(v),
                        Err(_) => serializer.serialize_u128(n),
                    },
                    IntWidth::W32 => match u32::try_from(n) {
                        Ok(v) => serializer.serialize_u32(v),
                        Err(_) => serializer.serialize_u128(n),
                    },
                    IntWidth::W64 => match u64::try_from(n) {
                        Ok(v) => serializer.serialize_u64(v),
                        Err(_) => serializer.serialize_u128(n),
                    },
                    IntWidth::W128 => serializer.serialize_u128(n),
                }
            }
            Self::Float(x, FloatWidth::F32) if f64::from(*x as f32) == *x => {
                serializer.serialize_f32(*x as f32)
            }
            Self::Float(x, _) => serializer.serialize_f64(*x),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Sequence(SequenceKind::Growable, items) => serializer.collect_seq(items),
            Self::Sequence(SequenceKind::Fixed, items) => {
                let mut tuple = serializer.serialize_tuple(items.len())?;
                for item in items {
                    tuple.serialize_element(item)?;
                }
                tuple.end()
            }
            Self::Mapping(entries) => {
                serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
            }
            Self::Record(record) => {
                let fields: Vec<(&str, Option<&Value>)> = record
                    .fields
                    .iter()
                    .map(|field| (field.name.as_str(), field.value.as_ref()))
                    .collect();
                let mut st = serializer.serialize_struct(RECORD_TOKEN, 3)?;
                st.serialize_field("name", &record.name)?;
                st.serialize_field("fields", &fields)?;
                st.serialize_field("canonical", &record.canonical)?;
                st.end()
            }
            Self::Ref(target) => serializer.serialize_some(target.as_ref()),
            Self::Opaque(opaque) => {
                let mut st = serializer.serialize_struct(OPAQUE_TOKEN, 2)?;
                st.serialize_field("type_name", &opaque.type_name)?;
                st.serialize_field("rendering", &opaque.rendering)?;
                st.end()
            }
        }
    }
}
