//! Capture any `Serialize` value as a [`Value`].
//!
//! The capture serializer stands in for runtime reflection: it walks the
//! serde data model and records just enough shape information for the
//! comparison rules.
//!
//! ```text
//! i8..i128 / u8..u128        → Int / Uint, width kept
//! f32 / f64                  → Float, width kept
//! str / char                 → Text
//! bytes                      → growable seq of u8
//! none / unit                → Null
//! some(v)                    → Ref(v)
//! seq                        → growable seq
//! tuple / tuple struct       → fixed seq
//! map                        → Mapping
//! struct / unit struct       → Record (skipped fields become hidden)
//! newtype struct             → transparent
//! unit variant               → Text(variant)
//! other variants             → { variant: payload }
//! ```

use crate::error::SameError;
use crate::value::{
    CANONICAL_TOKEN, Field, FloatWidth, IntWidth, OPAQUE_TOKEN, Opaque, RECORD_TOKEN, Record,
    SequenceKind, Value,
};
use serde::Serialize;
use serde::ser::{self, SerializeStruct};
use std::fmt;

/// Capture `value` as a [`Value`].
pub fn to_value<T>(value: &T) -> Result<Value, SameError>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Attach `T`'s `Display` text to its captured record.
///
/// Two records that both carry canonical text compare by that text alone,
/// letting a type opt out of field-by-field comparison. Values that do not
/// capture as records are passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonical<T>(pub T);

impl<T> Serialize for Canonical<T>
where
    T: Serialize + fmt::Display,
{
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct(CANONICAL_TOKEN, 2)?;
        st.serialize_field("text", &self.0.to_string())?;
        st.serialize_field("value", &self.0)?;
        st.end()
    }
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = SameError;

    type SerializeSeq = SeqCapture;
    type SerializeTuple = SeqCapture;
    type SerializeTupleStruct = SeqCapture;
    type SerializeTupleVariant = VariantCapture<SeqCapture>;
    type SerializeMap = MapCapture;
    type SerializeStruct = RecordCapture;
    type SerializeStructVariant = VariantCapture<RecordCapture>;

    fn serialize_bool(self, v: bool) -> Result<Value, SameError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, SameError> {
        Ok(Value::Int(v.into(), IntWidth::W8))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, SameError> {
        Ok(Value::Int(v.into(), IntWidth::W16))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, SameError> {
        Ok(Value::Int(v.into(), IntWidth::W32))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, SameError> {
        Ok(Value::Int(v.into(), IntWidth::W64))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, SameError> {
        Ok(Value::Int(v, IntWidth::W128))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, SameError> {
        Ok(Value::Uint(v.into(), IntWidth::W8))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, SameError> {
        Ok(Value::Uint(v.into(), IntWidth::W16))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, SameError> {
        Ok(Value::Uint(v.into(), IntWidth::W32))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, SameError> {
        Ok(Value::Uint(v.into(), IntWidth::W64))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, SameError> {
        Ok(Value::Uint(v, IntWidth::W128))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, SameError> {
        Ok(Value::Float(v.into(), FloatWidth::F32))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, SameError> {
        Ok(Value::Float(v, FloatWidth::F64))
    }

    fn serialize_char(self, v: char) -> Result<Value, SameError> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, SameError> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, SameError> {
        Ok(Value::seq(v.iter().copied()))
    }

    fn serialize_none(self) -> Result<Value, SameError> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, SameError>
    where
        T: ?Sized + Serialize,
    {
        Ok(Value::Ref(Box::new(to_value(value)?)))
    }

    fn serialize_unit(self) -> Result<Value, SameError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, SameError> {
        Ok(Value::Record(Record::new(name)))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, SameError> {
        Ok(Value::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, SameError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, SameError>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCapture, SameError> {
        Ok(SeqCapture::new(SequenceKind::Growable, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCapture, SameError> {
        Ok(SeqCapture::new(SequenceKind::Fixed, len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCapture, SameError> {
        Ok(SeqCapture::new(SequenceKind::Fixed, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantCapture<SeqCapture>, SameError> {
        Ok(VariantCapture {
            variant,
            inner: SeqCapture::new(SequenceKind::Fixed, len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapCapture, SameError> {
        Ok(MapCapture {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<RecordCapture, SameError> {
        Ok(RecordCapture::new(name, len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantCapture<RecordCapture>, SameError> {
        Ok(VariantCapture {
            variant,
            inner: RecordCapture::new(variant, len),
        })
    }
}

fn tagged(variant: &str, payload: Value) -> Value {
    Value::Mapping(vec![(Value::Text(variant.to_string()), payload)])
}

struct SeqCapture {
    kind: SequenceKind,
    items: Vec<Value>,
}

impl SeqCapture {
    fn new(kind: SequenceKind, len: usize) -> Self {
        Self {
            kind,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SameError> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        Value::Sequence(self.kind, self.items)
    }
}

impl ser::SerializeSeq for SeqCapture {
    type Ok = Value;
    type Error = SameError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SameError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, SameError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqCapture {
    type Ok = Value;
    type Error = SameError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SameError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, SameError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqCapture {
    type Ok = Value;
    type Error = SameError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SameError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, SameError> {
        Ok(self.finish())
    }
}

struct MapCapture {
    entries: Vec<(Value, Value)>,
    pending_key: Option<Value>,
}

impl ser::SerializeMap for MapCapture {
    type Ok = Value;
    type Error = SameError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), SameError> {
        self.pending_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SameError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| SameError::Capture("map value serialized before its key".to_string()))?;
        self.entries.push((key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value, SameError> {
        if self.pending_key.is_some() {
            return Err(SameError::Capture(
                "map key serialized without a value".to_string(),
            ));
        }
        Ok(Value::Mapping(self.entries))
    }
}

struct RecordCapture {
    name: &'static str,
    fields: Vec<Field>,
}

impl RecordCapture {
    fn new(name: &'static str, len: usize) -> Self {
        Self {
            name,
            fields: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), SameError> {
        self.fields.push(Field {
            name: key.to_string(),
            value: Some(to_value(value)?),
        });
        Ok(())
    }

    fn finish(self) -> Result<Value, SameError> {
        match self.name {
            RECORD_TOKEN => rebuild_record(self.fields),
            OPAQUE_TOKEN => rebuild_opaque(self.fields),
            CANONICAL_TOKEN => apply_canonical(self.fields),
            name => Ok(Value::Record(Record::from_parts(
                name.to_string(),
                self.fields,
                None,
            ))),
        }
    }
}

impl ser::SerializeStruct for RecordCapture {
    type Ok = Value;
    type Error = SameError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SameError> {
        self.push(key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), SameError> {
        self.fields.push(Field {
            name: key.to_string(),
            value: None,
        });
        Ok(())
    }

    fn end(self) -> Result<Value, SameError> {
        self.finish()
    }
}

struct VariantCapture<C> {
    variant: &'static str,
    inner: C,
}

impl ser::SerializeTupleVariant for VariantCapture<SeqCapture> {
    type Ok = Value;
    type Error = SameError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SameError> {
        self.inner.push(value)
    }

    fn end(self) -> Result<Value, SameError> {
        Ok(tagged(self.variant, self.inner.finish()))
    }
}

impl ser::SerializeStructVariant for VariantCapture<RecordCapture> {
    type Ok = Value;
    type Error = SameError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SameError> {
        self.inner.push(key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), SameError> {
        ser::SerializeStruct::skip_field(&mut self.inner, key)
    }

    fn end(self) -> Result<Value, SameError> {
        let payload = Value::Record(Record::from_parts(
            self.variant.to_string(),
            self.inner.fields,
            None,
        ));
        Ok(tagged(self.variant, payload))
    }
}

fn take_field(fields: &mut Vec<Field>, name: &str) -> Result<Value, SameError> {
    let index = fields
        .iter()
        .position(|field| field.name == name)
        .ok_or_else(|| SameError::Capture(format!("token struct is missing `{name}`")))?;
    fields
        .remove(index)
        .value
        .ok_or_else(|| SameError::Capture(format!("token struct field `{name}` was skipped")))
}

fn expect_text(value: Value, what: &str) -> Result<String, SameError> {
    match value {
        Value::Text(text) => Ok(text),
        other => Err(SameError::Capture(format!(
            "{what} must be text, got {other}"
        ))),
    }
}

/// Undo one `serialize_some`, mapping `None` to an unreadable marker.
fn unwrap_optional(value: Value) -> Option<Value> {
    match value {
        Value::Ref(inner) => Some(*inner),
        _ => None,
    }
}

fn rebuild_record(mut fields: Vec<Field>) -> Result<Value, SameError> {
    let name = expect_text(take_field(&mut fields, "name")?, "record name")?;
    let canonical = unwrap_optional(take_field(&mut fields, "canonical")?)
        .map(|text| expect_text(text, "canonical text"))
        .transpose()?;
    let entries = match take_field(&mut fields, "fields")? {
        Value::Sequence(_, entries) => entries,
        other => {
            return Err(SameError::Capture(format!(
                "record fields must be a sequence, got {other}"
            )));
        }
    };

    let mut rebuilt = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut pair = match entry {
            Value::Sequence(_, pair) => pair,
            other => {
                return Err(SameError::Capture(format!(
                    "record field must be a (name, value) pair, got {other}"
                )));
            }
        };
        if pair.len() != 2 {
            return Err(SameError::Capture(format!(
                "record field must be a (name, value) pair, got {} items",
                pair.len()
            )));
        }
        let value = unwrap_optional(pair.pop().unwrap_or(Value::Null));
        let name = expect_text(pair.pop().unwrap_or(Value::Null), "field name")?;
        rebuilt.push(Field { name, value });
    }
    Ok(Value::Record(Record::from_parts(name, rebuilt, canonical)))
}

fn rebuild_opaque(mut fields: Vec<Field>) -> Result<Value, SameError> {
    let type_name = expect_text(take_field(&mut fields, "type_name")?, "opaque type name")?;
    let rendering = expect_text(take_field(&mut fields, "rendering")?, "opaque rendering")?;
    Ok(Value::Opaque(Opaque {
        type_name,
        rendering,
    }))
}

fn apply_canonical(mut fields: Vec<Field>) -> Result<Value, SameError> {
    let text = expect_text(take_field(&mut fields, "text")?, "canonical text")?;
    match take_field(&mut fields, "value")? {
        Value::Record(mut record) => {
            record.set_canonical(text);
            Ok(Value::Record(record))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Person {
        fname: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    }

    #[derive(Serialize)]
    enum Event {
        Ping,
        Move { x: i32, y: i32 },
        Resize(u16, u16),
        Named(String),
    }

    #[test]
    fn integers_keep_width() {
        assert_eq!(to_value(&5i8).unwrap(), Value::Int(5, IntWidth::W8));
        assert_eq!(to_value(&5u64).unwrap(), Value::Uint(5, IntWidth::W64));
        assert_eq!(to_value(&-5i128).unwrap(), Value::Int(-5, IntWidth::W128));
    }

    #[test]
    fn vec_is_growable_and_array_is_fixed() {
        assert!(matches!(
            to_value(&vec![1u8, 2]).unwrap(),
            Value::Sequence(SequenceKind::Growable, _)
        ));
        assert!(matches!(
            to_value(&[1u8, 2]).unwrap(),
            Value::Sequence(SequenceKind::Fixed, _)
        ));
    }

    #[test]
    fn option_captures_as_indirection() {
        assert_eq!(to_value(&Some(3u8)).unwrap(), Value::reference(3u8));
        assert_eq!(to_value(&None::<u8>).unwrap(), Value::Null);
    }

    #[test]
    fn skipped_fields_are_hidden() {
        let v = to_value(&Person {
            fname: "Russ".into(),
            nickname: None,
        })
        .unwrap();
        let Value::Record(record) = v else {
            panic!("expected record, got {v:?}");
        };
        assert_eq!(record.name(), "Person");
        assert_eq!(record.len(), 2);
        assert!(!record.field("nickname").unwrap().is_readable());
    }

    #[test]
    fn enum_variants_follow_external_tagging() {
        assert_eq!(to_value(&Event::Ping).unwrap(), Value::from("Ping"));
        assert_eq!(
            to_value(&Event::Resize(3, 4)).unwrap(),
            Value::mapping([("Resize", Value::array([3u16, 4]))])
        );
        assert_eq!(
            to_value(&Event::Named("x".into())).unwrap(),
            Value::mapping([("Named", "x")])
        );
        let moved = to_value(&Event::Move { x: 1, y: 2 }).unwrap();
        let expected = Record::new("Move").with_field("x", 1i32).with_field("y", 2i32);
        assert_eq!(moved, Value::mapping([("Move", expected)]));
    }

    #[test]
    fn map_entries_are_captured() {
        let mut m = BTreeMap::new();
        m.insert("a", 1u32);
        assert_eq!(to_value(&m).unwrap(), Value::mapping([("a", 1u32)]));
    }

    #[test]
    fn values_recapture_unchanged() {
        let original = Value::mapping([
            (
                Value::from("who"),
                Value::Record(
                    Record::new("Person")
                        .with_field("age", 42u8)
                        .with_field("spouse", Value::Null)
                        .with_field("alias", Value::reference("rolsen"))
                        .with_hidden_field("secret")
                        .with_canonical("Russ"),
                ),
            ),
            (Value::from(1.5f32), Value::array([Value::Null, Value::from(true)])),
            (Value::from(-3i128), Value::opaque("fn()", "<fn>")),
        ]);
        assert_eq!(to_value(&original).unwrap(), original);
    }

    #[test]
    fn canonical_attaches_display_text() {
        #[derive(Serialize)]
        struct Version {
            major: u8,
            minor: u8,
        }
        impl fmt::Display for Version {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "v{}.{}", self.major, self.minor)
            }
        }

        let v = to_value(&Canonical(Version { major: 1, minor: 2 })).unwrap();
        let Value::Record(record) = v else {
            panic!("expected record, got {v:?}");
        };
        assert_eq!(record.canonical(), Some("v1.2"));
        assert_eq!(record.len(), 2);

        // Non-record payloads pass through.
        assert_eq!(to_value(&Canonical(7u8)).unwrap(), Value::from(7u8));
    }

    #[test]
    fn custom_errors_surface_as_capture_errors() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: ser::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(ser::Error::custom("nope"))
            }
        }
        let err = to_value(&vec![Broken]).unwrap_err();
        assert!(matches!(err, SameError::Capture(ref msg) if msg == "nope"));
    }
}
