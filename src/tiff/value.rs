//! Tagged field values
//!
//! [`TagValue`] is the in-memory form of a directory entry's payload. Reads
//! decode file bytes into the variant matching the entry type; the getters
//! then convert to whatever representation a caller needs.

use std::fmt;

use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::TagType;
use crate::utils::string_utils::{latin1_decode, latin1_encode};

/// A field value
///
/// Rationals are held as floating point. Scalars and one-element arrays
/// are interchangeable for every getter.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(u8),
    SByte(i8),
    Short(u16),
    SShort(i16),
    Long(u32),
    SLong(i32),
    Long8(u64),
    SLong8(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    SBytes(Vec<i8>),
    Shorts(Vec<u16>),
    SShorts(Vec<i16>),
    Longs(Vec<u32>),
    SLongs(Vec<i32>),
    Long8s(Vec<u64>),
    SLong8s(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Text(String),
}

trait NativeScalar: Copy {
    const WIDTH: usize;
    fn from_ne_slice(bytes: &[u8]) -> Self;
}

macro_rules! native_scalar {
    ($($t:ty),*) => {
        $(impl NativeScalar for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn from_ne_slice(bytes: &[u8]) -> Self {
                let mut arr = [0u8; std::mem::size_of::<$t>()];
                arr.copy_from_slice(bytes);
                <$t>::from_ne_bytes(arr)
            }
        })*
    };
}

native_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Views a byte sequence as native-endian elements; fails on a partial element
fn reinterpret<T: NativeScalar>(bytes: &[u8]) -> Option<Vec<T>> {
    if bytes.len() % T::WIDTH != 0 {
        return None;
    }
    Some(bytes.chunks_exact(T::WIDTH).map(T::from_ne_slice).collect())
}

fn one_or_many<T>(values: Vec<T>, one: fn(T) -> TagValue, many: fn(Vec<T>) -> TagValue) -> TagValue {
    match <[T; 1]>::try_from(values) {
        Ok([value]) => one(value),
        Err(values) => many(values),
    }
}

macro_rules! int_getter {
    ($(#[$doc:meta])* $name:ident, $t:ty) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<$t> {
            match self {
                TagValue::Byte(v) => Some(*v as $t),
                TagValue::SByte(v) => Some(*v as $t),
                TagValue::Short(v) => Some(*v as $t),
                TagValue::SShort(v) => Some(*v as $t),
                TagValue::Long(v) => Some(*v as $t),
                TagValue::SLong(v) => Some(*v as $t),
                TagValue::Long8(v) => Some(*v as $t),
                TagValue::SLong8(v) => Some(*v as $t),
                _ => self.single().and_then(|v| v.$name()),
            }
        }
    };
}

macro_rules! float_getter {
    ($(#[$doc:meta])* $name:ident, $t:ty) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<$t> {
            match self {
                TagValue::Float(v) => Some(*v as $t),
                TagValue::Double(v) => Some(*v as $t),
                TagValue::Byte(v) => Some(*v as $t),
                TagValue::SByte(v) => Some(*v as $t),
                TagValue::Short(v) => Some(*v as $t),
                TagValue::SShort(v) => Some(*v as $t),
                TagValue::Long(v) => Some(*v as $t),
                TagValue::SLong(v) => Some(*v as $t),
                TagValue::Long8(v) => Some(*v as $t),
                TagValue::SLong8(v) => Some(*v as $t),
                _ => self.single().and_then(|v| v.$name()),
            }
        }
    };
}

macro_rules! array_getter {
    ($(#[$doc:meta])* $name:ident, $t:ty, $from_float:expr) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<Vec<$t>> {
            let from_float: bool = $from_float;
            match self {
                TagValue::Bytes(v) => reinterpret::<$t>(v),
                TagValue::Text(s) => reinterpret::<$t>(&latin1_encode(s)),
                TagValue::SBytes(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::Shorts(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::SShorts(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::Longs(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::SLongs(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::Long8s(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::SLong8s(v) => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::Floats(v) if from_float => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::Doubles(v) if from_float => Some(v.iter().map(|&x| x as $t).collect()),
                TagValue::Byte(v) => Some(vec![*v as $t]),
                TagValue::SByte(v) => Some(vec![*v as $t]),
                TagValue::Short(v) => Some(vec![*v as $t]),
                TagValue::SShort(v) => Some(vec![*v as $t]),
                TagValue::Long(v) => Some(vec![*v as $t]),
                TagValue::SLong(v) => Some(vec![*v as $t]),
                TagValue::Long8(v) => Some(vec![*v as $t]),
                TagValue::SLong8(v) => Some(vec![*v as $t]),
                TagValue::Float(v) if from_float => Some(vec![*v as $t]),
                TagValue::Double(v) if from_float => Some(vec![*v as $t]),
                _ => None,
            }
        }
    };
}

impl TagValue {
    /// The scalar held by a one-element array
    fn single(&self) -> Option<TagValue> {
        let value = match self {
            TagValue::Bytes(v) if v.len() == 1 => TagValue::Byte(v[0]),
            TagValue::SBytes(v) if v.len() == 1 => TagValue::SByte(v[0]),
            TagValue::Shorts(v) if v.len() == 1 => TagValue::Short(v[0]),
            TagValue::SShorts(v) if v.len() == 1 => TagValue::SShort(v[0]),
            TagValue::Longs(v) if v.len() == 1 => TagValue::Long(v[0]),
            TagValue::SLongs(v) if v.len() == 1 => TagValue::SLong(v[0]),
            TagValue::Long8s(v) if v.len() == 1 => TagValue::Long8(v[0]),
            TagValue::SLong8s(v) if v.len() == 1 => TagValue::SLong8(v[0]),
            TagValue::Floats(v) if v.len() == 1 => TagValue::Float(v[0]),
            TagValue::Doubles(v) if v.len() == 1 => TagValue::Double(v[0]),
            _ => return None,
        };
        Some(value)
    }

    int_getter!(
        /// Integer value narrowed to u8 (truncating)
        as_u8, u8
    );
    int_getter!(as_i8, i8);
    int_getter!(
        /// Integer value narrowed to u16 (truncating)
        as_u16, u16
    );
    int_getter!(as_i16, i16);
    int_getter!(
        /// Integer value narrowed to u32 (truncating)
        as_u32, u32
    );
    int_getter!(as_i32, i32);
    int_getter!(as_u64, u64);
    int_getter!(as_i64, i64);
    float_getter!(
        /// Numeric value as f32; integers convert
        as_f32, f32
    );
    float_getter!(as_f64, f64);

    array_getter!(
        /// Elements as bytes; text yields its ISO-8859-1 bytes
        to_u8_vec, u8, false
    );
    array_getter!(to_i8_vec, i8, false);
    array_getter!(
        /// Elements as u16. A byte sequence is reinterpreted natively and
        /// must hold a whole number of elements.
        to_u16_vec, u16, false
    );
    array_getter!(to_i16_vec, i16, false);
    array_getter!(to_u32_vec, u32, false);
    array_getter!(to_i32_vec, i32, false);
    array_getter!(to_u64_vec, u64, false);
    array_getter!(to_i64_vec, i64, false);
    array_getter!(to_f32_vec, f32, true);
    array_getter!(to_f64_vec, f64, true);

    /// Text value; byte sequences decode up to the first NUL
    pub fn as_text(&self) -> Option<String> {
        match self {
            TagValue::Text(s) => Some(s.clone()),
            TagValue::Bytes(v) => Some(latin1_decode(v)),
            _ => None,
        }
    }

    /// Number of elements this value occupies in a directory entry
    pub fn count(&self) -> usize {
        match self {
            TagValue::Bytes(v) => v.len(),
            TagValue::SBytes(v) => v.len(),
            TagValue::Shorts(v) => v.len(),
            TagValue::SShorts(v) => v.len(),
            TagValue::Longs(v) => v.len(),
            TagValue::SLongs(v) => v.len(),
            TagValue::Long8s(v) => v.len(),
            TagValue::SLong8s(v) => v.len(),
            TagValue::Floats(v) => v.len(),
            TagValue::Doubles(v) => v.len(),
            TagValue::Text(s) => s.chars().count() + 1,
            _ => 1,
        }
    }

    /// The file type this value maps to without conversion
    pub fn natural_type(&self) -> TagType {
        match self {
            TagValue::Byte(_) | TagValue::Bytes(_) => TagType::Byte,
            TagValue::SByte(_) | TagValue::SBytes(_) => TagType::SByte,
            TagValue::Short(_) | TagValue::Shorts(_) => TagType::Short,
            TagValue::SShort(_) | TagValue::SShorts(_) => TagType::SShort,
            TagValue::Long(_) | TagValue::Longs(_) => TagType::Long,
            TagValue::SLong(_) | TagValue::SLongs(_) => TagType::SLong,
            TagValue::Long8(_) | TagValue::Long8s(_) => TagType::Long8,
            TagValue::SLong8(_) | TagValue::SLong8s(_) => TagType::SLong8,
            TagValue::Float(_) | TagValue::Floats(_) => TagType::Float,
            TagValue::Double(_) | TagValue::Doubles(_) => TagType::Double,
            TagValue::Text(_) => TagType::Ascii,
        }
    }

    /// Converts to the variant a value of `tag_type` decodes to.
    ///
    /// Rational types convert to doubles. Returns `None` when the value has
    /// no representation in that type.
    pub fn convert(&self, tag_type: TagType) -> Option<TagValue> {
        let value = match tag_type {
            TagType::Any => self.clone(),
            TagType::Ascii => TagValue::Text(self.as_text()?),
            TagType::Byte => one_or_many(self.to_u8_vec()?, TagValue::Byte, TagValue::Bytes),
            TagType::Undefined => TagValue::Bytes(self.to_u8_vec()?),
            TagType::SByte => one_or_many(self.to_i8_vec()?, TagValue::SByte, TagValue::SBytes),
            TagType::Short => one_or_many(self.to_u16_vec()?, TagValue::Short, TagValue::Shorts),
            TagType::SShort => one_or_many(self.to_i16_vec()?, TagValue::SShort, TagValue::SShorts),
            TagType::Long | TagType::Ifd => one_or_many(self.to_u32_vec()?, TagValue::Long, TagValue::Longs),
            TagType::SLong => one_or_many(self.to_i32_vec()?, TagValue::SLong, TagValue::SLongs),
            TagType::Long8 | TagType::Ifd8 => one_or_many(self.to_u64_vec()?, TagValue::Long8, TagValue::Long8s),
            TagType::SLong8 => one_or_many(self.to_i64_vec()?, TagValue::SLong8, TagValue::SLong8s),
            TagType::Float => one_or_many(self.to_f32_vec()?, TagValue::Float, TagValue::Floats),
            TagType::Double | TagType::Rational | TagType::SRational => {
                one_or_many(self.to_f64_vec()?, TagValue::Double, TagValue::Doubles)
            }
        };
        Some(value)
    }

    /// Decodes `count` elements of `tag_type` from file-order bytes
    pub fn decode(tag_type: TagType, count: usize, raw: &[u8], handler: &dyn ByteOrderHandler) -> TiffResult<TagValue> {
        let needed = count
            .checked_mul(tag_type.size())
            .ok_or(TiffError::Overflow("tag value size"))?;
        if raw.len() < needed {
            return Err(TiffError::FormatError(format!(
                "Truncated {} value: {} bytes for {} elements", tag_type, raw.len(), count
            )));
        }
        let raw = &raw[..needed];

        let value = match tag_type {
            TagType::Any => {
                return Err(TiffError::FormatError("Cannot decode a value of unspecified type".to_string()));
            }
            TagType::Byte => one_or_many(raw.to_vec(), TagValue::Byte, TagValue::Bytes),
            TagType::Undefined => TagValue::Bytes(raw.to_vec()),
            TagType::Ascii => TagValue::Text(latin1_decode(raw)),
            TagType::SByte => one_or_many(raw.iter().map(|&b| b as i8).collect(), TagValue::SByte, TagValue::SBytes),
            TagType::Short => {
                let mut v = vec![0u16; count];
                handler.read_u16_into(raw, &mut v);
                one_or_many(v, TagValue::Short, TagValue::Shorts)
            }
            TagType::SShort => {
                let mut v = vec![0i16; count];
                handler.read_i16_into(raw, &mut v);
                one_or_many(v, TagValue::SShort, TagValue::SShorts)
            }
            TagType::Long | TagType::Ifd => {
                let mut v = vec![0u32; count];
                handler.read_u32_into(raw, &mut v);
                one_or_many(v, TagValue::Long, TagValue::Longs)
            }
            TagType::SLong => {
                let mut v = vec![0i32; count];
                handler.read_i32_into(raw, &mut v);
                one_or_many(v, TagValue::SLong, TagValue::SLongs)
            }
            TagType::Long8 | TagType::Ifd8 => {
                let mut v = vec![0u64; count];
                handler.read_u64_into(raw, &mut v);
                one_or_many(v, TagValue::Long8, TagValue::Long8s)
            }
            TagType::SLong8 => {
                let mut v = vec![0i64; count];
                handler.read_i64_into(raw, &mut v);
                one_or_many(v, TagValue::SLong8, TagValue::SLong8s)
            }
            TagType::Float => {
                let mut v = vec![0f32; count];
                handler.read_f32_into(raw, &mut v);
                one_or_many(v, TagValue::Float, TagValue::Floats)
            }
            TagType::Double => {
                let mut v = vec![0f64; count];
                handler.read_f64_into(raw, &mut v);
                one_or_many(v, TagValue::Double, TagValue::Doubles)
            }
            TagType::Rational => {
                let mut v = vec![0u32; count * 2];
                handler.read_u32_into(raw, &mut v);
                let values = v
                    .chunks_exact(2)
                    .map(|p| if p[1] == 0 { 0.0 } else { p[0] as f64 / p[1] as f64 })
                    .collect();
                one_or_many(values, TagValue::Double, TagValue::Doubles)
            }
            TagType::SRational => {
                let mut v = vec![0i32; count * 2];
                handler.read_i32_into(raw, &mut v);
                let values = v
                    .chunks_exact(2)
                    .map(|p| if p[1] == 0 { 0.0 } else { p[0] as f64 / p[1] as f64 })
                    .collect();
                one_or_many(values, TagValue::Double, TagValue::Doubles)
            }
        };
        Ok(value)
    }

    /// Encodes this value as `tag_type` in file byte order.
    ///
    /// Returns the payload and its element count, or `None` when the value
    /// has no representation in that type.
    pub fn encode(&self, tag_type: TagType, handler: &dyn ByteOrderHandler) -> Option<(Vec<u8>, u64)> {
        macro_rules! pack {
            ($values:expr, $width:expr, $write:ident) => {{
                let values = $values;
                let mut out = vec![0u8; values.len() * $width];
                handler.$write(&values, &mut out);
                (out, values.len() as u64)
            }};
        }

        let encoded = match tag_type {
            TagType::Any => return None,
            TagType::Ascii => {
                let mut bytes = match self {
                    TagValue::Text(s) => latin1_encode(s),
                    TagValue::Bytes(b) => b.clone(),
                    _ => return None,
                };
                if bytes.last() != Some(&0) {
                    bytes.push(0);
                }
                let count = bytes.len() as u64;
                (bytes, count)
            }
            TagType::Byte | TagType::Undefined => {
                let bytes = self.to_u8_vec()?;
                let count = bytes.len() as u64;
                (bytes, count)
            }
            TagType::SByte => {
                let bytes: Vec<u8> = self.to_i8_vec()?.into_iter().map(|b| b as u8).collect();
                let count = bytes.len() as u64;
                (bytes, count)
            }
            TagType::Short => pack!(self.to_u16_vec()?, 2, write_u16_into),
            TagType::SShort => pack!(self.to_i16_vec()?, 2, write_i16_into),
            TagType::Long | TagType::Ifd => pack!(self.to_u32_vec()?, 4, write_u32_into),
            TagType::SLong => pack!(self.to_i32_vec()?, 4, write_i32_into),
            TagType::Long8 | TagType::Ifd8 => pack!(self.to_u64_vec()?, 8, write_u64_into),
            TagType::SLong8 => pack!(self.to_i64_vec()?, 8, write_i64_into),
            TagType::Float => pack!(self.to_f32_vec()?, 4, write_f32_into),
            TagType::Double => pack!(self.to_f64_vec()?, 8, write_f64_into),
            TagType::Rational => {
                let values = self.to_f64_vec()?;
                let pairs: Vec<u32> = values
                    .iter()
                    .flat_map(|&v| {
                        let (num, den) = double_to_rational(v);
                        [num, den]
                    })
                    .collect();
                let mut out = vec![0u8; pairs.len() * 4];
                handler.write_u32_into(&pairs, &mut out);
                (out, values.len() as u64)
            }
            TagType::SRational => {
                let values = self.to_f64_vec()?;
                let pairs: Vec<i32> = values
                    .iter()
                    .flat_map(|&v| {
                        let (num, den) = double_to_srational(v);
                        [num, den]
                    })
                    .collect();
                let mut out = vec![0u8; pairs.len() * 4];
                handler.write_i32_into(&pairs, &mut out);
                (out, values.len() as u64)
            }
        };
        Some(encoded)
    }
}

const RATIONAL_SCALE_LIMIT: f64 = (1u32 << (31 - 3)) as f64;

/// Approximates a non-negative value as a rational.
///
/// Numerator and denominator are scaled up by powers of eight until the
/// numerator reaches 2^28, so integers and dyadic fractions are exact.
/// Negative values clamp to zero.
pub fn double_to_rational(value: f64) -> (u32, u32) {
    if !(value > 0.0) {
        return (0, 1);
    }
    let (num, den) = scale_rational(value);
    (num as u32, den)
}

/// Signed counterpart of [`double_to_rational`]
pub fn double_to_srational(value: f64) -> (i32, i32) {
    if value == 0.0 || value.is_nan() {
        return (0, 1);
    }
    let sign = if value < 0.0 { -1.0 } else { 1.0 };
    let (num, den) = scale_rational(value.abs());
    ((sign * num) as i32, den as i32)
}

fn scale_rational(mut value: f64) -> (f64, u32) {
    let mut den: u32 = 1;
    while value < RATIONAL_SCALE_LIMIT && (den as f64) < RATIONAL_SCALE_LIMIT {
        value *= 8.0;
        den *= 8;
    }
    ((value + 0.5).floor(), den)
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
            const SHOWN: usize = 10;
            write!(f, "[")?;
            for (i, v) in values.iter().take(SHOWN).enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            if values.len() > SHOWN {
                write!(f, ", ... ({} values)", values.len())?;
            }
            write!(f, "]")
        }

        match self {
            TagValue::Byte(v) => write!(f, "{}", v),
            TagValue::SByte(v) => write!(f, "{}", v),
            TagValue::Short(v) => write!(f, "{}", v),
            TagValue::SShort(v) => write!(f, "{}", v),
            TagValue::Long(v) => write!(f, "{}", v),
            TagValue::SLong(v) => write!(f, "{}", v),
            TagValue::Long8(v) => write!(f, "{}", v),
            TagValue::SLong8(v) => write!(f, "{}", v),
            TagValue::Float(v) => write!(f, "{}", v),
            TagValue::Double(v) => write!(f, "{}", v),
            TagValue::Bytes(v) => list(f, v),
            TagValue::SBytes(v) => list(f, v),
            TagValue::Shorts(v) => list(f, v),
            TagValue::SShorts(v) => list(f, v),
            TagValue::Longs(v) => list(f, v),
            TagValue::SLongs(v) => list(f, v),
            TagValue::Long8s(v) => list(f, v),
            TagValue::SLong8s(v) => list(f, v),
            TagValue::Floats(v) => list(f, v),
            TagValue::Doubles(v) => list(f, v),
            TagValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}
