//! Core TIFF type definitions
//!
//! Field data types, count rules and the field-presence bitmap shared by
//! the catalog, the directory model and the directory I/O engine.

use std::fmt;

use crate::tiff::constants::field_types;

/// On-disk data type of a directory entry
///
/// `Any` never appears in a file; catalog entries use it to accept every
/// type, and lookups use it to mean "first entry for this tag".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagType {
    Any,
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
    Ifd,
    Long8,
    SLong8,
    Ifd8,
}

impl TagType {
    /// Maps a type code read from a file; unknown codes yield `None`
    pub fn from_code(code: u16) -> Option<Self> {
        let tag_type = match code {
            field_types::BYTE => TagType::Byte,
            field_types::ASCII => TagType::Ascii,
            field_types::SHORT => TagType::Short,
            field_types::LONG => TagType::Long,
            field_types::RATIONAL => TagType::Rational,
            field_types::SBYTE => TagType::SByte,
            field_types::UNDEFINED => TagType::Undefined,
            field_types::SSHORT => TagType::SShort,
            field_types::SLONG => TagType::SLong,
            field_types::SRATIONAL => TagType::SRational,
            field_types::FLOAT => TagType::Float,
            field_types::DOUBLE => TagType::Double,
            field_types::IFD => TagType::Ifd,
            field_types::LONG8 => TagType::Long8,
            field_types::SLONG8 => TagType::SLong8,
            field_types::IFD8 => TagType::Ifd8,
            _ => return None,
        };
        Some(tag_type)
    }

    /// Type code as stored in a directory entry
    pub fn code(&self) -> u16 {
        match self {
            TagType::Any => field_types::NOTYPE,
            TagType::Byte => field_types::BYTE,
            TagType::Ascii => field_types::ASCII,
            TagType::Short => field_types::SHORT,
            TagType::Long => field_types::LONG,
            TagType::Rational => field_types::RATIONAL,
            TagType::SByte => field_types::SBYTE,
            TagType::Undefined => field_types::UNDEFINED,
            TagType::SShort => field_types::SSHORT,
            TagType::SLong => field_types::SLONG,
            TagType::SRational => field_types::SRATIONAL,
            TagType::Float => field_types::FLOAT,
            TagType::Double => field_types::DOUBLE,
            TagType::Ifd => field_types::IFD,
            TagType::Long8 => field_types::LONG8,
            TagType::SLong8 => field_types::SLONG8,
            TagType::Ifd8 => field_types::IFD8,
        }
    }

    /// Size in bytes of one element of this type
    pub fn size(&self) -> usize {
        match self {
            TagType::Any => 0,
            TagType::Byte | TagType::Ascii | TagType::SByte | TagType::Undefined => 1,
            TagType::Short | TagType::SShort => 2,
            TagType::Long | TagType::SLong | TagType::Float | TagType::Ifd => 4,
            TagType::Rational | TagType::SRational | TagType::Double => 8,
            TagType::Long8 | TagType::SLong8 | TagType::Ifd8 => 8,
        }
    }

    /// Returns a human-readable name for this type
    pub fn name(&self) -> &'static str {
        match self {
            TagType::Any => "ANY",
            TagType::Byte => "BYTE",
            TagType::Ascii => "ASCII",
            TagType::Short => "SHORT",
            TagType::Long => "LONG",
            TagType::Rational => "RATIONAL",
            TagType::SByte => "SBYTE",
            TagType::Undefined => "UNDEFINED",
            TagType::SShort => "SSHORT",
            TagType::SLong => "SLONG",
            TagType::SRational => "SRATIONAL",
            TagType::Float => "FLOAT",
            TagType::Double => "DOUBLE",
            TagType::Ifd => "IFD",
            TagType::Long8 => "LONG8",
            TagType::SLong8 => "SLONG8",
            TagType::Ifd8 => "IFD8",
        }
    }

    /// Parses a type name such as "SHORT" or "rational" (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [TagType; 17] = [
            TagType::Any, TagType::Byte, TagType::Ascii, TagType::Short, TagType::Long,
            TagType::Rational, TagType::SByte, TagType::Undefined, TagType::SShort,
            TagType::SLong, TagType::SRational, TagType::Float, TagType::Double,
            TagType::Ifd, TagType::Long8, TagType::SLong8, TagType::Ifd8,
        ];
        ALL.iter().copied().find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// True if either side is the wildcard or both are the same type
    pub fn matches(&self, other: TagType) -> bool {
        *self == TagType::Any || other == TagType::Any || *self == other
    }

    /// Types only representable in BigTIFF files
    pub fn is_big_only(&self) -> bool {
        matches!(self, TagType::Long8 | TagType::SLong8 | TagType::Ifd8)
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element count rule for a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCount {
    /// Exactly this many elements
    Fixed(u32),
    /// One element per sample (SamplesPerPixel)
    PerSample,
    /// Any count that fits a 16-bit count field
    Variable,
    /// Any count that fits a 32-bit count field
    Variable32,
}

impl FieldCount {
    /// The count a directory entry must carry, if the rule fixes one
    pub fn expected(&self, samples_per_pixel: u16) -> Option<u64> {
        match self {
            FieldCount::Fixed(n) => Some(*n as u64),
            FieldCount::PerSample => Some(samples_per_pixel as u64),
            FieldCount::Variable | FieldCount::Variable32 => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, FieldCount::Variable | FieldCount::Variable32)
    }
}

macro_rules! known_fields {
    ($($variant:ident = $bit:expr),* $(,)?) => {
        /// Fields kept as dedicated members of the directory model.
        ///
        /// The discriminant is the bit index in [`FieldSet`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Field {
            $($variant = $bit),*
        }

        impl Field {
            /// All known fields in bit order
            pub const ALL: &'static [Field] = &[$(Field::$variant),*];
        }
    };
}

known_fields! {
    ImageDimensions = 1,
    TileDimensions = 2,
    Resolution = 3,
    Position = 4,
    SubfileType = 5,
    BitsPerSample = 6,
    Compression = 7,
    Photometric = 8,
    Threshholding = 9,
    FillOrder = 10,
    Orientation = 15,
    SamplesPerPixel = 16,
    RowsPerStrip = 17,
    MinSampleValue = 18,
    MaxSampleValue = 19,
    PlanarConfig = 20,
    ResolutionUnit = 22,
    PageNumber = 23,
    StripByteCounts = 24,
    StripOffsets = 25,
    ColorMap = 26,
    ExtraSamples = 31,
    SampleFormat = 32,
    SMinSampleValue = 33,
    SMaxSampleValue = 34,
    ImageDepth = 35,
    TileDepth = 36,
    HalftoneHints = 37,
    YCbCrSubsampling = 39,
    YCbCrPositioning = 40,
    RefBlackWhite = 41,
    TransferFunction = 44,
    InkNames = 46,
    SubIfd = 49,
}

impl Field {
    /// Bit index in the presence bitmap
    pub fn bit(&self) -> u8 {
        *self as u8
    }
}

/// How a catalog entry is stored in the directory model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBit {
    /// Recognised but never stored
    Ignore,
    /// Stored in the directory's custom value list
    Custom,
    /// Stored in a dedicated member, tracked by this presence bit
    Known(Field),
}

/// Field presence bitmap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(u128);

impl FieldSet {
    pub fn new() -> Self {
        FieldSet(0)
    }

    pub fn set(&mut self, field: Field) {
        self.0 |= 1u128 << field.bit();
    }

    pub fn clear(&mut self, field: Field) {
        self.0 &= !(1u128 << field.bit());
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0 & (1u128 << field.bit()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Present fields in bit order
    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.iter().copied().filter(move |f| self.contains(*f))
    }

    /// Raw bitmap value
    pub fn bits(&self) -> u128 {
        self.0
    }
}
