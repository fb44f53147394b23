//! TIFF format constants
//!
//! This module defines constants used throughout the TIFF processing code,
//! making the code more readable and maintainable by replacing magic numbers
//! with descriptive names.

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;

    /// BigTIFF version number (43)
    pub const BIG_TIFF_VERSION: u16 = 43;

    /// "II" byte order marker for little-endian
    pub const LITTLE_ENDIAN_MARKER: [u8; 2] = [0x49, 0x49];

    /// "MM" byte order marker for big-endian
    pub const BIG_ENDIAN_MARKER: [u8; 2] = [0x4D, 0x4D];

    /// BigTIFF offset size (8 bytes)
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;

    /// Classic header length
    pub const CLASSIC_HEADER_SIZE: u64 = 8;

    /// BigTIFF header length
    pub const BIG_HEADER_SIZE: u64 = 16;
}

/// Engine limits
pub mod limits {
    /// Directories claiming more entries than this are rejected
    pub const MAX_DIRECTORY_ENTRIES: u64 = 4096;

    /// Target strip size in bytes when choosing rows per strip
    pub const STRIP_SIZE_DEFAULT: u64 = 8192;

    /// Default tile edge length
    pub const TILE_SIZE_DEFAULT: u32 = 256;
}

/// Field types as defined in the TIFF spec
pub mod field_types {
    pub const NOTYPE: u16 = 0;     // Placeholder, matches any type
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
    pub const IFD: u16 = 13;       // 32-bit IFD offset
    pub const LONG8: u16 = 16;     // BigTIFF 64-bit unsigned integer
    pub const SLONG8: u16 = 17;    // BigTIFF 64-bit signed integer
    pub const IFD8: u16 = 18;      // BigTIFF 64-bit IFD offset
}

/// Standard TIFF tags
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 254;         // Subfile data descriptor
    pub const SUBFILE_TYPE: u16 = 255;             // Old-style subfile data descriptor

    // Basic image structure tags
    pub const IMAGE_WIDTH: u16 = 256;              // Width of the image in pixels
    pub const IMAGE_LENGTH: u16 = 257;             // Height of the image in pixels
    pub const BITS_PER_SAMPLE: u16 = 258;          // Bits per component
    pub const COMPRESSION: u16 = 259;              // Compression scheme
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262; // Color space of image data
    pub const THRESHHOLDING: u16 = 263;            // Dithering used for bilevel data
    pub const CELL_WIDTH: u16 = 264;               // Dithering matrix width
    pub const CELL_LENGTH: u16 = 265;              // Dithering matrix height
    pub const FILL_ORDER: u16 = 266;               // Logical order of bits within a byte
    pub const DOCUMENT_NAME: u16 = 269;            // Name of the scanned document
    pub const IMAGE_DESCRIPTION: u16 = 270;        // Free-form description
    pub const MAKE: u16 = 271;                     // Scanner manufacturer
    pub const MODEL: u16 = 272;                    // Scanner model
    pub const STRIP_OFFSETS: u16 = 273;            // Offsets to the data strips
    pub const ORIENTATION: u16 = 274;              // Image orientation
    pub const SAMPLES_PER_PIXEL: u16 = 277;        // Number of components per pixel
    pub const ROWS_PER_STRIP: u16 = 278;           // Rows per strip of data
    pub const STRIP_BYTE_COUNTS: u16 = 279;        // Bytes counts for strips
    pub const MIN_SAMPLE_VALUE: u16 = 280;         // Minimum component value
    pub const MAX_SAMPLE_VALUE: u16 = 281;         // Maximum component value
    pub const X_RESOLUTION: u16 = 282;             // Horizontal resolution
    pub const Y_RESOLUTION: u16 = 283;             // Vertical resolution
    pub const PLANAR_CONFIGURATION: u16 = 284;     // How components are stored
    pub const PAGE_NAME: u16 = 285;                // Name of the page
    pub const X_POSITION: u16 = 286;               // Horizontal page offset
    pub const Y_POSITION: u16 = 287;               // Vertical page offset
    pub const FREE_OFFSETS: u16 = 288;             // Unused string offsets
    pub const FREE_BYTE_COUNTS: u16 = 289;         // Unused string byte counts
    pub const GRAY_RESPONSE_UNIT: u16 = 290;       // Gray response precision
    pub const GRAY_RESPONSE_CURVE: u16 = 291;      // Gray response values
    pub const RESOLUTION_UNIT: u16 = 296;          // Unit of measurement for resolution
    pub const PAGE_NUMBER: u16 = 297;              // Page number and page count
    pub const TRANSFER_FUNCTION: u16 = 301;        // Transfer function for image data
    pub const SOFTWARE: u16 = 305;                 // Software used to create the image
    pub const DATE_TIME: u16 = 306;                // Date and time of image creation
    pub const ARTIST: u16 = 315;                   // Person who created the image
    pub const HOST_COMPUTER: u16 = 316;            // Computer where the image was created
    pub const PREDICTOR: u16 = 317;                // Prediction scheme used on image data
    pub const WHITE_POINT: u16 = 318;              // Image white point chromaticity
    pub const PRIMARY_CHROMATICITIES: u16 = 319;   // Primary chromaticities
    pub const COLOR_MAP: u16 = 320;                // Colormap for palette color images
    pub const HALFTONE_HINTS: u16 = 321;           // Highlight and shadow hints
    pub const TILE_WIDTH: u16 = 322;               // Width of a tile
    pub const TILE_LENGTH: u16 = 323;              // Length of a tile
    pub const TILE_OFFSETS: u16 = 324;             // Offsets to the data tiles
    pub const TILE_BYTE_COUNTS: u16 = 325;         // Byte counts for tiles
    pub const SUB_IFD: u16 = 330;                  // Offsets of child directories
    pub const INK_SET: u16 = 332;                  // Ink set for separated images
    pub const INK_NAMES: u16 = 333;                // Names of the inks
    pub const NUMBER_OF_INKS: u16 = 334;           // Number of inks
    pub const DOT_RANGE: u16 = 336;                // Dot range values
    pub const TARGET_PRINTER: u16 = 337;           // Intended printing environment
    pub const EXTRA_SAMPLES: u16 = 338;            // Meaning of extra components
    pub const SAMPLE_FORMAT: u16 = 339;            // Interpretation of sample data
    pub const SMIN_SAMPLE_VALUE: u16 = 340;        // Minimum sample value, typed
    pub const SMAX_SAMPLE_VALUE: u16 = 341;        // Maximum sample value, typed
    pub const JPEG_TABLES: u16 = 347;              // JPEG quantization and huffman tables
    pub const YCBCR_COEFFICIENTS: u16 = 529;       // RGB to YCbCr transform
    pub const YCBCR_SUBSAMPLING: u16 = 530;        // Chroma subsampling factors
    pub const YCBCR_POSITIONING: u16 = 531;        // Chroma sample positioning
    pub const REFERENCE_BLACK_WHITE: u16 = 532;    // Reference black and white values
    pub const MATTEING: u16 = 32995;               // Obsolete alpha flag
    pub const DATA_TYPE: u16 = 32996;              // Obsolete sample format
    pub const IMAGE_DEPTH: u16 = 32997;            // Depth of a volume image
    pub const TILE_DEPTH: u16 = 32998;             // Depth of a volume tile
    pub const COPYRIGHT: u16 = 33432;              // Copyright notice
    pub const EXIF_IFD: u16 = 34665;               // Offset of the EXIF directory
    pub const GPS_IFD: u16 = 34853;                // Offset of the GPS directory
}

/// EXIF private directory tags
pub mod exif_tags {
    pub const EXPOSURE_TIME: u16 = 33434;
    pub const F_NUMBER: u16 = 33437;
    pub const EXPOSURE_PROGRAM: u16 = 34850;
    pub const ISO_SPEED_RATINGS: u16 = 34855;
    pub const EXIF_VERSION: u16 = 36864;
    pub const DATE_TIME_ORIGINAL: u16 = 36867;
    pub const DATE_TIME_DIGITIZED: u16 = 36868;
    pub const SHUTTER_SPEED_VALUE: u16 = 37377;
    pub const APERTURE_VALUE: u16 = 37378;
    pub const BRIGHTNESS_VALUE: u16 = 37379;
    pub const EXPOSURE_BIAS_VALUE: u16 = 37380;
    pub const MAX_APERTURE_VALUE: u16 = 37381;
    pub const SUBJECT_DISTANCE: u16 = 37382;
    pub const METERING_MODE: u16 = 37383;
    pub const LIGHT_SOURCE: u16 = 37384;
    pub const FLASH: u16 = 37385;
    pub const FOCAL_LENGTH: u16 = 37386;
    pub const MAKER_NOTE: u16 = 37500;
    pub const USER_COMMENT: u16 = 37510;
    pub const FLASHPIX_VERSION: u16 = 40960;
    pub const COLOR_SPACE: u16 = 40961;
    pub const PIXEL_X_DIMENSION: u16 = 40962;
    pub const PIXEL_Y_DIMENSION: u16 = 40963;
    pub const FOCAL_PLANE_X_RESOLUTION: u16 = 41486;
    pub const FOCAL_PLANE_Y_RESOLUTION: u16 = 41487;
    pub const FOCAL_PLANE_RESOLUTION_UNIT: u16 = 41488;
    pub const EXPOSURE_MODE: u16 = 41986;
    pub const WHITE_BALANCE: u16 = 41987;
    pub const FOCAL_LENGTH_IN_35MM_FILM: u16 = 41989;
    pub const IMAGE_UNIQUE_ID: u16 = 42016;
}

/// Compression types
pub mod compression {
    pub const NONE: u16 = 1;              // No compression
    pub const CCITT_RLE: u16 = 2;         // CCITT modified Huffman RLE
    pub const CCITT_FAX3: u16 = 3;        // CCITT Group 3 fax
    pub const CCITT_FAX4: u16 = 4;        // CCITT Group 4 fax
    pub const LZW: u16 = 5;               // LZW compression
    pub const JPEG_OLD: u16 = 6;          // Old JPEG (deprecated)
    pub const JPEG: u16 = 7;              // JPEG compression
    pub const DEFLATE: u16 = 8;           // Adobe Deflate (zlib)
    pub const JBIG_BW: u16 = 9;           // JBIG for bi-level images
    pub const JBIG_COLOR: u16 = 10;       // JBIG for color images
    pub const NEXT: u16 = 32766;          // NeXT 2-bit RLE
    pub const CCITT_RLEW: u16 = 32771;    // CCITT RLE, word aligned
    pub const PACKBITS: u16 = 32773;      // PackBits compression
    pub const THUNDERSCAN: u16 = 32809;   // ThunderScan RLE
    pub const PIXAR_FILM: u16 = 32908;    // Pixar companded 10-bit LZW
    pub const PIXAR_LOG: u16 = 32909;     // Pixar companded 11-bit ZIP
    pub const DEFLATE_OLD: u16 = 32946;   // Deflate, pre-registration code
    pub const DCS: u16 = 32947;           // Kodak DCS encoding
    pub const JBIG: u16 = 34661;          // ISO JBIG
    pub const SGI_LOG: u16 = 34676;       // SGI log luminance RLE
    pub const SGI_LOG24: u16 = 34677;     // SGI log 24-bit packed
    pub const JP2000: u16 = 34712;        // JPEG 2000
    pub const LZMA: u16 = 34925;          // LZMA2
    pub const ZSTD: u16 = 50000;          // Zstandard compression
    pub const WEBP: u16 = 50001;          // WebP
}

/// Photometric interpretation values
pub mod photometric {
    pub const WHITE_IS_ZERO: u16 = 0;     // Minimum value is white
    pub const BLACK_IS_ZERO: u16 = 1;     // Minimum value is black
    pub const RGB: u16 = 2;               // RGB color model
    pub const PALETTE: u16 = 3;           // Palette color (color map indexed)
    pub const TRANSPARENCY_MASK: u16 = 4; // Transparency mask
    pub const CMYK: u16 = 5;              // CMYK color model
    pub const YCBCR: u16 = 6;             // YCbCr color model
    pub const CIELAB: u16 = 8;            // CIE L*a*b color model
    pub const ICCLAB: u16 = 9;            // ICC L*a*b
    pub const ITULAB: u16 = 10;           // ITU L*a*b
    pub const LOGL: u16 = 32844;          // CIE log2(L)
    pub const LOGLUV: u16 = 32845;        // CIE log2(L) (u',v')
}

/// Planar configuration values
pub mod planar_config {
    pub const CHUNKY: u16 = 1;            // Components stored interleaved (RGBRGBRGB)
    pub const PLANAR: u16 = 2;            // Components stored separately (RRR...GGG...BBB)
}

/// Sample format values
pub mod sample_format {
    pub const UNSIGNED: u16 = 1;          // Unsigned integer data
    pub const SIGNED: u16 = 2;            // Signed integer data
    pub const IEEEFP: u16 = 3;            // IEEE floating point data
    pub const VOID: u16 = 4;              // Undefined data format
    pub const COMPLEX_INT: u16 = 5;       // Complex integer data
    pub const COMPLEX_IEEEFP: u16 = 6;    // Complex floating point data
}

/// Obsolete DataType values, mapped onto SampleFormat
pub mod data_type {
    pub const VOID: u16 = 0;
    pub const INT: u16 = 1;
    pub const UINT: u16 = 2;
    pub const IEEEFP: u16 = 3;
}

/// Resolution unit values
pub mod resolution_unit {
    pub const NONE: u16 = 1;              // No meaningful units
    pub const INCH: u16 = 2;              // Inches (default)
    pub const CENTIMETER: u16 = 3;        // Centimeters
}

/// Orientation values
pub mod orientation {
    pub const TOP_LEFT: u16 = 1;          // 0th row = top, 0th column = left side
    pub const TOP_RIGHT: u16 = 2;         // 0th row = top, 0th column = right side
    pub const BOTTOM_RIGHT: u16 = 3;      // 0th row = bottom, 0th column = right side
    pub const BOTTOM_LEFT: u16 = 4;       // 0th row = bottom, 0th column = left side
    pub const LEFT_TOP: u16 = 5;          // 0th row = left side, 0th column = top
    pub const RIGHT_TOP: u16 = 6;         // 0th row = right side, 0th column = top
    pub const RIGHT_BOTTOM: u16 = 7;      // 0th row = right side, 0th column = bottom
    pub const LEFT_BOTTOM: u16 = 8;       // 0th row = left side, 0th column = bottom
}

/// Threshholding values
pub mod threshholding {
    pub const BILEVEL: u16 = 1;           // No dithering or halftoning
    pub const HALFTONE: u16 = 2;          // Ordered dither or halftone
    pub const ERROR_DIFFUSE: u16 = 3;     // Randomized process
}

/// Predictor values
pub mod predictor {
    pub const NONE: u16 = 1;                    // No prediction scheme
    pub const HORIZONTAL_DIFFERENCING: u16 = 2; // Horizontal differencing
    pub const FLOATING_POINT: u16 = 3;          // Floating point predictor
}

/// Fill order values
pub mod fill_order {
    pub const MSB_TO_LSB: u16 = 1;              // Most significant bit to least
    pub const LSB_TO_MSB: u16 = 2;              // Least significant bit to most
}

/// Extra sample values
pub mod extra_samples {
    pub const UNSPECIFIED: u16 = 0;             // Unspecified data
    pub const ASSOCIATED_ALPHA: u16 = 1;        // Associated alpha data
    pub const UNASSOCIATED_ALPHA: u16 = 2;      // Unassociated alpha data
    /// Bogus value written by some Corel tools, read as unassociated alpha
    pub const COREL_UNASSOCIATED_ALPHA: u16 = 999;
}

/// Subfile type bit flags
pub mod new_subfile_type {
    pub const REDUCED_RESOLUTION: u32 = 1;      // Reduced resolution version of another image
    pub const SINGLE_PAGE: u32 = 2;             // One page of many
    pub const TRANSPARENCY_MASK: u32 = 4;       // Transparency mask for another image
}

/// Old-style SubfileType values
pub mod old_subfile_type {
    pub const IMAGE: u16 = 1;                   // Full resolution image
    pub const REDUCED_IMAGE: u16 = 2;           // Reduced resolution image
    pub const PAGE: u16 = 3;                    // One page of many
}

/// YCbCr positioning values
pub mod ycbcr_positioning {
    pub const CENTERED: u16 = 1;
    pub const COSITED: u16 = 2;
}

/// Ink set values
pub mod ink_set {
    pub const CMYK: u16 = 1;
    pub const MULTI_INK: u16 = 2;
}
