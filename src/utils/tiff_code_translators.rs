//! TIFF code translators
//!
//! Translates numeric field values into human-readable descriptions for
//! directory listings and command output.

use crate::tiff::constants::{compression, photometric, planar_config, predictor, sample_format};

/// Converts a TIFF compression code to its human-readable description
pub fn compression_code_to_name(compression_code: u16) -> &'static str {
    match compression_code {
        compression::NONE => "Uncompressed",
        compression::CCITT_RLE => "CCITT RLE",
        compression::CCITT_FAX3 => "CCITT Group 3 fax",
        compression::CCITT_FAX4 => "CCITT Group 4 fax",
        compression::LZW => "LZW",
        compression::JPEG_OLD => "JPEG (old-style)",
        compression::JPEG => "JPEG",
        compression::DEFLATE => "Adobe Deflate (zlib)",
        compression::DEFLATE_OLD => "Deflate (zlib)",
        compression::JBIG_BW => "JBIG B&W",
        compression::JBIG_COLOR => "JBIG Color",
        compression::NEXT => "NeXT 2-bit RLE",
        compression::CCITT_RLEW => "CCITT RLE (word aligned)",
        compression::PACKBITS => "PackBits",
        compression::THUNDERSCAN => "ThunderScan",
        compression::PIXAR_FILM => "Pixar Film",
        compression::PIXAR_LOG => "Pixar Log",
        compression::DCS => "Kodak DCS",
        compression::JBIG => "ISO JBIG",
        compression::SGI_LOG => "SGI LogLuv",
        compression::SGI_LOG24 => "SGI LogLuv 24-bit",
        compression::JP2000 => "JPEG 2000",
        compression::LZMA => "LZMA2",
        compression::ZSTD => "ZSTD",
        compression::WEBP => "WebP",
        _ => "Unknown",
    }
}

/// Converts a TIFF sample format code to its human-readable description
pub fn sample_format_code_to_name(sample_format_code: u16) -> &'static str {
    match sample_format_code {
        sample_format::UNSIGNED => "Unsigned integer",
        sample_format::SIGNED => "Signed integer",
        sample_format::IEEEFP => "IEEE floating point",
        sample_format::VOID => "Undefined",
        sample_format::COMPLEX_INT => "Complex integer",
        sample_format::COMPLEX_IEEEFP => "Complex floating point",
        _ => "Unknown",
    }
}

/// Converts a TIFF predictor code to its human-readable description
pub fn predictor_code_to_name(predictor_code: u16) -> &'static str {
    match predictor_code {
        predictor::NONE => "No prediction scheme",
        predictor::HORIZONTAL_DIFFERENCING => "Horizontal differencing",
        predictor::FLOATING_POINT => "Floating point predictor",
        _ => "Unknown",
    }
}

/// Converts a TIFF photometric interpretation code to its human-readable description
pub fn photometric_code_to_name(photometric_code: u16) -> &'static str {
    match photometric_code {
        photometric::WHITE_IS_ZERO => "WhiteIsZero",
        photometric::BLACK_IS_ZERO => "BlackIsZero",
        photometric::RGB => "RGB",
        photometric::PALETTE => "Palette Color",
        photometric::TRANSPARENCY_MASK => "Transparency Mask",
        photometric::CMYK => "CMYK",
        photometric::YCBCR => "YCbCr",
        photometric::CIELAB => "CIE L*a*b*",
        photometric::ICCLAB => "ICC L*a*b*",
        photometric::ITULAB => "ITU L*a*b*",
        photometric::LOGL => "CIE Log2(L)",
        photometric::LOGLUV => "CIE Log2(L) (u',v')",
        _ => "Unknown",
    }
}

/// Converts a TIFF planar configuration code to its human-readable description
pub fn planar_config_code_to_name(planar_config_code: u16) -> &'static str {
    match planar_config_code {
        planar_config::CHUNKY => "Chunky (interleaved)",
        planar_config::PLANAR => "Planar (separate)",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(compression_code_to_name(compression::LZW), "LZW");
        assert_eq!(compression_code_to_name(compression::ZSTD), "ZSTD");
        assert_eq!(photometric_code_to_name(photometric::RGB), "RGB");
        assert_eq!(planar_config_code_to_name(2), "Planar (separate)");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(compression_code_to_name(12345), "Unknown");
        assert_eq!(sample_format_code_to_name(0), "Unknown");
        assert_eq!(predictor_code_to_name(9), "Unknown");
    }
}
