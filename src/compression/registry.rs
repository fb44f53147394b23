//! Codec registry
//!
//! Maps compression scheme codes to codec constructors. Codecs registered
//! at runtime are consulted before the built-in table, so registering a
//! scheme that already has a built-in implementation replaces it for every
//! session using this registry.

use std::fmt;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::tiff::constants::{compression, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use super::block::BlockCodec;
use super::codec::Codec;
use super::deflate::DeflateHandler;
use super::lzw::LzwHandler;
use super::none::NoneCodec;
use super::not_configured::NotConfiguredCodec;
use super::packbits::PackBitsCodec;
use super::zstd::ZstdHandler;

/// Builds a fresh codec instance for one session
pub type CodecConstructor = Arc<dyn Fn() -> Box<dyn Codec> + Send + Sync>;

/// A registry entry
#[derive(Clone)]
pub struct CodecInfo {
    pub scheme: u16,
    pub name: String,
    constructor: Option<CodecConstructor>,
}

impl CodecInfo {
    pub fn new(scheme: u16, name: impl Into<String>, constructor: CodecConstructor) -> Self {
        CodecInfo { scheme, name: name.into(), constructor: Some(constructor) }
    }

    /// True if the scheme has a working implementation
    pub fn is_configured(&self) -> bool {
        self.constructor.is_some()
    }

    fn create(&self) -> Box<dyn Codec> {
        match &self.constructor {
            Some(constructor) => constructor(),
            None => Box::new(NotConfiguredCodec::new(self.scheme, self.name.clone())),
        }
    }
}

impl fmt::Debug for CodecInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecInfo")
            .field("scheme", &self.scheme)
            .field("name", &self.name)
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn builtin(scheme: u16, name: &str, constructor: Option<CodecConstructor>) -> CodecInfo {
    CodecInfo { scheme, name: name.to_string(), constructor }
}

fn builtin_codecs() -> Vec<CodecInfo> {
    fn make<F: Fn() -> Box<dyn Codec> + Send + Sync + 'static>(f: F) -> Option<CodecConstructor> {
        Some(Arc::new(f))
    }

    vec![
        builtin(compression::NONE, "None", make(|| Box::new(NoneCodec::new()))),
        builtin(compression::CCITT_RLE, "CCITT RLE", None),
        builtin(compression::CCITT_FAX3, "CCITT Group 3", None),
        builtin(compression::CCITT_FAX4, "CCITT Group 4", None),
        builtin(compression::LZW, "LZW", make(|| Box::new(BlockCodec::new(LzwHandler)))),
        builtin(compression::JPEG_OLD, "Old-style JPEG", None),
        builtin(compression::JPEG, "JPEG", None),
        builtin(compression::DEFLATE, "AdobeDeflate", make(|| Box::new(BlockCodec::new(DeflateHandler::adobe())))),
        builtin(compression::JBIG_BW, "JBIG B&W", None),
        builtin(compression::JBIG_COLOR, "JBIG Color", None),
        builtin(compression::NEXT, "NeXT", None),
        builtin(compression::CCITT_RLEW, "CCITT RLE/W", None),
        builtin(compression::PACKBITS, "PackBits", make(|| Box::new(PackBitsCodec::new()))),
        builtin(compression::THUNDERSCAN, "ThunderScan", None),
        builtin(compression::PIXAR_FILM, "PixarFilm", None),
        builtin(compression::PIXAR_LOG, "PixarLog", None),
        builtin(compression::DEFLATE_OLD, "Deflate", make(|| Box::new(BlockCodec::new(DeflateHandler::legacy())))),
        builtin(compression::DCS, "Kodak DCS", None),
        builtin(compression::JBIG, "ISO JBIG", None),
        builtin(compression::SGI_LOG, "SGILog", None),
        builtin(compression::SGI_LOG24, "SGILog24", None),
        builtin(compression::JP2000, "JPEG2000", None),
        builtin(compression::LZMA, "LZMA", None),
        builtin(compression::ZSTD, "ZSTD", make(|| Box::new(BlockCodec::new(ZstdHandler::new())))),
        builtin(compression::WEBP, "WEBP", None),
    ]
}

/// Codec-private tags and the schemes they belong to
const CODEC_PRIVATE_TAGS: &[(u16, &[u16])] = &[
    (
        tags::PREDICTOR,
        &[
            compression::LZW,
            compression::DEFLATE,
            compression::DEFLATE_OLD,
            compression::PIXAR_LOG,
            compression::LZMA,
            compression::ZSTD,
        ],
    ),
    (tags::JPEG_TABLES, &[compression::JPEG, compression::JPEG_OLD]),
    // T4Options, T6Options, BadFaxLines, CleanFaxData, ConsecutiveBadFaxLines
    (292, &[compression::CCITT_FAX3]),
    (293, &[compression::CCITT_FAX4]),
    (326, &[compression::CCITT_RLE, compression::CCITT_RLEW, compression::CCITT_FAX3, compression::CCITT_FAX4]),
    (327, &[compression::CCITT_RLE, compression::CCITT_RLEW, compression::CCITT_FAX3, compression::CCITT_FAX4]),
    (328, &[compression::CCITT_RLE, compression::CCITT_RLEW, compression::CCITT_FAX3, compression::CCITT_FAX4]),
    // Old-style JPEG interchange and table tags
    (512, &[compression::JPEG_OLD]),
    (513, &[compression::JPEG_OLD]),
    (514, &[compression::JPEG_OLD]),
    (515, &[compression::JPEG_OLD]),
    (517, &[compression::JPEG_OLD]),
    (518, &[compression::JPEG_OLD]),
    (519, &[compression::JPEG_OLD]),
    (520, &[compression::JPEG_OLD]),
    (521, &[compression::JPEG_OLD]),
];

/// False if `tag` is private to codecs other than `scheme`
pub fn is_field_valid_for_codec(tag: u16, scheme: u16) -> bool {
    CODEC_PRIVATE_TAGS
        .iter()
        .find(|(private, _)| *private == tag)
        .map_or(true, |(_, schemes)| schemes.contains(&scheme))
}

/// Registered and built-in codecs
pub struct CodecRegistry {
    registered: RwLock<Vec<CodecInfo>>,
    builtins: Vec<CodecInfo>,
}

impl CodecRegistry {
    /// Registry holding only the built-in codecs
    pub fn new() -> Self {
        CodecRegistry {
            registered: RwLock::new(Vec::new()),
            builtins: builtin_codecs(),
        }
    }

    /// Registers `constructor` for `scheme`, replacing an earlier registration
    pub fn register<F>(&self, scheme: u16, name: &str, constructor: F) -> TiffResult<()>
    where
        F: Fn() -> Box<dyn Codec> + Send + Sync + 'static,
    {
        let mut registered = self.write_lock()?;
        registered.retain(|info| info.scheme != scheme);
        registered.push(CodecInfo::new(scheme, name, Arc::new(constructor)));
        debug!("Registered codec {} for scheme {}", name, scheme);
        Ok(())
    }

    /// Removes a registration. Built-in codecs cannot be removed.
    pub fn unregister(&self, scheme: u16) -> TiffResult<bool> {
        let mut registered = self.write_lock()?;
        let before = registered.len();
        registered.retain(|info| info.scheme != scheme);
        Ok(registered.len() != before)
    }

    fn write_lock(&self) -> TiffResult<std::sync::RwLockWriteGuard<'_, Vec<CodecInfo>>> {
        self.registered
            .write()
            .map_err(|_| TiffError::UsageError("codec registry lock poisoned".to_string()))
    }

    fn registered(&self) -> Vec<CodecInfo> {
        self.registered.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Entry for `scheme`, registered codecs first
    pub fn find(&self, scheme: u16) -> Option<CodecInfo> {
        self.registered()
            .into_iter()
            .rev()
            .find(|info| info.scheme == scheme)
            .or_else(|| self.builtins.iter().find(|info| info.scheme == scheme).cloned())
    }

    /// True if `scheme` has a working implementation
    pub fn is_configured(&self, scheme: u16) -> bool {
        self.find(scheme).map_or(false, |info| info.is_configured())
    }

    /// Every configured codec, registered ones first
    pub fn configured(&self) -> Vec<CodecInfo> {
        let registered = self.registered();
        let shadowed = |scheme: u16| registered.iter().any(|info| info.scheme == scheme);
        let builtins: Vec<CodecInfo> = self
            .builtins
            .iter()
            .filter(|info| info.is_configured() && !shadowed(info.scheme))
            .cloned()
            .collect();
        registered.iter().cloned().chain(builtins).collect()
    }

    /// Every known scheme, configured or not
    pub fn known(&self) -> Vec<CodecInfo> {
        let registered = self.registered();
        let builtins: Vec<CodecInfo> = self
            .builtins
            .iter()
            .filter(|info| !registered.iter().any(|r| r.scheme == info.scheme))
            .cloned()
            .collect();
        registered.into_iter().chain(builtins).collect()
    }

    /// Creates a codec instance for `scheme`.
    ///
    /// Unknown or unconfigured schemes yield a codec that fails on use;
    /// callers decide whether to accept it via [`CodecRegistry::is_configured`].
    pub fn create(&self, scheme: u16) -> Box<dyn Codec> {
        match self.find(scheme) {
            Some(info) => info.create(),
            None => Box::new(NotConfiguredCodec::new(scheme, format!("Compression scheme {}", scheme))),
        }
    }

    /// Scheme code for a codec name such as "lzw" or "zstd", or a numeric code
    pub fn scheme_by_name(&self, name: &str) -> Option<u16> {
        if let Ok(code) = name.parse::<u16>() {
            return Some(code);
        }
        let alias = match name.to_lowercase().as_str() {
            "none" | "uncompressed" | "raw" => Some(compression::NONE),
            "deflate" | "zip" | "adobe deflate" => Some(compression::DEFLATE),
            "packbits" => Some(compression::PACKBITS),
            "lzw" => Some(compression::LZW),
            "zstd" => Some(compression::ZSTD),
            _ => None,
        };
        alias.or_else(|| {
            self.known()
                .into_iter()
                .find(|info| info.name.eq_ignore_ascii_case(name))
                .map(|info| info.scheme)
        })
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("registered", &self.registered())
            .finish()
    }
}
