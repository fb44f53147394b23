//! Compression handling for TIFF files
//!
//! Whole-buffer compressors implement [`CompressionHandler`]; the session
//! talks to the richer [`Codec`] lifecycle. [`BlockCodec`] adapts one to
//! the other, and [`CodecRegistry`] maps scheme codes to implementations.

mod handler;
mod deflate;
mod zstd;
mod lzw;
mod predictor;
mod codec;
mod block;
mod none;
mod packbits;
mod not_configured;
mod registry;
mod converter;

pub use handler::CompressionHandler;
pub use deflate::DeflateHandler;
pub use zstd::ZstdHandler;
pub use lzw::LzwHandler;
pub use predictor::PredictorState;
pub use codec::{Codec, CodecSetup};
pub use block::BlockCodec;
pub use none::NoneCodec;
pub use packbits::{pack_bits, unpack_bits, PackBitsCodec};
pub use not_configured::NotConfiguredCodec;
pub use registry::{is_field_valid_for_codec, CodecConstructor, CodecInfo, CodecRegistry};
pub use converter::CompressionConverter;
