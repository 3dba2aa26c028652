//! Scalar sizing strategies
//!
//! Strings, booleans, numbers and big integers are sized through a
//! [`ScalarSizer`]. Two strategies ship with the crate:
//!
//! - [`HeuristicSizer`]: fixed per-type costs (2 bytes per UTF-16 code unit,
//!   4 per boolean, 8 per number, 8 per 64-bit limb of a big integer)
//! - [`SerializedSizer`]: the byte length of the scalar after encoding it
//!   through a [`ScalarCodec`]; with the `serialized` feature the default
//!   codec is [`BincodeCodec`]
//!
//! The serialized strategy tracks the actual content: small integers encode
//! more compactly than doubles, Latin-1 strings take one byte per character,
//! and big integers grow with their magnitude.

use crate::error::Result;
use crate::value::{BigInt, Symbol};
use serde::{Deserialize, Serialize};
#[cfg(feature = "serialized")]
use num_bigint::Sign;

/// Bytes per UTF-16 code unit under the heuristic strategy
pub const STRING_UNIT_BYTES: u64 = 2;
/// Bytes per boolean under the heuristic strategy
pub const BOOLEAN_BYTES: u64 = 4;
/// Bytes per number under the heuristic strategy
pub const NUMBER_BYTES: u64 = 8;
/// Bytes per 64-bit limb of a big integer under the heuristic strategy
pub const BIGINT_LIMB_BYTES: u64 = 8;

/// Length of the `Symbol(` + `)` wrapper around a symbol's printable form
pub const SYMBOL_WRAPPER_LEN: usize = 8;
const SYMBOL_PREFIX_LEN: usize = 7;

/// A scalar handed to a sizing strategy
#[derive(Debug, Clone, Copy)]
pub enum Scalar<'a> {
    Bool(bool),
    Number(f64),
    BigInt(&'a BigInt),
    String(&'a str),
}

/// Strategy for sizing scalar values
pub trait ScalarSizer {
    /// Size of a scalar in bytes
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Size in bytes
    /// * `Err(FootprintError)` - The strategy could not size this scalar; the
    ///   estimator reports the value as `unknown` instead
    fn size_of(&self, scalar: Scalar<'_>) -> Result<u64>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Fixed-width sizing model
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSizer;

impl ScalarSizer for HeuristicSizer {
    fn size_of(&self, scalar: Scalar<'_>) -> Result<u64> {
        Ok(match scalar {
            Scalar::Bool(_) => BOOLEAN_BYTES,
            Scalar::Number(_) => NUMBER_BYTES,
            Scalar::BigInt(n) => n.iter_u64_digits().len().max(1) as u64 * BIGINT_LIMB_BYTES,
            Scalar::String(s) => s.encode_utf16().count() as u64 * STRING_UNIT_BYTES,
        })
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Binary serialization primitive used for exact scalar sizing
///
/// Implementations are treated as a black box: a scalar goes in, an encoded
/// length comes out. Errors are absorbed by the estimator.
pub trait ScalarCodec {
    fn encoded_len(&self, scalar: Scalar<'_>) -> Result<u64>;
}

/// Sizes scalars by their encoded length under a codec
#[derive(Debug, Clone, Default)]
pub struct SerializedSizer<C> {
    codec: C,
}

impl<C: ScalarCodec> SerializedSizer<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}

#[cfg(feature = "serialized")]
impl SerializedSizer<BincodeCodec> {
    /// Serialized sizing through the default bincode codec
    pub fn bincode() -> Self {
        Self::new(BincodeCodec)
    }
}

impl<C: ScalarCodec> ScalarSizer for SerializedSizer<C> {
    fn size_of(&self, scalar: Scalar<'_>) -> Result<u64> {
        self.codec.encoded_len(scalar)
    }

    fn name(&self) -> &'static str {
        "serialized"
    }
}

/// Wire form of a scalar
///
/// Mirrors how script engines serialize values: integral numbers in the
/// 32-bit range use a compact tag, strings pick a one-byte or two-byte
/// representation depending on their contents.
#[cfg(feature = "serialized")]
#[derive(Serialize)]
enum WireScalar {
    True,
    False,
    Int32(i32),
    Double(f64),
    BigInt { negative: bool, limbs: Vec<u64> },
    OneByteString(Vec<u8>),
    TwoByteString(Vec<u16>),
}

#[cfg(feature = "serialized")]
impl From<Scalar<'_>> for WireScalar {
    fn from(scalar: Scalar<'_>) -> Self {
        match scalar {
            Scalar::Bool(true) => WireScalar::True,
            Scalar::Bool(false) => WireScalar::False,
            Scalar::Number(n) => match small_integer(n) {
                Some(i) => WireScalar::Int32(i),
                None => WireScalar::Double(n),
            },
            Scalar::BigInt(n) => {
                let (sign, limbs) = n.to_u64_digits();
                WireScalar::BigInt {
                    negative: sign == Sign::Minus,
                    limbs,
                }
            }
            Scalar::String(s) => {
                if s.chars().all(|c| (c as u32) <= 0xFF) {
                    WireScalar::OneByteString(s.chars().map(|c| c as u8).collect())
                } else {
                    WireScalar::TwoByteString(s.encode_utf16().collect())
                }
            }
        }
    }
}

/// The number as an `i32` if it is integral, in range and not negative zero
#[cfg(feature = "serialized")]
fn small_integer(n: f64) -> Option<i32> {
    if n.fract() != 0.0 || n < i32::MIN as f64 || n > i32::MAX as f64 {
        return None;
    }
    if n == 0.0 && n.is_sign_negative() {
        return None;
    }
    Some(n as i32)
}

/// Varint bincode encoding of [`WireScalar`]
#[cfg(feature = "serialized")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "serialized")]
impl ScalarCodec for BincodeCodec {
    fn encoded_len(&self, scalar: Scalar<'_>) -> Result<u64> {
        use bincode::Options;

        let wire = WireScalar::from(scalar);
        Ok(bincode::DefaultOptions::new().serialized_size(&wire)?)
    }
}

/// Named scalar strategy, as selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingStrategy {
    Heuristic,
    Serialized,
}

impl Default for SizingStrategy {
    fn default() -> Self {
        if cfg!(feature = "serialized") {
            SizingStrategy::Serialized
        } else {
            SizingStrategy::Heuristic
        }
    }
}

impl SizingStrategy {
    /// Instantiate the strategy
    pub fn sizer(self) -> Result<Box<dyn ScalarSizer>> {
        match self {
            SizingStrategy::Heuristic => Ok(Box::new(HeuristicSizer)),
            #[cfg(feature = "serialized")]
            SizingStrategy::Serialized => Ok(Box::new(SerializedSizer::bincode())),
            #[cfg(not(feature = "serialized"))]
            SizingStrategy::Serialized => Err(crate::error::FootprintError::config(
                "serialized sizing requires the `serialized` feature",
            )),
        }
    }
}

/// The default scalar strategy for this build
pub fn default_sizer() -> Box<dyn ScalarSizer> {
    match SizingStrategy::default().sizer() {
        Ok(sizer) => sizer,
        Err(_) => Box::new(HeuristicSizer),
    }
}

/// Size of a symbol under a scalar strategy
///
/// A registered symbol is sized as its registry key. Any other symbol is
/// sized as its printable form `Symbol(description)` with the wrapper
/// removed; a missing description sizes as the empty string.
pub fn symbol_size(sizer: &dyn ScalarSizer, symbol: &Symbol) -> Result<u64> {
    if let Some(key) = symbol.global_key() {
        return sizer.size_of(Scalar::String(key));
    }
    let printable = symbol.to_string();
    let inner_len = printable.chars().count().saturating_sub(SYMBOL_WRAPPER_LEN);
    let inner: String = printable
        .chars()
        .skip(SYMBOL_PREFIX_LEN)
        .take(inner_len)
        .collect();
    sizer.size_of(Scalar::String(&inner))
}

/// Codec that rejects every scalar, for exercising failure paths
#[cfg(test)]
pub(crate) struct RejectingCodec;

#[cfg(test)]
impl ScalarCodec for RejectingCodec {
    fn encoded_len(&self, _scalar: Scalar<'_>) -> Result<u64> {
        Err(crate::error::FootprintError::serialization("codec refused scalar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FootprintError;

    #[test]
    fn test_heuristic_sizes() {
        let sizer = HeuristicSizer;
        assert_eq!(sizer.size_of(Scalar::String("ab")).unwrap(), 4);
        assert_eq!(sizer.size_of(Scalar::String("")).unwrap(), 0);
        // One astral code point is two UTF-16 code units
        assert_eq!(sizer.size_of(Scalar::String("😀")).unwrap(), 4);
        assert_eq!(sizer.size_of(Scalar::Bool(false)).unwrap(), 4);
        assert_eq!(sizer.size_of(Scalar::Number(1e300)).unwrap(), 8);

        let zero = BigInt::from(0i64);
        let wide = BigInt::from(u128::MAX);
        assert_eq!(sizer.size_of(Scalar::BigInt(&zero)).unwrap(), 8);
        assert_eq!(sizer.size_of(Scalar::BigInt(&wide)).unwrap(), 16);

        let parsed: BigInt = "-340282366920938463463374607431768211456".parse().unwrap();
        assert_eq!(sizer.size_of(Scalar::BigInt(&parsed)).unwrap(), 24);
    }

    #[test]
    fn test_symbol_sizes() {
        let sizer = HeuristicSizer;
        assert_eq!(symbol_size(&sizer, &Symbol::new("abc")).unwrap(), 6);
        assert_eq!(symbol_size(&sizer, &Symbol::anonymous()).unwrap(), 0);
        assert_eq!(symbol_size(&sizer, &Symbol::new("")).unwrap(), 0);
        assert_eq!(symbol_size(&sizer, &Symbol::global("registry")).unwrap(), 16);
    }

    #[cfg(feature = "serialized")]
    #[test]
    fn test_serialized_sizes() {
        let sizer = SerializedSizer::bincode();
        // tag + length + two Latin-1 bytes
        assert_eq!(sizer.size_of(Scalar::String("ab")).unwrap(), 4);
        assert_eq!(sizer.size_of(Scalar::Bool(true)).unwrap(), 1);
        assert_eq!(sizer.size_of(Scalar::Number(1.0)).unwrap(), 2);
        assert_eq!(sizer.size_of(Scalar::Number(1.5)).unwrap(), 9);
        assert_eq!(sizer.size_of(Scalar::Number(-0.0)).unwrap(), 9);
        assert_eq!(sizer.size_of(Scalar::Number(4_294_967_296.0)).unwrap(), 9);
    }

    #[cfg(feature = "serialized")]
    #[test]
    fn test_serialized_tracks_content() {
        let sizer = SerializedSizer::bincode();
        let latin = sizer.size_of(Scalar::String("cafe")).unwrap();
        let wide = sizer.size_of(Scalar::String("日本語!")).unwrap();
        assert!(wide > latin);

        let small = BigInt::from(5i64);
        let large = BigInt::from(u128::MAX);
        assert!(
            sizer.size_of(Scalar::BigInt(&large)).unwrap()
                > sizer.size_of(Scalar::BigInt(&small)).unwrap()
        );
    }

    #[test]
    fn test_codec_failure_surfaces() {
        let sizer = SerializedSizer::new(RejectingCodec);
        assert!(matches!(
            sizer.size_of(Scalar::Number(1.0)),
            Err(FootprintError::Serialization(_))
        ));
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(SizingStrategy::Heuristic.sizer().unwrap().name(), "heuristic");
        let parsed: SizingStrategy = serde_json::from_str("\"heuristic\"").unwrap();
        assert_eq!(parsed, SizingStrategy::Heuristic);
        #[cfg(feature = "serialized")]
        assert_eq!(default_sizer().name(), "serialized");
    }
}
