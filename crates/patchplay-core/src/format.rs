//! Sample encodings understood by the synthesis engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bit set in a format code when samples are signed.
const SIGNED_FLAG: u16 = 0x8000;
/// Bit set in a format code when 16-bit samples are big-endian.
const MSB_FLAG: u16 = 0x1000;

/// PCM encoding requested from the engine.
///
/// Parsed from the tokens hosts pass in song parameters. Unknown tokens
/// select [`SampleFormat::U8`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 8-bit.
    S8,
    /// Unsigned 16-bit, little-endian.
    U16Lsb,
    /// Signed 16-bit, little-endian.
    #[default]
    S16Lsb,
    /// Unsigned 16-bit, big-endian.
    U16Msb,
    /// Signed 16-bit, big-endian.
    S16Msb,
}

impl SampleFormat {
    /// Every format, in table order.
    pub const ALL: [Self; 6] = [
        Self::U8,
        Self::S8,
        Self::U16Lsb,
        Self::S16Lsb,
        Self::U16Msb,
        Self::S16Msb,
    ];

    /// Parse a format token such as `s16` or `u16msb`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "s8" => Self::S8,
            "u16" | "u16lsb" => Self::U16Lsb,
            "s16" | "s16lsb" => Self::S16Lsb,
            "u16msb" => Self::U16Msb,
            "s16msb" => Self::S16Msb,
            _ => Self::U8,
        }
    }

    /// Canonical token for this format.
    pub const fn token(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S8 => "s8",
            Self::U16Lsb => "u16",
            Self::S16Lsb => "s16",
            Self::U16Msb => "u16msb",
            Self::S16Msb => "s16msb",
        }
    }

    /// Engine format code.
    pub const fn code(self) -> u16 {
        match self {
            Self::U8 => 0x0008,
            Self::S8 => 0x8008,
            Self::U16Lsb => 0x0010,
            Self::S16Lsb => 0x8010,
            Self::U16Msb => 0x1010,
            Self::S16Msb => 0x9010,
        }
    }

    /// Inverse of [`SampleFormat::code`].
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0008 => Some(Self::U8),
            0x8008 => Some(Self::S8),
            0x0010 => Some(Self::U16Lsb),
            0x8010 => Some(Self::S16Lsb),
            0x1010 => Some(Self::U16Msb),
            0x9010 => Some(Self::S16Msb),
            _ => None,
        }
    }

    /// Bits per channel sample, taken from the low byte of the code.
    pub const fn bits(self) -> u16 {
        self.code() & 0xFF
    }

    /// Bytes per channel sample.
    pub const fn bytes_per_channel(self) -> usize {
        if self.bits() == 16 {
            2
        } else {
            1
        }
    }

    /// Bytes per frame for the given channel count.
    pub const fn bytes_per_sample(self, channels: u16) -> usize {
        channels as usize * self.bytes_per_channel()
    }

    pub const fn is_signed(self) -> bool {
        self.code() & SIGNED_FLAG != 0
    }

    pub const fn is_big_endian(self) -> bool {
        self.code() & MSB_FLAG != 0
    }

    /// Whether `S` is the element type that reads this format.
    pub const fn accepts<S: PcmSample>(self) -> bool {
        S::WIDTH == self.bytes_per_channel() && S::SIGNED == self.is_signed()
    }

    /// Decode raw engine bytes into typed samples.
    ///
    /// Returns the number of elements written, bounded by both `src` and `dst`.
    pub fn decode_into<S: PcmSample>(self, src: &[u8], dst: &mut [S]) -> Result<usize> {
        if !self.accepts::<S>() {
            return Err(Error::FormatMismatch { expected: self });
        }

        let big_endian = self.is_big_endian();
        let mut written = 0;
        for (sample, bytes) in dst.iter_mut().zip(src.chunks_exact(S::WIDTH)) {
            *sample = S::from_bytes(bytes, big_endian);
            written += 1;
        }
        Ok(written)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<&str> for SampleFormat {
    fn from(token: &str) -> Self {
        Self::from_token(token)
    }
}

impl From<String> for SampleFormat {
    fn from(token: String) -> Self {
        Self::from_token(&token)
    }
}

impl From<SampleFormat> for String {
    fn from(format: SampleFormat) -> Self {
        format.token().to_string()
    }
}

/// Element type of a render output buffer.
pub trait PcmSample: Copy + Default + Send + 'static {
    /// Width in bytes.
    const WIDTH: usize;
    const SIGNED: bool;

    /// Read one sample from exactly `WIDTH` bytes.
    fn from_bytes(bytes: &[u8], big_endian: bool) -> Self;
}

impl PcmSample for u8 {
    const WIDTH: usize = 1;
    const SIGNED: bool = false;

    fn from_bytes(bytes: &[u8], _big_endian: bool) -> Self {
        bytes[0]
    }
}

impl PcmSample for i8 {
    const WIDTH: usize = 1;
    const SIGNED: bool = true;

    fn from_bytes(bytes: &[u8], _big_endian: bool) -> Self {
        Self::from_ne_bytes([bytes[0]])
    }
}

impl PcmSample for u16 {
    const WIDTH: usize = 2;
    const SIGNED: bool = false;

    fn from_bytes(bytes: &[u8], big_endian: bool) -> Self {
        let raw = [bytes[0], bytes[1]];
        if big_endian {
            Self::from_be_bytes(raw)
        } else {
            Self::from_le_bytes(raw)
        }
    }
}

impl PcmSample for i16 {
    const WIDTH: usize = 2;
    const SIGNED: bool = true;

    fn from_bytes(bytes: &[u8], big_endian: bool) -> Self {
        let raw = [bytes[0], bytes[1]];
        if big_endian {
            Self::from_be_bytes(raw)
        } else {
            Self::from_le_bytes(raw)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_token_table() {
        let table = [
            ("u8", SampleFormat::U8, 0x0008),
            ("s8", SampleFormat::S8, 0x8008),
            ("u16", SampleFormat::U16Lsb, 0x0010),
            ("u16lsb", SampleFormat::U16Lsb, 0x0010),
            ("s16", SampleFormat::S16Lsb, 0x8010),
            ("s16lsb", SampleFormat::S16Lsb, 0x8010),
            ("u16msb", SampleFormat::U16Msb, 0x1010),
            ("s16msb", SampleFormat::S16Msb, 0x9010),
        ];

        for (token, format, code) in table {
            assert_eq!(SampleFormat::from_token(token), format, "{token}");
            assert_eq!(format.code(), code, "{token}");
        }
    }

    #[test]
    fn test_unknown_token_is_u8() {
        assert_eq!(SampleFormat::from_token("f32"), SampleFormat::U8);
        assert_eq!(SampleFormat::from_token(""), SampleFormat::U8);
        assert_eq!(SampleFormat::from_token("S16"), SampleFormat::U8);
    }

    #[test]
    fn test_default_is_s16() {
        assert_eq!(SampleFormat::default(), SampleFormat::S16Lsb);
    }

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(2), 2);
        assert_eq!(SampleFormat::S8.bytes_per_sample(1), 1);
        assert_eq!(SampleFormat::U16Lsb.bytes_per_sample(2), 4);
        assert_eq!(SampleFormat::S16Lsb.bytes_per_sample(1), 2);
        assert_eq!(SampleFormat::U16Msb.bytes_per_sample(2), 4);
        assert_eq!(SampleFormat::S16Msb.bytes_per_sample(2), 4);
    }

    #[test]
    fn test_view_selection() {
        assert!(SampleFormat::U8.accepts::<u8>());
        assert!(SampleFormat::S8.accepts::<i8>());
        assert!(SampleFormat::U16Lsb.accepts::<u16>());
        assert!(SampleFormat::U16Msb.accepts::<u16>());
        assert!(SampleFormat::S16Lsb.accepts::<i16>());
        assert!(SampleFormat::S16Msb.accepts::<i16>());

        assert!(!SampleFormat::S16Lsb.accepts::<u16>());
        assert!(!SampleFormat::U8.accepts::<i16>());
        assert!(!SampleFormat::S8.accepts::<u8>());
    }

    #[test]
    fn test_decode_endianness() {
        let bytes = [0x12, 0x34, 0xFF, 0xFE];

        let mut le = [0u16; 2];
        assert_eq!(SampleFormat::U16Lsb.decode_into(&bytes, &mut le).unwrap(), 2);
        assert_eq!(le, [0x3412, 0xFEFF]);

        let mut be = [0u16; 2];
        SampleFormat::U16Msb.decode_into(&bytes, &mut be).unwrap();
        assert_eq!(be, [0x1234, 0xFFFE]);

        let mut signed_be = [0i16; 2];
        SampleFormat::S16Msb
            .decode_into(&bytes, &mut signed_be)
            .unwrap();
        assert_eq!(signed_be, [0x1234, -2]);

        let mut signed_8 = [0i8; 4];
        SampleFormat::S8.decode_into(&bytes, &mut signed_8).unwrap();
        assert_eq!(signed_8, [0x12, 0x34, -1, -2]);
    }

    #[test]
    fn test_decode_bounded_by_destination() {
        let bytes = [1u8, 2, 3, 4, 5, 6];
        let mut out = [0u8; 4];
        assert_eq!(SampleFormat::U8.decode_into(&bytes, &mut out).unwrap(), 4);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_rejects_wrong_view() {
        let mut out = [0u16; 2];
        let err = SampleFormat::S16Lsb
            .decode_into(&[0, 0, 0, 0], &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FormatMismatch {
                expected: SampleFormat::S16Lsb
            }
        ));
    }

    #[test]
    fn test_serde_tokens() {
        let format: SampleFormat = serde_json::from_str("\"u16msb\"").unwrap();
        assert_eq!(format, SampleFormat::U16Msb);
        assert_eq!(serde_json::to_string(&SampleFormat::S16Lsb).unwrap(), "\"s16\"");
    }

    proptest! {
        #[test]
        fn prop_code_roundtrip(index in 0usize..6) {
            let format = SampleFormat::ALL[index];
            prop_assert_eq!(SampleFormat::from_code(format.code()), Some(format));
            prop_assert_eq!(SampleFormat::from_token(format.token()), format);
        }

        #[test]
        fn prop_unknown_tokens_fall_back(token in "[a-z0-9]{0,8}") {
            let known = ["u8", "s8", "u16", "u16lsb", "s16", "s16lsb", "u16msb", "s16msb"];
            prop_assume!(!known.contains(&token.as_str()));
            prop_assert_eq!(SampleFormat::from_token(&token), SampleFormat::U8);
        }
    }
}
