//! Float to PCM byte encoding.

use patchplay_core::SampleFormat;

/// Encode one sample in `[-1.0, 1.0]` into `out`, which must be
/// `format.bytes_per_channel()` long.
pub fn encode_sample(format: SampleFormat, value: f32, out: &mut [u8]) {
    let value = value.clamp(-1.0, 1.0);

    if format.bytes_per_channel() == 1 {
        let signed = (value * 127.0).round() as i8;
        out[0] = if format.is_signed() {
            signed as u8
        } else {
            (i16::from(signed) + 128) as u8
        };
        return;
    }

    let signed = (value * 32767.0).round() as i16;
    let bits = if format.is_signed() {
        signed as u16
    } else {
        (i32::from(signed) + 32768) as u16
    };
    let bytes = if format.is_big_endian() {
        bits.to_be_bytes()
    } else {
        bits.to_le_bytes()
    };
    out.copy_from_slice(&bytes);
}

/// Interleave stereo planes into `out` with `channels` channels per frame.
///
/// Mono averages left and right; channels past the second are silent.
/// Returns the bytes written.
pub fn encode_frames(
    format: SampleFormat,
    channels: u16,
    left: &[f32],
    right: &[f32],
    out: &mut [u8],
) -> usize {
    let width = format.bytes_per_channel();
    let frame_bytes = format.bytes_per_sample(channels);
    if frame_bytes == 0 {
        return 0;
    }

    let mut written = 0;
    for ((frame, l), r) in out.chunks_exact_mut(frame_bytes).zip(left).zip(right) {
        for (ch, sample) in frame.chunks_exact_mut(width).enumerate() {
            let value = match (channels, ch) {
                (1, _) => (l + r) * 0.5,
                (_, 0) => *l,
                (_, 1) => *r,
                _ => 0.0,
            };
            encode_sample(format, value, sample);
        }
        written += frame_bytes;
    }
    written
}
