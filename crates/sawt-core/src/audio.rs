//! Inbound PCM format and WAV wrapping for providers that want a container.

use std::io::Cursor;

/// Sample rate of client audio.
pub const PCM_SAMPLE_RATE: u32 = 16_000;
/// Client audio is mono.
pub const PCM_CHANNELS: u16 = 1;
/// 16-bit signed little-endian samples.
pub const PCM_SAMPLE_WIDTH: usize = 2;

/// Playback duration of a PCM buffer in milliseconds.
pub fn pcm_duration_ms(byte_len: usize) -> u64 {
    let samples = (byte_len / PCM_SAMPLE_WIDTH) as u64;
    samples * 1000 / u64::from(PCM_SAMPLE_RATE)
}

/// Wrap raw PCM in a RIFF/WAV container. A trailing odd byte (half a
/// sample) is dropped.
pub fn wrap_wav(pcm: &[u8]) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: PCM_CHANNELS,
        sample_rate: PCM_SAMPLE_RATE,
        bits_per_sample: (PCM_SAMPLE_WIDTH * 8) as u16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for pair in pcm.chunks_exact(PCM_SAMPLE_WIDTH) {
            writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
