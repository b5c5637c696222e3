//! WAV container for raw PCM speech samples.

use explodeit_error::{GeminiError, GeminiErrorKind};
use std::io::Cursor;

/// Size of the canonical RIFF/WAVE header `hound` writes for 16-bit PCM.
pub const WAV_HEADER_LEN: usize = 44;

fn encode_error(e: hound::Error) -> GeminiError {
    GeminiError::new(GeminiErrorKind::AudioEncode(e.to_string()))
}

/// Wrap little-endian mono 16-bit samples in a WAV container so they are
/// playable. A trailing odd byte is not a whole sample and is dropped.
///
/// # Examples
///
/// ```
/// use explodeit_models::{WAV_HEADER_LEN, pcm_to_wav};
///
/// let wav = pcm_to_wav(&[0, 0, 1, 0], 24_000).unwrap();
/// assert_eq!(wav.len(), WAV_HEADER_LEN + 4);
/// assert_eq!(&wav[0..4], b"RIFF");
/// ```
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, GeminiError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + pcm.len()));
    let mut writer = hound::WavWriter::new(&mut buffer, spec).map_err(encode_error)?;
    for sample in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
            .map_err(encode_error)?;
    }
    writer.finalize().map_err(encode_error)?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn header_describes_mono_16_bit_pcm() {
        let wav = pcm_to_wav(&vec![0u8; 48_000], 24_000).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN + 48_000);
        assert_eq!(u32_at(&wav, 4), 36 + 48_000);
        assert_eq!(u32_at(&wav, 24), 24_000);
        // byte rate = rate * channels * 2
        assert_eq!(u32_at(&wav, 28), 48_000);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(u32_at(&wav, 40), 48_000);
    }

    #[test]
    fn samples_survive_the_container() {
        let pcm = [0x34, 0x12, 0xff, 0x7f, 0x00, 0x80, 0x09];
        let wav = pcm_to_wav(&pcm, 16_000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0x1234, i16::MAX, i16::MIN]);
    }
}
