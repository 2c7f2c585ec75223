//! Offline WAV rendering
//!
//! 16-bit stereo PCM through `hound`. Used by the CLI to audition tracks and
//! effects without an audio device.

use std::path::Path;

use crate::error::Result;
use crate::synth::Frame;

const CHUNK_FRAMES: usize = 4096;

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 2,
        sample_rate: sample_rate.max(1),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

#[inline]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Write already rendered frames
pub fn write_wav(path: impl AsRef<Path>, frames: &[Frame], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate))?;
    for frame in frames {
        writer.write_sample(to_i16(frame.left))?;
        writer.write_sample(to_i16(frame.right))?;
    }
    writer.finalize()?;
    log::info!("Wrote {} frames to {}", frames.len(), path.display());
    Ok(())
}

/// Pull `total_frames` from `source` in fixed chunks and write them as they come
pub fn stream_wav<F>(
    path: impl AsRef<Path>,
    sample_rate: u32,
    total_frames: usize,
    mut source: F,
) -> Result<()>
where
    F: FnMut(&mut [Frame]),
{
    let path = path.as_ref();
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate))?;
    let mut buffer = vec![Frame::SILENT; CHUNK_FRAMES.min(total_frames.max(1))];

    let mut written = 0;
    while written < total_frames {
        let n = (total_frames - written).min(buffer.len());
        let chunk = &mut buffer[..n];
        source(chunk);
        for frame in chunk.iter() {
            writer.write_sample(to_i16(frame.left))?;
            writer.write_sample(to_i16(frame.right))?;
        }
        written += n;
    }

    writer.finalize()?;
    log::info!("Streamed {total_frames} frames to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{Track, TrackConfig};

    #[test]
    fn test_write_wav_header_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let frames = [Frame::new(1.0, -1.0), Frame::new(0.0, 0.5), Frame::mono(2.0)];
        write_wav(&path, &frames, 22_050).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, -i16::MAX, 0, 16_383, i16::MAX, i16::MAX]);
    }

    #[test]
    fn test_stream_matches_write() {
        let dir = tempfile::tempdir().unwrap();
        let streamed = dir.path().join("streamed.wav");
        let whole = dir.path().join("whole.wav");

        let mut track = Track::new(TrackConfig::menu());
        track.start();
        stream_wav(&streamed, 44_100, 10_000, |out| track.fill(out)).unwrap();

        let mut again = Track::new(TrackConfig::menu());
        again.start();
        write_wav(&whole, &again.request_frames(10_000), 44_100).unwrap();

        let read = |p: &Path| -> Vec<i16> {
            hound::WavReader::open(p)
                .unwrap()
                .samples::<i16>()
                .map(|s| s.unwrap())
                .collect()
        };
        let a = read(&streamed);
        assert_eq!(a.len(), 20_000);
        assert_eq!(a, read(&whole));
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.wav");
        assert!(write_wav(&path, &[Frame::SILENT], 44_100).is_err());
    }
}
