use std::io::Cursor;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::types::AudioClip;

/// Decode an in-memory audio payload to mono f32 samples.
///
/// `extension_hint` (e.g. "wav", "mp3") narrows format probing but is not
/// required; the container is probed from the bytes either way. All failure
/// modes collapse into [`EngineError::UnreadableAudio`] since the caller can
/// do nothing but supply different audio.
pub fn decode_bytes(bytes: Vec<u8>, extension_hint: Option<&str>) -> Result<AudioClip> {
    if bytes.is_empty() {
        return Err(EngineError::UnreadableAudio("empty payload".into()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_hint {
        hint.with_extension(extension);
    }

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| EngineError::UnreadableAudio(format!("format probe failed: {err}")))?;

    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::UnreadableAudio("no audio track in payload".into()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| EngineError::UnreadableAudio("sample rate missing from stream".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| EngineError::UnreadableAudio(format!("unsupported codec: {err}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => {
                return Err(EngineError::UnreadableAudio(format!(
                    "packet read failed: {err}"
                )))
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder
            .decode(&packet)
            .map_err(|err| EngineError::UnreadableAudio(format!("decode failed: {err}")))?;
        mix_to_mono(&decoded, &mut samples);
    }

    if samples.is_empty() {
        return Err(EngineError::UnreadableAudio(
            "stream decoded to zero samples".into(),
        ));
    }

    debug!(
        sample_rate,
        samples = samples.len(),
        "decoded audio payload"
    );
    Ok(AudioClip {
        samples,
        sample_rate,
    })
}

/// Downmix a decoded buffer of any sample format to f32 mono by averaging
/// channels.
fn mix_to_mono(buffer: &AudioBufferRef, out: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::U8(buf) => mix_planes(buf, out),
        AudioBufferRef::U16(buf) => mix_planes(buf, out),
        AudioBufferRef::U24(buf) => mix_planes(buf, out),
        AudioBufferRef::U32(buf) => mix_planes(buf, out),
        AudioBufferRef::S8(buf) => mix_planes(buf, out),
        AudioBufferRef::S16(buf) => mix_planes(buf, out),
        AudioBufferRef::S24(buf) => mix_planes(buf, out),
        AudioBufferRef::S32(buf) => mix_planes(buf, out),
        AudioBufferRef::F32(buf) => mix_planes(buf, out),
        AudioBufferRef::F64(buf) => mix_planes(buf, out),
    }
}

fn mix_planes<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    if channels == 1 {
        out.extend(buf.chan(0).iter().map(|&s| IntoSample::<f32>::into_sample(s)));
        return;
    }
    for frame in 0..frames {
        let mut sum = 0.0f32;
        for channel in 0..channels {
            sum += IntoSample::<f32>::into_sample(buf.chan(channel)[frame]);
        }
        out.push(sum / channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::decode_bytes;
    use crate::error::EngineError;

    #[test]
    fn rejects_empty_payload() {
        let err = decode_bytes(Vec::new(), Some("wav")).unwrap_err();
        assert!(matches!(err, EngineError::UnreadableAudio(_)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = decode_bytes(vec![0xde, 0xad, 0xbe, 0xef], None).unwrap_err();
        assert!(matches!(err, EngineError::UnreadableAudio(_)));
    }
}
