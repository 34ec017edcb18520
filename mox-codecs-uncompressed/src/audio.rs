// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uncompressed PCM audio: every channel stored at one common sample width, interleaved
//! sample-by-sample in channel order (the classic WAV block-alignment layout).

use mox_core::audio::{AudioBuffer, AudioSlice};
use mox_core::channels::{standard_audio_channel_names, AudioChannel, AudioChannelList};
use mox_core::codec::{AudioCodec, AudioCodecInfo, AudioCodecQueues, AUDIO_CHANNELS_ALL};
use mox_core::data::DataChunk;
use mox_core::descriptor::{Descriptor, WaveAudioDescriptor};
use mox_core::errors::{input_error, logic_error, Result};
use mox_core::header::Header;
use mox_core::sample::SampleType;
use mox_core::threads::task_group;

/// Negotiates a single common [`SampleType`] for every channel this codec will carry; PCM can
/// store any type `mox-core` defines, so `compressed_type` is always the identity.
pub struct UncompressedPcmCodecInfo;

impl AudioCodecInfo for UncompressedPcmCodecInfo {
    fn can_compress_type(&self, _sample_type: SampleType) -> bool {
        true
    }

    fn channel_capabilities(&self) -> mox_core::codec::AudioChannelCapabilities {
        AUDIO_CHANNELS_ALL
    }

    fn create_compressor(
        &self,
        header: &Header,
        channels: &AudioChannelList,
    ) -> Result<Box<dyn AudioCodec>> {
        if channels.is_empty() {
            return logic_error("uncompressed PCM codec requires at least one audio channel");
        }

        let sample_type = common_sample_type(channels)?;
        let names: Vec<String> = channels.iter().map(|(name, _)| name.to_string()).collect();

        let descriptor = WaveAudioDescriptor::new(
            header.frame_rate()?,
            header.sample_rate()?,
            names.len() as u32,
            (sample_type.size() * 8) as u32,
        );

        Ok(Box::new(UncompressedPcmCodec {
            descriptor,
            names,
            sample_type,
            queues: AudioCodecQueues::new(),
        }))
    }

    fn create_decompressor(
        &self,
        descriptor: &Descriptor,
        _header: &mut Header,
        channels: &mut AudioChannelList,
    ) -> Result<Box<dyn AudioCodec>> {
        let descriptor = match descriptor {
            Descriptor::Wave(w) => w.clone(),
            Descriptor::Aes3(a) => a.wave.clone(),
            _ => return input_error("uncompressed PCM codec expects a wave audio descriptor"),
        };

        let sample_type = sample_type_from_bits(descriptor.audio.quantization_bits)?;
        let names = standard_audio_channel_names(descriptor.audio.channel_count);

        for name in &names {
            channels.insert(name.clone(), AudioChannel::new(sample_type));
        }

        Ok(Box::new(UncompressedPcmCodec {
            descriptor,
            names,
            sample_type,
            queues: AudioCodecQueues::new(),
        }))
    }
}

/// The common sample type every channel in `channels` shares, or a logic error if they differ —
/// real WAV block alignment has no way to express a mix of bit depths in one stream.
fn common_sample_type(channels: &AudioChannelList) -> Result<SampleType> {
    let mut iter = channels.iter();
    let (_, first) = iter.next().expect("checked non-empty by the caller");

    for (name, channel) in iter {
        if channel.sample_type != first.sample_type {
            return logic_error(format!(
                "uncompressed PCM codec requires every channel at the same sample type, but {name} differs"
            ));
        }
    }

    Ok(first.sample_type)
}

fn sample_type_from_bits(bits: u32) -> Result<SampleType> {
    match bits {
        8 => Ok(SampleType::U8),
        16 => Ok(SampleType::S16),
        24 => Ok(SampleType::S24),
        32 => Ok(SampleType::S32),
        other => input_error(format!("uncompressed PCM codec cannot store a {other}-bit sample")),
    }
}

/// Encodes/decodes one interleaved PCM stream. Either a compressor or a decompressor, never both,
/// mirroring [`crate::video::UncompressedVideoCodec`].
pub struct UncompressedPcmCodec {
    descriptor: WaveAudioDescriptor,
    names: Vec<String>,
    sample_type: SampleType,
    queues: AudioCodecQueues,
}

impl AudioCodec for UncompressedPcmCodec {
    fn descriptor(&self) -> &mox_core::descriptor::AudioDescriptor {
        &self.descriptor.audio
    }

    fn container_descriptor(&self) -> Descriptor {
        Descriptor::Wave(self.descriptor.clone())
    }

    fn compress(&mut self, audio: &AudioBuffer) -> Result<()> {
        let length = audio.length();
        let sample_size = self.sample_type.size();
        let block_align = self.names.len() * sample_size;
        let data = DataChunk::zeroed(block_align * length as usize);

        let names = &self.names;
        let sample_type = self.sample_type;
        task_group(|scope| {
            for (channel_index, name) in names.iter().enumerate() {
                let data = data.clone();
                let slice = audio.find_slice(name).cloned();
                scope.spawn(move |_| {
                    let Some(slice) = slice
                    else {
                        return;
                    };
                    for i in 0..length {
                        if let Ok(value) = slice.get(i) {
                            let pos = i as usize * block_align + channel_index * sample_size;
                            write_sample(&mut data.lock()[pos..pos + sample_size], sample_type, value);
                        }
                    }
                });
            }
        });

        self.queues.store_data(data);
        Ok(())
    }

    fn next_data(&mut self) -> Option<DataChunk> {
        self.queues.next_data()
    }

    fn samples_in_frame(&self, frame_size: usize) -> u64 {
        let block_align = self.names.len() * self.sample_type.size();
        if block_align == 0 {
            0
        }
        else {
            (frame_size / block_align) as u64
        }
    }

    fn decompress(&mut self, data: &DataChunk) -> Result<()> {
        let sample_size = self.sample_type.size();
        let block_align = self.names.len() * sample_size;

        if block_align == 0 || data.len() % block_align != 0 {
            return input_error("uncompressed PCM packet size is not a multiple of the block alignment");
        }

        let length = (data.len() / block_align) as u64;
        let mut buffer = AudioBuffer::new(length);
        for name in &self.names {
            buffer.insert(name.clone(), AudioSlice::allocate(self.sample_type, length)?);
        }

        let names = &self.names;
        let sample_type = self.sample_type;
        task_group(|scope| {
            for (channel_index, name) in names.iter().enumerate() {
                if let Some(slice) = buffer.find_slice(name).cloned() {
                    scope.spawn(move |_| {
                        let bytes = data.lock();
                        for i in 0..length {
                            let pos = i as usize * block_align + channel_index * sample_size;
                            let value = read_sample(&bytes[pos..pos + sample_size], sample_type);
                            let _ = slice.set(i, value);
                        }
                    });
                }
            }
        });

        self.queues.store_buffer(buffer);
        Ok(())
    }

    fn next_buffer(&mut self) -> Option<AudioBuffer> {
        self.queues.next_buffer()
    }
}

/// Writes `value` (nominal range `[-1.0, 1.0]`) as a little-endian sample, mirroring
/// [`AudioSlice::set`]'s conversion so a round trip through this codec matches one through the
/// in-memory buffer's own conversion.
fn write_sample(dest: &mut [u8], sample_type: SampleType, value: f64) {
    let clipped = value.max(-1.0).min(1.0);

    match sample_type {
        SampleType::U8 => dest[0] = (clipped * i8::MAX as f64 + 128.0).round() as u8,
        SampleType::S16 => dest.copy_from_slice(&((clipped * i16::MAX as f64).round() as i16).to_le_bytes()),
        SampleType::S24 => {
            let v = (clipped * 0x7F_FFFF as f64).round() as i32;
            dest.copy_from_slice(&v.to_le_bytes()[..3]);
        }
        SampleType::S32 => dest.copy_from_slice(&((clipped * i32::MAX as f64).round() as i32).to_le_bytes()),
        SampleType::Float => dest.copy_from_slice(&(value as f32).to_le_bytes()),
    }
}

fn read_sample(src: &[u8], sample_type: SampleType) -> f64 {
    match sample_type {
        SampleType::U8 => (src[0] as f64 - 128.0) / i8::MAX as f64,
        SampleType::S16 => i16::from_le_bytes([src[0], src[1]]) as f64 / i16::MAX as f64,
        SampleType::S24 => {
            let v = i32::from_le_bytes([src[0], src[1], src[2], 0]);
            ((v << 8) >> 8) as f64 / 0x7F_FFFF as f64
        }
        SampleType::S32 => i32::from_le_bytes([src[0], src[1], src[2], src[3]]) as f64 / i32::MAX as f64,
        SampleType::Float => f64::from(f32::from_le_bytes([src[0], src[1], src[2], src[3]])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mox_core::units::Rational;

    fn test_header() -> Header {
        Header::new(4, 2).unwrap()
    }

    #[test]
    fn compresses_and_decompresses_stereo_s16() {
        let info = UncompressedPcmCodecInfo;
        let header = test_header()
            .with_frame_rate(Rational::new(24, 1).unwrap())
            .unwrap()
            .with_sample_rate(Rational::new(48000, 1).unwrap())
            .unwrap();

        let mut channels = AudioChannelList::new();
        channels.insert("Left", AudioChannel::new(SampleType::S16));
        channels.insert("Right", AudioChannel::new(SampleType::S16));

        let mut compressor = info.create_compressor(&header, &channels).unwrap();

        let mut audio = AudioBuffer::new(4);
        audio.insert("Left", AudioSlice::allocate(SampleType::S16, 4).unwrap());
        audio.insert("Right", AudioSlice::allocate(SampleType::S16, 4).unwrap());
        audio.find_slice("Left").unwrap().set(2, 0.5).unwrap();
        audio.find_slice("Right").unwrap().set(2, -0.5).unwrap();

        compressor.compress(&audio).unwrap();
        let packet = compressor.next_data().unwrap();
        assert_eq!(packet.len(), 4 * 2 * 2);

        let descriptor = compressor.container_descriptor();
        let mut decode_header = test_header();
        let mut decoded_channels = AudioChannelList::new();
        let mut decompressor =
            info.create_decompressor(&descriptor, &mut decode_header, &mut decoded_channels).unwrap();

        assert_eq!(decoded_channels.find_channel("Left").unwrap().sample_type, SampleType::S16);

        decompressor.decompress(&packet).unwrap();
        let decoded = decompressor.next_buffer().unwrap();

        assert!((decoded.find_slice("Left").unwrap().get(2).unwrap() - 0.5).abs() < 0.01);
        assert!((decoded.find_slice("Right").unwrap().get(2).unwrap() + 0.5).abs() < 0.01);
    }

    #[test]
    fn samples_in_frame_divides_by_block_alignment() {
        let info = UncompressedPcmCodecInfo;
        let header = test_header()
            .with_frame_rate(Rational::new(24, 1).unwrap())
            .unwrap()
            .with_sample_rate(Rational::new(48000, 1).unwrap())
            .unwrap();

        let mut channels = AudioChannelList::new();
        channels.insert("Mono", AudioChannel::new(SampleType::S16));
        let codec = info.create_compressor(&header, &channels).unwrap();

        assert_eq!(codec.samples_in_frame(2000 * 2), 2000);
    }

    #[test]
    fn rejects_mismatched_sample_types_across_channels() {
        let info = UncompressedPcmCodecInfo;
        let header = test_header()
            .with_frame_rate(Rational::new(24, 1).unwrap())
            .unwrap()
            .with_sample_rate(Rational::new(48000, 1).unwrap())
            .unwrap();

        let mut channels = AudioChannelList::new();
        channels.insert("Left", AudioChannel::new(SampleType::S16));
        channels.insert("Right", AudioChannel::new(SampleType::Float));

        assert!(info.create_compressor(&header, &channels).is_err());
    }
}
