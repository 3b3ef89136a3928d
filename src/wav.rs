use std::io::{self, BufWriter, Seek, SeekFrom, Write};

const RIFF_ID: &[u8; 4] = b"RIFF";
const WAVE_ID: &[u8; 4] = b"WAVE";
const FMT_ID: &[u8; 4] = b"fmt ";
const DATA_ID: &[u8; 4] = b"data";

const BITS_PER_SAMPLE: u16 = 16;
const HEADER_LEN: u64 = 44;

/// RIFF WAVE writer for interleaved 16-bit PCM.
///
/// The header is written on creation with zero sizes and patched by
/// [`finish`](WavWriter::finish).
pub struct WavWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    sample_rate: u32,
    channels: u16,
    data_written: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(writer: W, sample_rate: u32, channels: u16) -> io::Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid WAV format: {sample_rate} Hz, {channels} channels"),
            ));
        }

        let mut wav = Self {
            writer: BufWriter::new(writer),
            sample_rate,
            channels,
            data_written: 0,
        };
        wav.write_header()?;
        Ok(wav)
    }

    fn write_header(&mut self) -> io::Result<()> {
        let block_align = self.channels * (BITS_PER_SAMPLE / 8);
        let byte_rate = self.sample_rate * u32::from(block_align);

        self.writer.write_all(RIFF_ID)?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.write_all(WAVE_ID)?;

        self.writer.write_all(FMT_ID)?;
        self.writer.write_all(&16u32.to_le_bytes())?;
        self.writer.write_all(&1u16.to_le_bytes())?; // PCM
        self.writer.write_all(&self.channels.to_le_bytes())?;
        self.writer.write_all(&self.sample_rate.to_le_bytes())?;
        self.writer.write_all(&byte_rate.to_le_bytes())?;
        self.writer.write_all(&block_align.to_le_bytes())?;
        self.writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

        self.writer.write_all(DATA_ID)?;
        self.writer.write_all(&0u32.to_le_bytes())?;
        Ok(())
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        for sample in samples {
            self.writer.write_all(&sample.to_le_bytes())?;
        }
        self.data_written += samples.len() as u64 * 2;
        Ok(())
    }

    /// Patches the chunk sizes and flushes.
    ///
    /// Sizes beyond the 32-bit RIFF limit are saturated.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        let end = self.writer.stream_position()?;

        let data_size = u32::try_from(self.data_written).unwrap_or(u32::MAX);
        let riff_size = u32::try_from(self.data_written + HEADER_LEN - 8).unwrap_or(u32::MAX);

        self.writer.seek(SeekFrom::Start(4))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(HEADER_LEN - 4))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// PCM bytes written so far.
    pub fn data_written(&self) -> u64 {
        self.data_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_and_sizes() -> io::Result<()> {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), 44100, 2)?;
        writer.write_samples(&[1, -1, 0x0102, 0])?;
        writer.finish()?;
        assert_eq!(writer.data_written(), 8);

        let buffer = writer.into_inner()?.into_inner();
        assert_eq!(buffer.len(), 52);
        assert_eq!(&buffer[0..4], RIFF_ID);
        assert_eq!(u32::from_le_bytes(buffer[4..8].try_into().unwrap()), 44);
        assert_eq!(&buffer[8..12], WAVE_ID);
        assert_eq!(u16::from_le_bytes([buffer[22], buffer[23]]), 2);
        assert_eq!(u32::from_le_bytes(buffer[24..28].try_into().unwrap()), 44100);
        assert_eq!(u32::from_le_bytes(buffer[28..32].try_into().unwrap()), 176400);
        assert_eq!(&buffer[36..40], DATA_ID);
        assert_eq!(u32::from_le_bytes(buffer[40..44].try_into().unwrap()), 8);
        assert_eq!(&buffer[44..], [1, 0, 0xFF, 0xFF, 2, 1, 0, 0]);
        Ok(())
    }

    #[test]
    fn rejects_empty_format() {
        assert!(WavWriter::new(Cursor::new(Vec::new()), 0, 2).is_err());
        assert!(WavWriter::new(Cursor::new(Vec::new()), 48000, 0).is_err());
    }
}
