#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Session is not active, call begin() first")]
    Inactive,

    #[error("Session is active, configuration cannot change until end()")]
    Active,

    #[error("Could not allocate {what} of {size} bytes")]
    BufferAllocation { what: &'static str, size: usize },

    #[error("Decoder allocation failed: {0}")]
    DecoderAllocation(#[from] DecoderError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_frame_size must be greater than 0")]
    ZeroFrameBuffer,

    #[error("chunk_size must be greater than 0")]
    ZeroChunkSize,

    #[error("max_write_size must be greater than 0")]
    ZeroWriteSize,

    #[error("min_frame_size ({min}) exceeds max_frame_size ({max})")]
    MinFrameExceedsBuffer { min: usize, max: usize },

    #[error("max_pcm_size must hold at least one 16-bit sample. Got {0} bytes")]
    PcmBufferTooSmall(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum DecoderError {
    #[error("Codec {0} is not available in the codec registry")]
    CodecUnavailable(&'static str),

    #[error("Codec backend failed: {0}")]
    Backend(String),

    #[error("Decoder has not been allocated")]
    NotAllocated,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Frame header needs {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid sync word. Read {0:#05X}")]
    InvalidSync(u16),

    #[error("Reserved MPEG audio version")]
    ReservedVersion,

    #[error("Unsupported MPEG audio layer {0}, only Layer III is decoded")]
    UnsupportedLayer(u8),

    #[error("Free-format bitrate is not supported")]
    FreeFormatBitrate,

    #[error("Invalid bitrate index {0:#X}")]
    InvalidBitrateIndex(u8),

    #[error("Reserved sample rate index {0:#X}")]
    ReservedSampleRate(u8),

    #[error("Reserved emphasis value")]
    ReservedEmphasis,

    #[error("CRC mismatch in frame header. Calculated {calculated:#06X}, Read {read:#06X}")]
    CrcMismatch { calculated: u16, read: u16 },

    #[error("ADTS layer must be 0. Read {0}")]
    InvalidAdtsLayer(u8),

    #[error("ADTS channel configuration 0 (program config element) is not supported")]
    ProgramConfigElement,

    #[error("ADTS frames with {0} raw data blocks are not supported")]
    MultipleRawDataBlocks(u8),

    #[error("ADTS frame_length {length} is shorter than its header ({header})")]
    FrameTooShort { length: usize, header: usize },
}
