use std::path::{Path, PathBuf};

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use framesync::process::decode::Codec;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for resynchronizing and decoding raw MP3 and AAC streams",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Fail on the first corrupt frame instead of resynchronizing.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode the specified stream into PCM audio.
    Decode(DecodeArgs),

    /// Print stream information
    Info(InfoArgs),
}

/// Options shared by every command that runs a session.
#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Input stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Stream codec. Guessed from the file extension when omitted.
    #[arg(long, value_enum)]
    pub codec: Option<CodecArg>,

    /// Size of the pieces the input is written to the session in.
    #[arg(long, value_name = "BYTES", default_value_t = 4096)]
    pub chunk_size: usize,

    /// YAML file overriding the session buffer sizes.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl StreamArgs {
    pub fn codec(&self) -> Codec {
        match self.codec {
            Some(codec) => codec.into(),
            None => codec_from_path(&self.input),
        }
    }

    pub fn is_pipe(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub stream: StreamArgs,

    /// Output path for audio files.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Audio format for output.
    #[arg(long, value_enum, default_value_t = AudioFormat::Wav)]
    pub format: AudioFormat,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum AudioFormat {
    /// 16-bit RIFF WAVE, one file per stream format.
    Wav,
    /// Raw PCM (16-bit little-endian).
    Pcm,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum CodecArg {
    /// MPEG-1/2/2.5 Layer III.
    Mp3,
    /// AAC in ADTS framing.
    Aac,
}

impl From<CodecArg> for Codec {
    fn from(codec: CodecArg) -> Self {
        match codec {
            CodecArg::Mp3 => Codec::Mp3,
            CodecArg::Aac => Codec::Aac,
        }
    }
}

fn codec_from_path(path: &Path) -> Codec {
    let is_adts = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("aac") || ext.eq_ignore_ascii_case("adts"));

    if is_adts { Codec::Aac } else { Codec::Mp3 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_guessed_from_extension() {
        assert_eq!(codec_from_path(Path::new("radio.AAC")), Codec::Aac);
        assert_eq!(codec_from_path(Path::new("capture.adts")), Codec::Aac);
        assert_eq!(codec_from_path(Path::new("song.mp3")), Codec::Mp3);
        assert_eq!(codec_from_path(Path::new("-")), Codec::Mp3);
    }

    #[test]
    fn parses_decode_command() {
        let cli = Cli::parse_from([
            "framesyncd",
            "--strict",
            "decode",
            "in.bin",
            "--codec",
            "aac",
            "--format",
            "pcm",
            "--chunk-size",
            "333",
        ]);

        assert!(cli.strict);
        let Commands::Decode(args) = cli.command else {
            panic!("expected decode command");
        };
        assert_eq!(args.stream.codec(), Codec::Aac);
        assert_eq!(args.stream.chunk_size, 333);
        assert_eq!(args.format, AudioFormat::Pcm);
    }
}
