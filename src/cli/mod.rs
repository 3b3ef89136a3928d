use std::path::Path;

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use serde::Deserialize;

use framesync::config::StreamConfig;
use framesync::process::session::Session;

use crate::input::InputReader;
use command::{Cli, StreamArgs};

pub mod command;
pub mod decode;
pub mod info;
pub mod progress;

/// Buffer size overrides read from a `--config` YAML file.
///
/// Fields left out keep the defaults of the selected codec.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    max_frame_size: Option<usize>,
    max_pcm_size: Option<usize>,
    min_frame_size: Option<usize>,
    chunk_size: Option<usize>,
    max_write_size: Option<usize>,
    stall_limit: Option<usize>,
    clear_with_zero: Option<bool>,
    leading_garbage_tolerance: Option<usize>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut StreamConfig) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    config.$field = value;
                })*
            };
        }

        set!(
            max_frame_size,
            max_pcm_size,
            min_frame_size,
            chunk_size,
            max_write_size,
            stall_limit,
            clear_with_zero,
            leading_garbage_tolerance
        );
    }
}

fn load_config(args: &StreamArgs) -> Result<StreamConfig> {
    let mut config = args.codec().default_config();

    if let Some(path) = &args.config {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let overrides: ConfigOverrides = serde_yaml_ng::from_str(&yaml)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        overrides.apply(&mut config);
    }

    config.validate()?;
    log::debug!(
        "Session configuration:\n{}",
        serde_yaml_ng::to_string(&config)?
    );
    Ok(config)
}

/// Builds an inactive session for the input's codec and configuration.
pub fn create_session(args: &StreamArgs) -> Result<Session> {
    let mut session = Session::for_codec(args.codec());
    session.set_config(load_config(args)?)?;
    Ok(session)
}

/// Writes the whole input to an already configured session, then flushes.
///
/// The session is left active so its statistics can still be read. Returns
/// the number of bytes read.
pub fn stream_input(
    args: &StreamArgs,
    cli: &Cli,
    session: &mut Session,
    pb: Option<&ProgressBar>,
) -> Result<u64> {
    let mut input = InputReader::open(&args.input)?;
    if let Some(pb) = pb {
        match input.total_len() {
            Some(len) if !args.is_pipe() => pb.set_length(len),
            _ => pb.set_message("reading stdin"),
        }
    }

    session.begin()?;

    input.for_each_chunk(args.chunk_size, |chunk| {
        write_all(session, chunk)?;

        if cli.strict {
            check_strict(session)?;
        }
        if let Some(pb) = pb {
            pb.inc(chunk.len() as u64);
            pb.set_message(format!("{} frames", session.stats().frames_decoded));
        }
        Ok(true)
    })?;

    session.flush();
    if cli.strict {
        check_strict(session)?;
    }

    Ok(input.bytes_read())
}

/// Offers `data` until the session has taken all of it.
///
/// A session refuses input while a stalled frame fills its buffer; it
/// skips that frame after `stall_limit` attempts without progress.
fn write_all(session: &mut Session, data: &[u8]) -> Result<()> {
    let max_refusals = session.config().stall_limit + 1;
    let mut refusals = 0;
    let mut rest = data;

    while !rest.is_empty() {
        let accepted = session.write(rest)?;
        if accepted == 0 {
            refusals += 1;
            if refusals > max_refusals {
                bail!(
                    "Session stopped accepting input with {} bytes pending",
                    rest.len()
                );
            }
            continue;
        }

        refusals = 0;
        rest = &rest[accepted..];
    }
    Ok(())
}

fn check_strict(session: &Session) -> Result<()> {
    let stats = session.stats();
    if stats.resyncs > 0 {
        bail!(
            "Corrupt frame after {} decoded frames (strict mode)",
            stats.frames_decoded
        );
    }
    Ok(())
}

/// Appends `ext` unless the path already carries it.
pub fn path_with_extension(base: &Path, ext: &str) -> std::path::PathBuf {
    if base.extension().is_some_and(|existing| existing == ext) {
        return base.to_path_buf();
    }

    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    name.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use framesync::process::decode::{DecodeOutcome, FrameDecoder};
    use framesync::process::locate::SyncFinder;
    use framesync::structs::frame_info::FrameInfo;
    use framesync::utils::errors::DecoderError;

    /// Every byte starts a frame that never makes progress.
    struct EveryByte;

    impl SyncFinder for EveryByte {
        fn find_marker(&self, window: &[u8], offset: usize) -> Option<usize> {
            (offset < window.len()).then_some(offset)
        }
    }

    struct Stalling;

    impl FrameDecoder for Stalling {
        fn name(&self) -> &'static str {
            "stalling"
        }

        fn allocate(&mut self) -> Result<(), DecoderError> {
            Ok(())
        }

        fn release(&mut self) {}

        fn decode(&mut self, _window: &[u8], _samples: &mut [i16]) -> DecodeOutcome {
            DecodeOutcome::success(0)
        }

        fn last_frame_info(&self) -> FrameInfo {
            FrameInfo::default()
        }
    }

    #[test]
    fn refused_input_is_offered_again() -> Result<()> {
        let config = StreamConfig {
            max_frame_size: 64,
            min_frame_size: 0,
            chunk_size: 64,
            ..StreamConfig::default()
        };
        let mut session = Session::new(Box::new(Stalling), Box::new(EveryByte), config);
        session.begin()?;

        let data = vec![0xAA; 200];
        assert!(session.write(&data)? < data.len());

        session.end();
        session.begin()?;
        write_all(&mut session, &data)?;

        let stats = session.stats();
        assert_eq!(stats.bytes_discarded as usize + session.available(), 200);
        Ok(())
    }

    #[test]
    fn overrides_keep_codec_defaults() -> Result<()> {
        let mut config = StreamConfig::for_codec(framesync::process::decode::Codec::Aac);
        let overrides: ConfigOverrides =
            serde_yaml_ng::from_str("min_frame_size: 0\nstall_limit: 5\n")?;
        overrides.apply(&mut config);

        assert_eq!(config.min_frame_size, 0);
        assert_eq!(config.stall_limit, 5);
        assert_eq!(config.max_frame_size, 2100);
        Ok(())
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let parsed: Result<ConfigOverrides, _> = serde_yaml_ng::from_str("max_frame: 10\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn output_extension() {
        assert_eq!(
            path_with_extension(Path::new("out/radio"), "wav"),
            PathBuf::from("out/radio.wav")
        );
        assert_eq!(
            path_with_extension(Path::new("radio.wav"), "wav"),
            PathBuf::from("radio.wav")
        );
        assert_eq!(
            path_with_extension(Path::new("radio.v2"), "pcm"),
            PathBuf::from("radio.v2.pcm")
        );
    }
}
