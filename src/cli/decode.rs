use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use indicatif::MultiProgress;

use framesync::process::route::Output;
use framesync::structs::frame_info::FrameInfo;

use super::command::{AudioFormat, Cli, DecodeArgs};
use super::progress::create_progress_bar;
use super::{create_session, path_with_extension, stream_input};
use crate::wav::WavWriter;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let codec = args.stream.codec();
    log::info!(
        "Decoding {codec} stream: {} (strict mode: {})",
        args.stream.input.display(),
        cli.strict
    );

    let mut session = create_session(&args.stream)?;

    let writer = match &args.output_path {
        None => {
            log::info!("No output path specified, decoding without writing audio");
            None
        }
        Some(base) => match args.format {
            AudioFormat::Pcm => {
                let path = path_with_extension(base, "pcm");
                let file = File::create(&path)
                    .with_context(|| format!("Cannot create {}", path.display()))?;
                log::info!("Writing PCM to {}", path.display());

                session.set_output(Output::sink(BufWriter::new(file)));
                session.set_format_callback(|info| log::info!("PCM format: {info}"));
                None
            }
            AudioFormat::Wav => {
                let (tx, rx) = mpsc::channel::<(FrameInfo, Vec<i16>)>();
                session.set_output(Output::callback(move |info, samples| {
                    // The writer thread only exits early on an I/O error,
                    // which it reports when joined.
                    let _ = tx.send((*info, samples.to_vec()));
                }));

                let base = base.clone();
                Some(thread::spawn(move || write_wav_segments(&base, rx)))
            }
        },
    };

    let pb = multi
        .map(|multi| create_progress_bar(multi, "Decoding"))
        .transpose()?;
    let result = stream_input(&args.stream, cli, &mut session, pb.as_ref());
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let stats = session.stats();
    // Dropping the session drops its output, closing the channel or
    // flushing the sink.
    drop(session);

    if let Some(handle) = writer {
        let segments = handle
            .join()
            .map_err(|_| anyhow::anyhow!("WAV writer thread panicked"))??;
        for path in &segments {
            log::info!("Wrote {}", path.display());
        }
    }
    let bytes_read = result?;

    log::info!(
        "Decoded {} frames from {bytes_read} bytes ({} discarded, {} resyncs, {} stalls)",
        stats.frames_decoded,
        stats.bytes_discarded,
        stats.resyncs,
        stats.stalls
    );
    Ok(())
}

/// Path of WAV segment `index`: `base.wav`, then `base.1.wav`, `base.2.wav`, ...
fn segment_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return path_with_extension(base, "wav");
    }

    let stem = match base.extension() {
        Some(ext) if ext == "wav" => base.with_extension(""),
        _ => base.to_path_buf(),
    };
    path_with_extension(&stem, &format!("{index}.wav"))
}

/// Writes received frames to WAV files, starting a new file whenever the
/// sample rate or channel count changes.
fn write_wav_segments(
    base: &Path,
    rx: mpsc::Receiver<(FrameInfo, Vec<i16>)>,
) -> Result<Vec<PathBuf>> {
    let mut segments = Vec::new();
    let mut current: Option<WavWriter<File>> = None;

    for (info, samples) in rx {
        let matches = current.as_ref().is_some_and(|wav| {
            wav.sample_rate() == info.sample_rate && wav.channels() == info.channels
        });

        if !matches {
            if let Some(mut wav) = current.take() {
                wav.finish()?;
            }

            let path = segment_path(base, segments.len());
            let file =
                File::create(&path).with_context(|| format!("Cannot create {}", path.display()))?;
            log::info!("Writing {info} to {}", path.display());
            current = Some(WavWriter::new(file, info.sample_rate, info.channels)?);
            segments.push(path);
        }

        if let Some(wav) = current.as_mut() {
            wav.write_samples(&samples)?;
        }
    }

    if let Some(mut wav) = current {
        wav.finish()?;
    }
    Ok(segments)
}
