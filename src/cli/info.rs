use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use indicatif::MultiProgress;

use framesync::process::route::Output;
use framesync::structs::frame_info::FrameInfo;

use super::command::{Cli, InfoArgs};
use super::progress::create_progress_bar;
use super::{create_session, stream_input};

#[derive(Debug, Default)]
struct StreamSummary {
    first: Option<FrameInfo>,
    current: FrameInfo,
    format_changes: usize,
    frames: u64,
    duration: f64,
    min_bitrate: u32,
    max_bitrate: u32,
    bitrate_sum: u64,
}

impl StreamSummary {
    fn record(&mut self, info: &FrameInfo) {
        match self.first {
            None => {
                self.first = Some(*info);
                self.min_bitrate = info.bitrate;
            }
            Some(_) if info.format_changed(&self.current) => {
                log::info!("Format change at frame {}: {info}", self.frames);
                self.format_changes += 1;
            }
            Some(_) => {}
        }

        self.current = *info;
        self.frames += 1;
        self.duration += info.duration_secs();
        self.min_bitrate = self.min_bitrate.min(info.bitrate);
        self.max_bitrate = self.max_bitrate.max(info.bitrate);
        self.bitrate_sum += u64::from(info.bitrate);
    }

    fn average_bitrate(&self) -> u64 {
        self.bitrate_sum.checked_div(self.frames).unwrap_or(0)
    }
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let codec = args.stream.codec();
    log::info!("Analyzing {codec} stream: {}", args.stream.input.display());

    let summary = Arc::new(Mutex::new(StreamSummary::default()));
    let mut session = create_session(&args.stream)?;
    {
        let summary = summary.clone();
        session.set_output(Output::callback(move |info, _samples| {
            summary
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(info);
        }));
    }

    let pb = multi
        .map(|multi| create_progress_bar(multi, "Analyzing"))
        .transpose()?;
    let bytes_read = stream_input(&args.stream, cli, &mut session, pb.as_ref())?;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let stats = session.stats();
    session.end();

    let summary = summary.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(first) = summary.first else {
        println!("No decodable {codec} frames found in the input.");
        println!("Read {bytes_read} bytes, discarded {}.", stats.bytes_discarded);
        return Ok(());
    };

    println!("Codec:            {codec}");
    println!("Format:           {first}");
    if summary.format_changes > 0 {
        println!("Format changes:   {}", summary.format_changes);
        println!("Final format:     {}", summary.current);
    }
    println!("Frames:           {}", summary.frames);
    println!("Duration:         {}", time_str(summary.duration));
    if summary.min_bitrate == summary.max_bitrate {
        println!("Bitrate:          {} kbps", summary.min_bitrate);
    } else {
        println!(
            "Bitrate:          {} kbps average ({}-{} kbps)",
            summary.average_bitrate(),
            summary.min_bitrate,
            summary.max_bitrate
        );
    }
    println!("Bytes read:       {bytes_read}");
    println!("Bytes discarded:  {}", stats.bytes_discarded);
    println!("Resyncs:          {}", stats.resyncs);
    println!("Stalls:           {}", stats.stalls);

    Ok(())
}

/// Formats seconds as `HH:MM:SS.mmm`.
fn time_str(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sample_rate: u32, bitrate: u32) -> FrameInfo {
        FrameInfo {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            output_samples: 2304,
            bitrate,
        }
    }

    #[test]
    fn summary_tracks_formats_and_bitrates() {
        let mut summary = StreamSummary::default();
        summary.record(&frame(44100, 128));
        summary.record(&frame(44100, 192));
        summary.record(&frame(48000, 64));

        assert_eq!(summary.first, Some(frame(44100, 128)));
        assert_eq!(summary.format_changes, 1);
        assert_eq!(summary.frames, 3);
        assert_eq!((summary.min_bitrate, summary.max_bitrate), (64, 192));
        assert_eq!(summary.average_bitrate(), 128);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(time_str(0.0), "00:00:00.000");
        assert_eq!(time_str(61.5), "00:01:01.500");
        assert_eq!(time_str(3600.0 * 101.0 + 0.0261), "101:00:00.026");
    }
}
