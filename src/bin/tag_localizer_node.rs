use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tag_localizer::capture::{FrameGate, POLL_SLEEP};
use tag_localizer::lifecycle::LifecycleNode;
use tag_localizer::perception::sensors::{DetectionSource, ReplaySource};
use tag_localizer::{Parameters, PerceptionStack};

/// Localize the robot from recorded AprilTag detections.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Parameter file with camera, detector and layout settings
    #[arg(long, default_value = "parameters.json")]
    params: PathBuf,
    /// JSON Lines file with one frame of detections per line
    #[arg(long)]
    detections: PathBuf,
    /// Stop after this many frames (overrides post_process.max_frames)
    #[arg(long)]
    max_frames: Option<u64>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|e| anyhow!("invalid log level {:?}: {}", args.log_level, e))?;
    tag_localizer::logging::init_with_level(level)?;

    let mut params = Parameters::load(&args.params)
        .with_context(|| format!("failed to load {}", args.params.display()))?;
    if args.max_frames.is_some() {
        params.post_process.max_frames = args.max_frames;
    }
    let max_frames = params.post_process.max_frames;
    let gate = FrameGate::new(params.camera.frame_interval());
    log::info!(
        "capturing at {} fps ({}x{}), frame limit {:?}",
        params.camera.fps,
        params.camera.frame_width,
        params.camera.frame_height,
        max_frames
    );

    let mut source = ReplaySource::open(&args.detections)
        .with_context(|| format!("failed to open {}", args.detections.display()))?;

    let mut stack = PerceptionStack::new(params);
    stack.on_configure()?;
    stack.on_activate()?;

    let result = run(&mut stack, &mut source, gate, max_frames).await;

    stack.on_deactivate()?;
    if let Some(pose) = stack.last_pose() {
        log::info!(
            "final pose: x={:.3} y={:.3} heading={:.3}",
            pose.x,
            pose.y,
            pose.heading
        );
    }
    stack.on_cleanup()?;
    result
}

async fn run(
    stack: &mut PerceptionStack,
    source: &mut dyn DetectionSource,
    mut gate: FrameGate,
    max_frames: Option<u64>,
) -> Result<()> {
    let mut out = std::io::stdout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        if max_frames.is_some_and(|max| stack.frames_processed() >= max) {
            log::info!("reached frame limit");
            break;
        }

        if !gate.poll(Instant::now()) {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("interrupted");
                    break;
                }
                _ = tokio::time::sleep(POLL_SLEEP) => {}
            }
            continue;
        }

        let Some(detections) = source.next_frame()? else {
            log::info!("{} exhausted", source.name());
            break;
        };

        let report = stack.process_frame(&detections)?;
        match report.pose {
            Some(pose) => log::info!(
                "frame {}: {} tag(s) -> x={:.3} y={:.3} heading={:.3} in {:.1} ms",
                report.frame,
                report.tags_used.len(),
                pose.x,
                pose.y,
                pose.heading,
                report.processing_secs * 1e3
            ),
            None => log::info!("frame {}: no pose", report.frame),
        }

        serde_json::to_writer(&mut out, &report)?;
        writeln!(out)?;
    }

    Ok(())
}
