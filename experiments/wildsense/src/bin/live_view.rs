use {
    anyhow::Result,
    base::{Vec2, log, log_fatal},
    clap::Parser,
    live::{LiveConfig, LiveLoop},
    minifb::{Key, KeyRepeat, Window, WindowOptions},
    std::path::PathBuf,
    video::{PatternConfig, V4l2Config, VideoIn, VideoInConfig},
    wildsense::{
        cli::{BackendArgs, LogArgs},
        feed::window_feed,
        save_snapshot,
    },
};

#[derive(Parser, Debug)]
#[command(
    name = "live-view",
    about = "Stream the camera through the WildSense detector and show the annotated frames"
)]
struct Args {
    #[command(flatten)]
    backend: BackendArgs,
    #[command(flatten)]
    log: LogArgs,
    /// V4L2 device path (first camera when omitted).
    #[arg(long)]
    device: Option<PathBuf>,
    /// Use synthetic color bars instead of a camera.
    #[arg(long, default_value_t = false)]
    pattern: bool,
    /// Requested capture width.
    #[arg(long, default_value_t = 640)]
    width: usize,
    /// Requested capture height.
    #[arg(long, default_value_t = 480)]
    height: usize,
    /// JPEG quality of submitted frames.
    #[arg(long, default_value_t = 80)]
    quality: u8,
    /// Directory the S key writes capture.png into.
    #[arg(long, default_value = ".")]
    snapshot_dir: PathBuf,
}

fn title(running: bool, detections: &[String], failures: u64) -> String {
    let state = if running { "live" } else { "stopped" };
    let summary = detections.first().map(String::as_str).unwrap_or("No detections");
    if failures > 0 {
        format!("WildSense [{}] {} (backend errors: {})", state, summary, failures)
    } else {
        format!("WildSense [{}] {}", state, summary)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.log.init()?;

    let size = Vec2::new(args.width, args.height);
    let config = if args.pattern {
        VideoInConfig::Pattern(PatternConfig {
            size,
            ..Default::default()
        })
    } else {
        VideoInConfig::V4l2(V4l2Config {
            path: args.device.clone(),
            size: Some(size),
            ..Default::default()
        })
    };

    log::info!("opening camera...");
    let camera = match VideoIn::open(Some(config)).await {
        Ok(camera) => camera,
        Err(error) if error.is_permission() => {
            log_fatal!("Unable to access camera. Please check permissions. ({})", error)
        }
        Err(error) => return Err(error.into()),
    };
    let camera_size = camera.size();

    let client = args.backend.client()?;
    log::info!("backend: {}", client.base_url());

    let (feed, mut shown) = window_feed();
    let mut live = LiveLoop::new(
        camera,
        client,
        feed,
        LiveConfig::default()
            .with_jpeg_quality(args.quality)
            .with_exchange_timeout(args.backend.timeout()),
    );

    let mut window = Window::new(
        "WildSense - SPACE start/stop, S snapshot, ESC exit",
        camera_size.x,
        camera_size.y,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(30);

    let mut buffer = vec![0u32; camera_size.area()];
    let mut buffer_size = camera_size;
    let mut detections = Vec::new();
    let mut current_title = String::new();

    live.start();
    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            if live.is_running() {
                live.stop();
            } else {
                live.start();
            }
        }
        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            match save_snapshot(live.last_frame().as_ref(), &args.snapshot_dir) {
                Ok(path) => log::info!("snapshot saved to {}", path.display()),
                Err(error) => log::warn!("snapshot failed: {}", error),
            }
        }

        if shown.has_changed().unwrap_or(false) {
            let latest = shown.borrow_and_update();
            if !latest.size.is_empty() {
                buffer.clone_from(&latest.pixels);
                buffer_size = latest.size;
            }
            detections.clone_from(&latest.detections);
        }

        let stats = live.stats();
        if stats.permission_denied {
            live.stop();
            log_fatal!(
                "Unable to access camera. Please check permissions. ({})",
                stats.last_error.unwrap_or_default()
            );
        }

        let next_title = title(live.is_running(), &detections, stats.consecutive_failures);
        if next_title != current_title {
            window.set_title(&next_title);
            current_title = next_title;
        }

        window.update_with_buffer(&buffer, buffer_size.x, buffer_size.y)?;
    }

    log::info!("exiting...");
    live.stop();
    live.join().await;
    let stats = live.stats();
    log::info!(
        "{} cycles, {} frames rendered, {} failures",
        stats.cycles,
        stats.rendered,
        stats.failures
    );
    Ok(())
}
