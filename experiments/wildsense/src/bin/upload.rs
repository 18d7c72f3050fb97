use {
    anyhow::Result,
    base::log,
    clap::Parser,
    futures_util::StreamExt,
    live::describe_detection,
    std::{path::PathBuf, pin::pin},
    wildsense::cli::{BackendArgs, LogArgs},
};

#[derive(Parser, Debug)]
#[command(
    name = "upload",
    about = "Upload a video to WildSense and follow its processing"
)]
struct Args {
    #[command(flatten)]
    backend: BackendArgs,
    #[command(flatten)]
    log: LogArgs,
    /// Video file to analyze.
    video: PathBuf,
    /// Save the detection clip here once processing completes.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.log.init()?;
    let client = args.backend.client()?;

    let session = client.upload_video(&args.video).await?;
    println!("Session: {}", session);

    let events = client.detection_stream(&session).await?;
    let mut events = pin!(events.into_stream());
    let mut last_progress = None;
    let mut last_labels: Vec<String> = Vec::new();
    let mut completed = None;
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(error) => {
                log::warn!("detection stream: {}", error);
                continue;
            }
        };
        if let Some(progress) = event.progress {
            let progress = progress.round() as u32;
            if last_progress != Some(progress) {
                println!("Processing: {}%", progress);
                last_progress = Some(progress);
            }
        }
        if let Some(detections) = &event.detections {
            let labels: Vec<String> = detections.iter().map(|d| d.label.clone()).collect();
            if !detections.is_empty() && labels != last_labels {
                for detection in detections {
                    println!("  {}", describe_detection(detection));
                }
            }
            last_labels = labels;
        }
        if event.is_completed() {
            completed = Some(event);
        }
    }

    let Some(completed) = completed else {
        log::warn!("stream ended before processing completed");
        return Ok(());
    };
    match completed.top_species.as_deref() {
        Some(species) if !species.is_empty() => {
            println!("Top detected species: {}", species.join(", "))
        }
        _ => println!("Top detected species: No clear detections"),
    }

    match (&completed.video_url, &args.output) {
        (Some(url), Some(output)) => {
            let written = client.download(url, output).await?;
            println!("Clip saved to {} ({} bytes)", output.display(), written);
        }
        (Some(url), None) => println!("Clip: {}", client.url(url)),
        (None, Some(_)) => log::warn!("backend did not provide a clip"),
        (None, None) => {}
    }

    match client.video_details(&session).await {
        Ok(details) => {
            println!(
                "Status: {}",
                details.status.as_deref().unwrap_or("unknown")
            );
            let classes = details.detected_classes();
            if !classes.is_empty() {
                println!("Detected classes: {}", classes.join(", "));
            }
        }
        Err(error) => log::warn!("no video details for {}: {}", session, error),
    }
    Ok(())
}
