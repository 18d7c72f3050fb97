use {
    anyhow::{Result, anyhow, bail},
    base::{Vec2, log, log_fatal},
    clap::Parser,
    live::format_confidence,
    std::path::PathBuf,
    video::{V4l2Config, VideoIn, VideoInConfig},
    wildsense::{
        cli::{BackendArgs, LogArgs},
        photo_mime,
    },
};

#[derive(Parser, Debug)]
#[command(
    name = "identify",
    about = "Identify the animal in a photo with WildSense"
)]
struct Args {
    #[command(flatten)]
    backend: BackendArgs,
    #[command(flatten)]
    log: LogArgs,
    /// Photo to identify (JPEG, PNG, WebP or BMP).
    #[arg(required_unless_present = "camera")]
    photo: Option<PathBuf>,
    /// Take the photo with the camera instead.
    #[arg(long, default_value_t = false, conflicts_with = "photo")]
    camera: bool,
}

async fn take_photo() -> Result<Vec<u8>> {
    let config = VideoInConfig::V4l2(V4l2Config {
        size: Some(Vec2::new(640, 480)),
        ..Default::default()
    });
    let mut camera = match VideoIn::open(Some(config)).await {
        Ok(camera) => camera,
        Err(error) if error.is_permission() => log_fatal!(
            "Unable to access camera. Please check permissions or try a photo file instead. ({})",
            error
        ),
        Err(error) => return Err(error.into()),
    };
    let frame = camera.capture().await?;
    Ok(image::encode_jpeg(frame.color, 90).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.log.init()?;
    let client = args.backend.client()?;

    let (mime, photo) = match &args.photo {
        Some(path) => {
            let mime = photo_mime(path)
                .ok_or_else(|| anyhow!("{} is not a supported image", path.display()))?;
            (mime, tokio::fs::read(path).await?)
        }
        None => (image::JPEG_MIME, take_photo().await?),
    };
    if photo.is_empty() {
        bail!("photo is empty");
    }
    log::info!("identifying {} byte {} photo", photo.len(), mime);

    let identification = client.identify_wildlife(mime, &photo).await?;
    if identification.is_fallback() {
        log::warn!("backend could not identify the animal");
    }
    println!("Species: {}", identification.species);
    println!(
        "Confidence: {}",
        format_confidence(identification.confidence, 2)
    );
    println!("Information:");
    for fact in identification.facts() {
        println!("  {}", fact);
    }
    Ok(())
}
