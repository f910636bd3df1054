use clap::Parser;
use seedream::{
    logger::{self, LogLevel, LoggerConfig},
    models::{MAX_SEED, RANDOM_SEED},
    CancellationToken, GenerationError, GenerationJobController, GenerationRequest, ImageTensor,
    ReplicateConfig, SeedControl, SeedState, SequentialMode, SizePreset,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Generate images with Seedream 4 on Replicate.
#[derive(Parser, Debug)]
#[command(name = "seedream", version, about)]
struct Args {
    /// What to generate.
    prompt: String,

    /// Replicate API token (starts with r8_).
    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    api_key: Option<String>,

    /// Size preset label, e.g. "2560x1440 (16:9)", or "Custom".
    #[arg(long, default_value = "2048x2048 (1:1)")]
    size: SizePreset,

    /// Width in pixels, only used with --size Custom.
    #[arg(long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(1024..=4096))]
    width: u32,

    /// Height in pixels, only used with --size Custom.
    #[arg(long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(1024..=4096))]
    height: u32,

    /// Upper bound on images when --sequential is auto.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=15))]
    max_images: u32,

    /// disabled: one image. auto: let the model decide how many.
    #[arg(long, default_value = "disabled")]
    sequential: SequentialMode,

    /// Seed, or -1 for random. Defaults to the suggestion in --seed-state,
    /// wrapped back into range.
    #[arg(
        long,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i64).range(RANDOM_SEED..=MAX_SEED)
    )]
    seed: Option<i64>,

    /// How to derive the next suggested seed: fixed, increment, decrement, randomize.
    #[arg(long, default_value = "fixed")]
    seed_control: SeedControl,

    /// Reference image; repeat for up to 10.
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Where generated PNGs are written.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// JSON file holding the suggested seed between runs.
    #[arg(long)]
    seed_state: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let args = Args::parse();

    let mut logger_config = if args.json_logs {
        LoggerConfig::production()
    } else if args.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default()
    };
    if args.verbose {
        logger_config = logger_config.with_level(LogLevel::Debug);
    }
    if let Some(path) = &args.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    let mut config = ReplicateConfig::from_env();
    if let Some(token) = &args.api_key {
        config = config.with_api_token(token.clone());
    }
    config.validate()?;
    logger::log_config_info(&config);

    let mut seeds = match &args.seed_state {
        Some(path) => load_seed_state(path),
        None => SeedState::new(),
    };
    let seed = args.seed.unwrap_or_else(|| seeds.suggested_seed());

    let reference_images = load_reference_images(&args.images)?;

    // Left empty here, the controller falls back to the configured token.
    let request = GenerationRequest::new(args.api_key.clone().unwrap_or_default(), &args.prompt)
        .with_preset(args.size)
        .with_max_images(args.max_images)
        .with_sequential_mode(args.sequential)
        .with_seed(seed, args.seed_control)
        .with_reference_images(reference_images);
    let request = if args.size == SizePreset::Custom {
        request.with_custom_size(args.width, args.height)
    } else {
        request
    };

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping generation");
            on_ctrl_c.cancel();
        }
    });

    let controller = GenerationJobController::from_config(&config);
    let result = controller.generate(&request, &mut seeds, &cancel).await;

    if let Some(path) = &args.seed_state {
        save_seed_state(path, &seeds);
    }

    let output = result?;
    log::info!(
        "🎨 Prediction {} returned {} image(s), seed {}",
        output.prediction_id,
        output.images.len(),
        output.seed
    );

    fs::create_dir_all(&args.output_dir)?;
    for (index, image) in output.images.iter().enumerate() {
        let path = args
            .output_dir
            .join(format!("seedream_{}_{}.png", output.prediction_id, index));
        image
            .to_dynamic()?
            .save(&path)
            .map_err(GenerationError::Encode)?;
        println!("{}", path.display());
    }

    log::info!("💡 Next suggested seed: {}", seeds.next_seed);
    Ok(())
}

fn load_reference_images(paths: &[PathBuf]) -> Result<Vec<ImageTensor>, GenerationError> {
    paths
        .iter()
        .map(|path| {
            log::debug!("Loading reference image {}", path.display());
            image::open(path)
                .map(|decoded| ImageTensor::from_dynamic(&decoded))
                .map_err(GenerationError::Decode)
        })
        .collect()
}

fn load_seed_state(path: &Path) -> SeedState {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable seed state {}: {}", path.display(), e);
            SeedState::new()
        }),
        Err(_) => SeedState::new(),
    }
}

fn save_seed_state(path: &Path, seeds: &SeedState) {
    let written = serde_json::to_string_pretty(seeds)
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(e) = written {
        log::warn!("Failed to save seed state to {}: {}", path.display(), e);
    }
}
