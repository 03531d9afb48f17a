use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use txt2img::{
    logger::{self, LogLevel, LoggerConfig},
    presenter, Config, GenerationRequest, Generator, DEFAULT_GUIDANCE_SCALE, DEFAULT_PROMPT,
    DEFAULT_STEPS, GUIDANCE_SCALE_RANGE, STEPS_RANGE,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Text-to-image via a hosted inference endpoint")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one image and write it as PNG
    Generate {
        #[arg(short, long, default_value = DEFAULT_PROMPT)]
        prompt: String,

        #[arg(short, long, default_value_t = DEFAULT_GUIDANCE_SCALE, value_parser = parse_guidance_scale)]
        guidance_scale: f32,

        #[arg(short, long, default_value_t = DEFAULT_STEPS,
              value_parser = clap::value_parser!(u32).range(*STEPS_RANGE.start() as i64..=*STEPS_RANGE.end() as i64))]
        steps: u32,

        #[arg(short, long, default_value = presenter::DOWNLOAD_FILE_NAME)]
        output: PathBuf,
    },
    /// Serve the web form
    #[cfg(feature = "server")]
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

fn parse_guidance_scale(raw: &str) -> Result<f32, String> {
    let value: f32 = raw.parse().map_err(|e| format!("{}", e))?;
    if GUIDANCE_SCALE_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "must be between {} and {}",
            GUIDANCE_SCALE_RANGE.start(),
            GUIDANCE_SCALE_RANGE.end()
        ))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let config = Config::from_env();

    let mut logger_config = LoggerConfig::from_app_config(&config);
    if cli.verbose {
        logger_config = logger_config.with_level(LogLevel::Debug);
    }
    if let Err(e) = logger::init_with_config(logger_config.clone()) {
        eprintln!("⚠️  {}; logging to stderr only", e);
        logger_config.log_to_file = false;
        if let Err(e) = logger::init_with_config(logger_config) {
            eprintln!("{}", e);
        }
    }

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> txt2img::Result<()> {
    let generator = Generator::hosted(&config)?;

    match command {
        Command::Generate {
            prompt,
            guidance_scale,
            steps,
            output,
        } => {
            let request = GenerationRequest::new(prompt, guidance_scale, steps);
            let artifact = generator.generate(&request).await?;
            presenter::save(&artifact, &output)?;
            println!("{}", output.display());
            Ok(())
        }
        #[cfg(feature = "server")]
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.host_or_default().to_string());
            let port = port.unwrap_or_else(|| config.port_or_default());
            logger::log_startup_info(
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                &host,
                port,
            );
            txt2img::server::run(&host, port, generator).await?;
            Ok(())
        }
    }
}
