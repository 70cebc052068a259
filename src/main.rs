use clap::{Args, Parser, Subcommand};
use dialoguer::Select;
use humansize::{DECIMAL, format_size};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use wizdom_subs::{
    CancellationToken, Config, ConfiguredLibrary, DownloadRequest, SearchCriteria, SubtitleService,
    WizdomCatalog, WizdomError, place_subtitle, video_file_name,
};

type Service = SubtitleService<WizdomCatalog, ConfiguredLibrary>;

#[derive(Parser)]
#[command(name = "wizdom-subs")]
#[command(about = "Find and download Hebrew subtitles from Wizdom", long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List subtitles for a movie or episode, best match first
    Search {
        /// IMDb id of the movie or episode
        imdb: String,

        #[command(flatten)]
        media: MediaArgs,

        /// Media file the subtitle is meant for
        #[arg(long)]
        media_path: Option<PathBuf>,

        /// Filename to rank the results against
        #[arg(long)]
        filename: Option<String>,
    },

    /// Download the best matching subtitle next to a video
    Download {
        /// Video file to save the subtitle next to
        video: PathBuf,

        /// IMDb id of the movie or episode
        #[arg(long)]
        imdb: String,

        #[command(flatten)]
        media: MediaArgs,

        /// Replace an existing subtitle instead of numbering a new one
        #[arg(long)]
        overwrite: bool,

        /// Choose the subtitle from the list of matches
        #[arg(short, long)]
        interactive: bool,
    },

    /// Download a subtitle by the handle printed by `search`
    Fetch {
        /// Subtitle handle, e.g. srt-he-12345
        handle: String,

        /// File to write the subtitle to
        #[arg(short, long, conflicts_with = "next_to")]
        output: Option<PathBuf>,

        /// Save the subtitle next to this video
        #[arg(long)]
        next_to: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MediaArgs {
    /// Season number (episodes only)
    #[arg(long, requires = "episode")]
    season: Option<u32>,

    /// Episode number (episodes only)
    #[arg(long, requires = "season")]
    episode: Option<u32>,

    /// Series name, used to look up the series IMDb id
    #[arg(long)]
    series: Option<String>,

    /// Subtitle language
    #[arg(short, long)]
    language: Option<String>,
}

impl MediaArgs {
    fn criteria(&self, imdb: &str) -> SearchCriteria {
        let mut criteria = match (self.season, self.episode) {
            (Some(season), Some(episode)) => SearchCriteria::episode(imdb, season, episode),
            _ => SearchCriteria::movie(imdb),
        };
        criteria.series_name = self.series.clone();
        criteria.language = self.language.clone();
        criteria
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "wizdom_subs=debug"
    } else {
        "wizdom_subs=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config, WizdomError> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn build_service(config: Config) -> Result<Service, WizdomError> {
    let catalog = WizdomCatalog::new(&config)?;
    let library = ConfiguredLibrary::new(config.library.clone());
    Ok(SubtitleService::new(catalog, library, config))
}

fn search(
    service: &Service,
    criteria: &SearchCriteria,
    cancel: &CancellationToken,
) -> Result<(), WizdomError> {
    let candidates = service.search(criteria, cancel)?;

    if candidates.is_empty() {
        println!("No subtitles found.");
        return Ok(());
    }

    for (index, candidate) in candidates.iter().enumerate() {
        println!(
            "{:>3}. {}  [{}]",
            index + 1,
            candidate.display_name(),
            candidate.handle
        );
    }
    println!("\nFound {} subtitle(s)", candidates.len());

    Ok(())
}

fn download_interactive(
    service: &Service,
    request: &DownloadRequest,
    cancel: &CancellationToken,
) -> Result<Option<PathBuf>, WizdomError> {
    if !request.video_path.is_file() {
        return Err(WizdomError::VideoNotFound(request.video_path.clone()));
    }

    let candidates = service.search(&request.criteria, cancel)?;
    if candidates.is_empty() {
        return Err(WizdomError::NoCandidates(request.criteria.imdb_id.clone()));
    }

    let items: Vec<String> = candidates.iter().map(|c| c.display_name()).collect();
    let selection = Select::new()
        .with_prompt("Choose a subtitle")
        .items(&items)
        .default(0)
        .interact_opt();

    let index = match selection {
        Ok(Some(index)) => index,
        Ok(None) => return Ok(None),
        Err(e) => {
            return Err(WizdomError::Output {
                target: "terminal".to_string(),
                source: io::Error::other(e),
            });
        }
    };

    let candidate = &candidates[index];
    let payload = service.download_by_handle(&candidate.handle.to_string(), cancel)?;
    let overwrite = request
        .overwrite
        .unwrap_or(service.config().overwrite_existing);

    let path = place_subtitle(
        &request.video_path,
        &payload.content,
        &candidate.handle.language,
        overwrite,
    )?;
    Ok(Some(path))
}

fn fetch(
    service: &Service,
    handle: &str,
    output: Option<&Path>,
    next_to: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<(), WizdomError> {
    let payload = service.download_by_handle(handle, cancel)?;
    let size = format_size(payload.content.len() as u64, DECIMAL);

    if let Some(video) = next_to {
        if !video.is_file() {
            return Err(WizdomError::VideoNotFound(video.to_path_buf()));
        }
        let path = place_subtitle(
            video,
            &payload.content,
            &payload.language,
            service.config().overwrite_existing,
        )?;
        println!("Saved {} ({})", path.display(), size);
        return Ok(());
    }

    if let Some(output) = output {
        std::fs::write(output, &payload.content).map_err(|e| WizdomError::Output {
            target: output.display().to_string(),
            source: e,
        })?;
        println!("Saved {} ({})", output.display(), size);
        return Ok(());
    }

    write_all(io::stdout().lock(), &payload.content).map_err(|e| WizdomError::Output {
        target: "stdout".to_string(),
        source: e,
    })
}

fn write_all(mut writer: impl Write, content: &[u8]) -> io::Result<()> {
    writer.write_all(content)?;
    writer.flush()
}

fn run(cli: Cli) -> Result<(), WizdomError> {
    let config = load_config(cli.config.as_deref())?;
    let service = build_service(config)?;
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Search {
            imdb,
            media,
            media_path,
            filename,
        } => {
            let mut criteria = media.criteria(&imdb);
            criteria.reference_filename = filename
                .or_else(|| media_path.as_deref().and_then(video_file_name));
            criteria.media_path = media_path;
            search(&service, &criteria, &cancel)
        }
        Command::Download {
            video,
            imdb,
            media,
            overwrite,
            interactive,
        } => {
            let mut criteria = media.criteria(&imdb);
            criteria.media_path = Some(video.clone());
            criteria.reference_filename = video_file_name(&video);

            let request = DownloadRequest {
                criteria,
                video_path: video,
                overwrite: overwrite.then_some(true),
            };

            if interactive {
                match download_interactive(&service, &request, &cancel)? {
                    Some(path) => println!("Saved {}", path.display()),
                    None => println!("No subtitle selected."),
                }
                return Ok(());
            }

            let path = service.download_to_file(&request, &cancel)?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Command::Fetch {
            handle,
            output,
            next_to,
        } => fetch(
            &service,
            &handle,
            output.as_deref(),
            next_to.as_deref(),
            &cancel,
        ),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
