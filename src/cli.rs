use crate::config::load_config;
use crate::coords::{parse_latitude, parse_longitude};
use crate::error::PosterError;
use crate::geocode::{NominatimGeocoder, resolve_coordinates};
use crate::model::{LatLon, PosterSpec};
use crate::osm::OverpassClient;
use crate::poster::{
    DisplayNames, Orientation, PaperPreset, Session, clamp_dimensions, resolve_location,
};
use crate::render::OutputFormat;
use crate::theme::{DEFAULT_THEME, ThemeStore};
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tracing::info;

const EXAMPLES: &str = "\
Examples:
  maptoposter -c \"New York\" -C USA -t noir -d 4000
  maptoposter -c Paris -C France -t pastel_dream -d 3500 -f svg
  maptoposter -c Tokyo -C Japan --display-city 東京 --display-country 日本 --font-family \"Noto Sans JP\"
  maptoposter -c Venice -C Italy --latitude \"45°26'15\\\"N\" --longitude \"12°20'9\\\"E\" -d 1500
  maptoposter -c London -C UK --preset a3 --orientation landscape
  maptoposter -c Amsterdam -C Netherlands --all-themes
  maptoposter --list-themes

Distance guide (-d is the half-width of the longer poster side):
  1500-2000 m     small, dense centers
  3000-4000 m     medium cities, downtown focus
  5000-7000 m     large metros, full city view
  18000 m         default, a whole region
";

#[derive(Parser, Debug)]
#[command(
    name = "maptoposter",
    version,
    about = "Generate minimalist city map posters from OpenStreetMap data",
    after_help = EXAMPLES
)]
pub struct Args {
    /// City name, used for geocoding and the poster title
    #[arg(short = 'c', long = "city")]
    pub city: Option<String>,

    /// Country name, used for geocoding and the poster subtitle
    #[arg(short = 'C', long = "country")]
    pub country: Option<String>,

    /// Override the center latitude (decimal or DMS)
    #[arg(long = "latitude", allow_hyphen_values = true, requires = "longitude")]
    pub latitude: Option<String>,

    /// Override the center longitude (decimal or DMS)
    #[arg(long = "longitude", allow_hyphen_values = true, requires = "latitude")]
    pub longitude: Option<String>,

    /// Country text drawn on the poster
    #[arg(long = "country-label")]
    pub country_label: Option<String>,

    /// City name drawn on the poster, e.g. in another script
    #[arg(long = "display-city")]
    pub display_city: Option<String>,

    /// Country name drawn on the poster, e.g. in another script
    #[arg(long = "display-country")]
    pub display_country: Option<String>,

    /// Theme name
    #[arg(short = 't', long = "theme", default_value = DEFAULT_THEME)]
    pub theme: String,

    /// Generate one poster per available theme
    #[arg(long = "all-themes", alias = "All-themes")]
    pub all_themes: bool,

    /// Visible radius in meters, measured along the longer poster side
    #[arg(
        short = 'd',
        long = "distance",
        default_value_t = 18000,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub distance: u32,

    /// Poster width in inches (max 20)
    #[arg(short = 'W', long = "width", default_value_t = 12.0)]
    pub width: f32,

    /// Poster height in inches (max 20)
    #[arg(short = 'H', long = "height", default_value_t = 16.0)]
    pub height: f32,

    /// Paper size; replaces --width and --height
    #[arg(long = "preset", value_enum)]
    pub preset: Option<PaperPreset>,

    /// Turns the preset to portrait or landscape
    #[arg(long = "orientation", value_enum, requires = "preset")]
    pub orientation: Option<Orientation>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "png")]
    pub format: OutputFormat,

    /// Font family for the typography (default Roboto)
    #[arg(long = "font-family")]
    pub font_family: Option<String>,

    /// List available themes and exit
    #[arg(long = "list-themes")]
    pub list_themes: bool,

    /// Config JSON file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Directory posters are written to
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

impl Args {
    /// Requested poster size in inches, before clamping.
    pub fn dimensions(&self) -> (f32, f32) {
        match self.preset {
            Some(preset) => preset.oriented(self.orientation),
            None => (self.width, self.height),
        }
    }

    pub fn display_names(&self) -> DisplayNames {
        DisplayNames {
            city: self.display_city.clone(),
            country: self.display_country.clone(),
            country_label: self.country_label.clone(),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<()> {
    if std::env::args_os().len() <= 1 {
        Args::command().print_long_help()?;
        return Ok(());
    }
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        config.paths.posters_dir = dir.clone();
    }

    let store = ThemeStore::new(config.paths.themes_dir.clone());
    if args.list_themes {
        return list_themes(&store);
    }

    let (Some(city), Some(country)) = (args.city.as_deref(), args.country.as_deref()) else {
        bail!("--city and --country are required (see --help)");
    };

    let available = store.available()?;
    if available.is_empty() {
        bail!("no themes found in {}", store.dir().display());
    }
    let themes = if args.all_themes {
        available
    } else {
        if !store.contains(&args.theme) {
            return Err(PosterError::ThemeNotFound(args.theme.clone()))
                .with_context(|| format!("available themes: {}", available.join(", ")));
        }
        vec![args.theme.clone()]
    };

    let (width, height) = args.dimensions();
    let (width, height) = clamp_dimensions(width, height, config.render.max_dimension);
    let mut session = Session::new(config, args.font_family.as_deref());

    let point = match (&args.latitude, &args.longitude) {
        (Some(lat), Some(lon)) => {
            let point = LatLon::new(parse_latitude(lat)?, parse_longitude(lon)?);
            info!("using coordinates {}, {}", point.lat, point.lon);
            point
        }
        _ => {
            let geocoder = NominatimGeocoder::new(&session.config().network)?;
            resolve_coordinates(&geocoder, session.cache(), city, country)?
        }
    };
    let location = resolve_location(point, city, country, &args.display_names());

    let source = OverpassClient::new(&session.config().network)?;
    let data = session
        .fetch(&source, point, args.distance)
        .with_context(|| format!("fetching map data for {city}, {country}"))?;

    for theme in themes {
        let spec = PosterSpec {
            location: location.clone(),
            radius_m: args.distance,
            width,
            height,
            theme,
            format: args.format,
            gradient_height: session.config().render.gradient_height,
        };
        let output = session.output_path(city, &spec, chrono::Local::now().naive_local());
        session
            .render(&spec, &data, &output)
            .with_context(|| format!("rendering theme '{}'", spec.theme))?;
        println!("{}", output.display());
    }
    info!("poster generation complete");
    Ok(())
}

fn list_themes(store: &ThemeStore) -> Result<()> {
    let summaries = store.summaries()?;
    if summaries.is_empty() {
        println!("No themes found in {}", store.dir().display());
        return Ok(());
    }
    println!("Available themes:");
    for summary in summaries {
        println!("  {}", summary.id);
        println!("    {}", summary.display_name);
        if !summary.description.is_empty() {
            println!("    {}", summary.description);
        }
    }
    Ok(())
}
