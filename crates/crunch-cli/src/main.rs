mod cache;
mod driver;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::Parser;
use crunch_core::{AtlasConfig, Heuristic, StringFormat};
use tracing::debug;

use driver::BuildRequest;

#[derive(Parser, Debug)]
#[command(
    name = "crunch",
    about = "Pack PNG images into texture atlases",
    version
)]
struct Cli {
    /// Output path: parent is the output directory, filename is the atlas name
    output: PathBuf,
    /// Comma-separated list of input files and directories
    inputs: String,

    /// Use default settings (--xml --premultiply --trim --unique)
    #[arg(short = 'd', long)]
    default: bool,

    /// Save the atlas data as a .xml file
    #[arg(short = 'x', long)]
    xml: bool,
    /// Save the atlas data as a .json file
    #[arg(short = 'j', long)]
    json: bool,
    /// Save the atlas data as a .bin file
    #[arg(short = 'b', long)]
    binary: bool,

    /// Max atlas size (4096, 2048, 1024, 512, 256, 128 or 64)
    #[arg(short = 's', long, value_parser = parse_pack_size)]
    size: Option<u32>,
    /// Max atlas width (overrides --size)
    #[arg(short = 'w', long, value_parser = parse_pack_size)]
    width: Option<u32>,
    /// Max atlas height (overrides --size)
    #[arg(long, value_parser = parse_pack_size)]
    height: Option<u32>,
    /// Padding between images in pixels
    #[arg(long, alias = "pd", default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=16))]
    padding: u32,
    /// Stretch each image's edges by N pixels
    #[arg(long, alias = "st", default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=16))]
    stretch: u32,

    /// Premultiply pixel colors by their alpha channel
    #[arg(short = 'p', long)]
    premultiply: bool,
    /// Remove duplicate bitmaps from the atlas
    #[arg(short = 'u', long)]
    unique: bool,
    /// Trim excess transparency off the bitmaps
    #[arg(short = 't', long)]
    trim: bool,
    /// Allow rotating bitmaps 90 degrees clockwise when packing
    #[arg(short = 'r', long)]
    rotate: bool,
    /// Packing heuristic (bssf, blsf, baf, blr or cpr)
    #[arg(long, alias = "hr", default_value = "bssf")]
    heuristic: String,

    /// String type in the binary format (0: null-terminated, 16: int16-prefixed, 7: 7-bit-prefixed)
    #[arg(long, alias = "bs", default_value = "0")]
    binstr: String,
    /// Ignore the cached hash, forcing a repack
    #[arg(short = 'f', long)]
    force: bool,
    /// Print progress while the packer works
    #[arg(short = 'v', long)]
    verbose: bool,
    /// Hash input files by last write time instead of content
    #[arg(long = "time", alias = "tm")]
    time: bool,
    /// Build one atlas per top-level subdirectory
    #[arg(long = "split", alias = "sp")]
    split: bool,
    /// Drop the trailing 0 from single-page atlas filenames
    #[arg(long = "nozero", alias = "nz")]
    nozero: bool,
}

fn parse_pack_size(s: &str) -> Result<u32, String> {
    let v: u32 = s
        .parse()
        .map_err(|_| format!("invalid size: {s} (expected 4096, 2048, 1024, 512, 256, 128 or 64)"))?;
    if (64..=4096).contains(&v) && v.is_power_of_two() {
        Ok(v)
    } else {
        Err(format!(
            "invalid size: {s} (expected 4096, 2048, 1024, 512, 256, 128 or 64)"
        ))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help/--version land here too; only usage errors are failures
            let failure = e.use_stderr();
            let _ = e.print();
            std::process::exit(if failure { 1 } else { 0 });
        }
    };
    init_tracing(cli.verbose);

    // Fingerprint the raw argv tail before any interpretation so that any
    // change in how the tool was invoked forces a rebuild.
    let arg_hash = cache::hash_args(std::env::args().skip(1));

    let req = build_request(&cli)?;
    driver::build(&req, arg_hash)
}

fn build_request(cli: &Cli) -> anyhow::Result<BuildRequest> {
    let name = cli
        .output
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("invalid output path: {}", cli.output.display()))?;
    let out_dir = cli
        .output
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .to_path_buf();

    let inputs: Vec<PathBuf> = cli
        .inputs
        .split(',')
        .map(|s| PathBuf::from(s.replace('\\', "/")))
        .collect();

    let Ok(heuristic) = Heuristic::from_str(&cli.heuristic) else {
        bail!("invalid heuristic: {}", cli.heuristic);
    };
    let Ok(string_format) = StringFormat::from_str(&cli.binstr) else {
        bail!("invalid binary string format: {}", cli.binstr);
    };

    let size = cli.size.unwrap_or(4096);
    let config = AtlasConfig {
        max_width: cli.width.unwrap_or(size),
        max_height: cli.height.unwrap_or(size),
        padding: cli.padding,
        stretch: cli.stretch,
        premultiply: cli.premultiply || cli.default,
        unique: cli.unique || cli.default,
        trim: cli.trim || cli.default,
        rotate: cli.rotate,
        heuristic,
        string_format,
    };
    config.validate()?;

    let req = BuildRequest {
        out_dir,
        name,
        inputs,
        config,
        xml: cli.xml || cli.default,
        json: cli.json,
        binary: cli.binary,
        force: cli.force,
        use_time: cli.time,
        split: cli.split,
        no_zero: cli.nozero,
    };
    debug!(?req.config, xml = req.xml, json = req.json, binary = req.binary,
        force = req.force, time = req.use_time, split = req.split,
        nozero = req.no_zero, "resolved options");
    Ok(req)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
