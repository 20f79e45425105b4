use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "liquitype", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the settings into a filter graph and print it as JSON.
    Compile(CompileArgs),
    /// Derive metaball anchors and print them (with animated positions) as JSON.
    Anchors(AnchorsArgs),
    /// Serialize the composed frame as an SVG document.
    Svg(SvgArgs),
    /// Rasterize the composed frame to a PNG.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input settings JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct AnchorsArgs {
    /// Input settings JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Animation clock time to evaluate positions at.
    #[arg(long, default_value_t = 0.0)]
    time: f64,
}

#[derive(Parser, Debug)]
struct SvgArgs {
    /// Input settings JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,

    /// Animation clock time.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input settings JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Animation clock time.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Pixel-density multiplier.
    #[arg(long, default_value_t = liquitype::export::DEFAULT_EXPORT_SCALE)]
    scale: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Anchors(args) => cmd_anchors(args),
        Command::Svg(args) => cmd_svg(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn read_settings_json(path: &Path) -> anyhow::Result<liquitype::TypeSettings> {
    let f = File::open(path).with_context(|| format!("open settings '{}'", path.display()))?;
    let r = BufReader::new(f);
    let settings: liquitype::TypeSettings =
        serde_json::from_reader(r).with_context(|| "parse settings JSON")?;
    settings.validate()?;
    Ok(settings)
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let settings = read_settings_json(&args.in_path)?;
    let graph = liquitype::compile(&settings);
    let json = if args.pretty {
        serde_json::to_string_pretty(&graph)?
    } else {
        serde_json::to_string(&graph)?
    };
    println!("{json}");
    Ok(())
}

fn cmd_anchors(args: AnchorsArgs) -> anyhow::Result<()> {
    let settings = read_settings_json(&args.in_path)?;
    let anchors = liquitype::derive_anchors(
        settings.num_metaballs,
        settings.metaball_spread,
        settings.noise_seed,
    );

    #[derive(serde::Serialize)]
    struct AnchorOut {
        #[serde(flatten)]
        anchor: liquitype::MetaballAnchor,
        x: f64,
        y: f64,
    }

    let out: Vec<AnchorOut> = anchors
        .iter()
        .map(|a| {
            let (x, y) = liquitype::animated_position(a, args.time);
            AnchorOut { anchor: *a, x, y }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_svg(args: SvgArgs) -> anyhow::Result<()> {
    let settings = read_settings_json(&args.in_path)?;
    let canvas = liquitype::Canvas {
        width: args.width,
        height: args.height,
    };
    let scene = liquitype::compose_frame(&settings, canvas, args.time)?;
    liquitype::export::export_svg(&scene, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let settings = read_settings_json(&args.in_path)?;
    let canvas = liquitype::Canvas {
        width: args.width,
        height: args.height,
    };
    let scene = liquitype::compose_frame(&settings, canvas, args.time)?;
    liquitype::export::export_png(&scene, args.scale, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
