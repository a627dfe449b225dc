use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vitrine", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print each widget's decoded options as JSON.
    Decode(DecodeArgs),
    /// Build the scaled scene for a viewport and print it as JSON.
    Scene(SceneArgs),
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Input layout document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Input layout document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1920.0)]
    width: f64,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 1080.0)]
    height: f64,

    /// Fraction of the viewport the scaled layout may fill (< 1).
    #[arg(long, default_value_t = vitrine::SceneConfig::default().target_fill_ratio)]
    fill_ratio: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Decode(args) => cmd_decode(args),
        Command::Scene(args) => cmd_scene(args),
    }
}

fn read_layout_json(path: &Path) -> anyhow::Result<vitrine::LayoutDocument> {
    let f = File::open(path).with_context(|| format!("open layout '{}'", path.display()))?;
    let r = BufReader::new(f);
    let layout: vitrine::LayoutDocument =
        serde_json::from_reader(r).with_context(|| "parse layout JSON")?;
    Ok(layout)
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let layout = read_layout_json(&args.in_path)?;
    layout.validate()?;

    let mut out = serde_json::Map::new();
    for region in &layout.regions {
        for widget in &region.widgets {
            out.insert(
                widget.id.to_string(),
                serde_json::to_value(vitrine::decode(widget))?,
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_scene(args: SceneArgs) -> anyhow::Result<()> {
    let layout = read_layout_json(&args.in_path)?;

    let config = vitrine::SceneConfig {
        target_fill_ratio: args.fill_ratio,
    };
    let scene = vitrine::build_scene(
        &layout,
        vitrine::Viewport::new(args.width, args.height),
        &config,
    )?;

    println!("{}", serde_json::to_string_pretty(&scene)?);
    Ok(())
}
