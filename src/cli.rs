use crate::config::{SankeyConfig, load_config};
use crate::dataset::{parse_pair_table, parse_weighted_table};
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_svg, write_layout_json, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flowband", version, about = "Sankey diagram renderer for paired category data")]
pub struct Args {
    /// Input file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Input format
    #[arg(short = 'f', long = "format", value_enum, default_value = "pairs")]
    pub format: InputFormat,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme and layout options)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Column holding left labels (table format)
    #[arg(long = "leftCol", default_value = "left")]
    pub left_col: String,

    /// Column holding right labels (table format)
    #[arg(long = "rightCol", default_value = "right")]
    pub right_col: String,

    /// Column holding row weights (table format)
    #[arg(long = "weightCol", default_value = "weight")]
    pub weight_col: String,

    /// Vertical extent relative to horizontal extent
    #[arg(long = "aspect")]
    pub aspect: Option<f32>,

    /// Label font size
    #[arg(long = "fontSize")]
    pub font_size: Option<f32>,

    /// Separate stacked blocks with a 2% gap
    #[arg(long = "classic")]
    pub classic: bool,

    /// Write the computed layout as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum InputFormat {
    Pairs,
    Table,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;
    if args.classic {
        config.sankey.gap_fraction = SankeyConfig::classic().gap_fraction;
    }
    if let Some(aspect) = args.aspect {
        config.sankey.aspect = aspect;
    }
    if let Some(font_size) = args.font_size {
        config.theme.font_size = font_size;
    }

    let input = read_input(args.input.as_deref())?;
    let sankey = match args.format {
        InputFormat::Pairs => parse_pair_table(&input)?,
        InputFormat::Table => {
            parse_weighted_table(&input, &args.left_col, &args.right_col, &args.weight_col)?
        }
    };

    let layout = sankey.layout(&config.theme, &config.sankey)?;
    if let Some(dump) = args.dump_layout.as_deref() {
        write_layout_json(&layout, dump)?;
    }

    let svg = render_svg(&layout, &config.theme);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            #[cfg(feature = "png")]
            write_output_png(&svg, &output, &config.render, &config.theme)?;
            #[cfg(not(feature = "png"))]
            {
                let _ = output;
                anyhow::bail!("PNG output requires the `png` feature");
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
