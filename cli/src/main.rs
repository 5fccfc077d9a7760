//! sigstamp CLI - stamp signatures and date labels onto PDF drawing sheets

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use sigstamp::{find_marker, page_info, raster, stamp_file_with_options, StampMode, StampOptions};

#[derive(Parser)]
#[command(name = "sigstamp")]
#[command(version)]
#[command(about = "Stamp a signature and date label onto PDF drawing sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp a document at the marker-anchored position
    Stamp {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file (defaults to <input>_signed.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Marker text that anchors the stamp
        #[arg(short, long, default_value = "设计")]
        marker: String,

        /// Placement mode
        #[arg(long, value_enum, default_value = "image")]
        mode: Mode,

        /// Raster signature image (required for the image modes)
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Vector signature graphic (required for the vector mode)
        #[arg(long, value_name = "FILE")]
        svg: Option<PathBuf>,

        /// Stamp width in points
        #[arg(long, default_value = "50")]
        width: f32,

        /// Stamp height in points
        #[arg(long, default_value = "30")]
        height: f32,

        /// Horizontal offset from the anchor box origin
        #[arg(long, default_value = "30")]
        offset_x: f32,

        /// Vertical offset from the anchor box top (text mode)
        #[arg(long, default_value = "0")]
        offset_y: f32,

        /// Target page, 1-indexed (default: page of the first match)
        #[arg(long)]
        page: Option<usize>,

        /// Label date as YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Literal label text, replacing the date
        #[arg(long)]
        label: Option<String>,

        /// Fallback position "x,y" (document convention) when the marker
        /// is absent; without it an absent marker is an error
        #[arg(long, value_parser = parse_point, value_name = "X,Y")]
        fallback: Option<(f32, f32)>,

        /// Label font size in points
        #[arg(long, default_value = "24")]
        font_size: f32,

        /// Print the stamp report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every occurrence of a marker with its bounding box
    Find {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Marker text to search for
        #[arg(short, long, default_value = "设计")]
        marker: String,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a page's dimensions and sheet category
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page number, 1-indexed
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Resize a signature image for stamping
    Prepare {
        /// Input image file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output image file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Target width in pixels
        #[arg(long, default_value = "50")]
        width: u32,

        /// Target height in pixels
        #[arg(long, default_value = "30")]
        height: u32,

        /// JPEG quality (1-100)
        #[arg(long, default_value = "95")]
        quality: u8,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Date label only
    Text,
    /// Signature image with the date label inline after it
    Image,
    /// Signature image, vector graphic, and date label
    ImageVector,
}

impl From<Mode> for StampMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Text => StampMode::TextOnly,
            Mode::Image => StampMode::ImageThenText,
            Mode::ImageVector => StampMode::ImageWithVectorOverlay,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x = x.trim().parse().map_err(|_| format!("invalid x '{x}'"))?;
    let y = y.trim().parse().map_err(|_| format!("invalid y '{y}'"))?;
    Ok((x, y))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stamp {
            input,
            output,
            marker,
            mode,
            image,
            svg,
            width,
            height,
            offset_x,
            offset_y,
            page,
            date,
            label,
            fallback,
            font_size,
            json,
        } => cmd_stamp(StampArgs {
            input,
            output,
            marker,
            mode,
            image,
            svg,
            width,
            height,
            offset_x,
            offset_y,
            page,
            date,
            label,
            fallback,
            font_size,
            json,
        }),
        Commands::Find {
            input,
            marker,
            json,
        } => cmd_find(&input, &marker, json),
        Commands::Info { input, page } => cmd_info(&input, page),
        Commands::Prepare {
            input,
            output,
            width,
            height,
            quality,
        } => cmd_prepare(&input, &output, width, height, quality),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

struct StampArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    marker: String,
    mode: Mode,
    image: Option<PathBuf>,
    svg: Option<PathBuf>,
    width: f32,
    height: f32,
    offset_x: f32,
    offset_y: f32,
    page: Option<usize>,
    date: Option<NaiveDate>,
    label: Option<String>,
    fallback: Option<(f32, f32)>,
    font_size: f32,
    json: bool,
}

fn cmd_stamp(args: StampArgs) -> Result<(), Box<dyn std::error::Error>> {
    let output = args.output.unwrap_or_else(|| {
        let stem = args.input.file_stem().unwrap_or_default().to_string_lossy();
        args.input.with_file_name(format!("{stem}_signed.pdf"))
    });

    let mut options = StampOptions::new()
        .with_marker(args.marker)
        .with_mode(args.mode.into())
        .with_size(args.width, args.height)
        .with_offsets(args.offset_x, args.offset_y)
        .with_font_size(args.font_size);

    if let Some(path) = args.image {
        options = options.with_image(path);
    }
    if let Some(path) = args.svg {
        options = options.with_vector(path);
    }
    if let Some(page) = args.page {
        let index = page
            .checked_sub(1)
            .ok_or("page numbers are 1-indexed")?;
        options = options.with_page(index);
    }
    if let Some(date) = args.date {
        options = options.with_date(date);
    }
    if let Some(label) = args.label {
        options = options.with_label(label);
    }
    if let Some((x, y)) = args.fallback {
        options = options.with_fallback(x, y);
    }

    println!("[1/2] Stamping {}...", args.input.display());
    let report = stamp_file_with_options(&args.input, &output, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.anchor {
        Some(anchor) => println!(
            "  Anchored at ({:.1}, {:.1}) on page {}",
            anchor.bbox.x0,
            anchor.bbox.y0,
            anchor.page_index + 1
        ),
        None => println!("  {}", "Marker absent, fallback position used".yellow()),
    }
    println!(
        "  Page {} ({}), label {}",
        report.page_index + 1,
        report.category,
        report.label
    );
    println!("[2/2] Saved {}", output.display().to_string().green());
    Ok(())
}

fn cmd_find(input: &Path, marker: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let matches = find_marker(input, marker)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("{}", format!("No match for '{marker}'").yellow());
        return Ok(());
    }
    for m in &matches {
        println!(
            "Page {}: '{}' at ({:.1}, {:.1}, {:.1}, {:.1})",
            m.page_index + 1,
            m.text,
            m.bbox.x0,
            m.bbox.y0,
            m.bbox.x1,
            m.bbox.y1
        );
    }
    Ok(())
}

fn cmd_info(input: &Path, page: usize) -> Result<(), Box<dyn std::error::Error>> {
    let index = page.checked_sub(1).ok_or("page numbers are 1-indexed")?;
    let (dims, category) = page_info(input, index)?;

    println!("File:     {}", input.display());
    println!("Page:     {page}");
    println!("Size:     {:.0} x {:.0} pt", dims.width, dims.height);
    println!("Category: {}", category.to_string().cyan());
    Ok(())
}

fn cmd_prepare(
    input: &Path,
    output: &Path,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    raster::write_resized(input, output, width, height, quality)?;
    println!(
        "Resized {} to {}x{} at {}",
        input.display(),
        width,
        height,
        output.display().to_string().green()
    );
    Ok(())
}
