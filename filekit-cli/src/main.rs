use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use filekit::archive::archive_bytes;
use filekit::compose::{images_to_pdf, text_to_pdf, TextLayout};
use filekit::docx::extract_paragraphs;
use filekit::format::{format_text, Language};
use filekit::media::{compression_flags, segment_flags, CompressionLevel, SegmentPlan, TargetFormat};
use filekit::pdf::{merge, parse_page_ranges, PageSpec, PdfFile, WatermarkOptions, WatermarkPosition};
use filekit::storage::{extension_of, sanitize_stem};
use filekit::{InvokerConfig, ToolInvoker};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "filekit-cli",
    about = "File conversion tools for local files",
    version,
    author
)]
struct Cli {
    /// Media tool executable used by convert, compress and chop
    #[arg(long, env = "FILEKIT_FFMPEG", default_value = "ffmpeg", global = true)]
    ffmpeg: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract page ranges; several ranges produce a ZIP
    Split {
        /// Input PDF file
        input: PathBuf,

        /// 1-based page ranges (e.g., "1-3, 5, 8-10")
        #[arg(short, long)]
        ranges: String,

        /// Output file path (.pdf for one range, .zip otherwise)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rotate individual pages, adding to their current rotation
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// PAGE=DEGREES with a 1-based page number, repeatable (e.g., "2=90")
        #[arg(short = 'p', long = "page", value_parser = parse_rotation, required = true)]
        rotations: Vec<(usize, i64)>,
    },

    /// Rebuild a PDF from an ordered list of pages
    Organize {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated 1-based pages with optional rotation (e.g., "3,1:90,1")
        #[arg(long)]
        order: String,
    },

    /// Merge PDFs in the given order
    Merge {
        /// Input PDF files
        #[arg(num_args = 2.., required = true)]
        files: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Stamp a text watermark on every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text
        #[arg(short, long)]
        text: String,

        /// Grid position (top-left ... bottom-right, center)
        #[arg(long, default_value = "center")]
        position: WatermarkPosition,

        #[arg(long, default_value_t = 48.0)]
        font_size: f32,

        #[arg(long, default_value_t = 0.3)]
        opacity: f32,
    },

    /// Combine images into a PDF, one page per image
    ImagesToPdf {
        /// Input images
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render the text of a .docx document as a PDF
    WordToPdf {
        /// Input .docx file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcode a media file
    Convert {
        /// Input media file
        input: PathBuf,

        /// Target format (mp4, webm, mp3, ...)
        #[arg(short, long)]
        format: TargetFormat,

        /// Output file path (defaults to the input name with the new extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-encode a media file at a lower bitrate
    Compress {
        /// Input media file
        input: PathBuf,

        /// Compression level: low, medium or high
        #[arg(short, long, default_value = "medium")]
        level: CompressionLevel,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cut a media file into segments of fixed length
    Chop {
        /// Input media file
        input: PathBuf,

        /// Segment length in minutes
        #[arg(short, long)]
        minutes: u32,

        /// Directory receiving the segments
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Pretty-print JSON, XML or SQL
    Format {
        /// Language of the input
        #[arg(short, long)]
        language: Language,

        /// Input file (reads stdin when omitted)
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            input,
            ranges,
            output,
        } => {
            let pdf = load_pdf(&input)?;
            let groups = parse_page_ranges(&ranges, pdf.page_count())?;
            debug!(?groups, "resolved page ranges");

            if let [group] = groups.as_slice() {
                write_output(&output, &pdf.extract_pages(group)?)?;
            } else {
                let stem = sanitize_stem(&file_name(&input));
                let mut parts = Vec::with_capacity(groups.len());
                for (n, group) in groups.iter().enumerate() {
                    parts.push((format!("{stem}_range{}.pdf", n + 1), pdf.extract_pages(group)?));
                }
                write_output(&output, &archive_bytes(&parts)?)?;
            }
            println!("Split {} range(s) into {}", groups.len(), output.display());
        }

        Commands::Rotate {
            input,
            output,
            rotations,
        } => {
            let pdf = load_pdf(&input)?;
            let mut by_index = BTreeMap::new();
            for (page, degrees) in rotations {
                by_index.insert(page - 1, degrees);
            }
            write_output(&output, &pdf.rotate(&by_index)?)?;
            println!("Rotated {} page(s)", by_index.len());
        }

        Commands::Organize {
            input,
            output,
            order,
        } => {
            let pdf = load_pdf(&input)?;
            let specs = parse_order(&order)?;
            write_output(&output, &pdf.assemble(&specs)?)?;
            println!("Organized {} page(s) into {}", specs.len(), output.display());
        }

        Commands::Merge { files, output } => {
            let pdfs = files
                .iter()
                .map(|path| load_pdf(path))
                .collect::<Result<Vec<_>>>()?;
            write_output(&output, &merge(pdfs)?)?;
            println!("Merged {} files into {}", files.len(), output.display());
        }

        Commands::Watermark {
            input,
            output,
            text,
            position,
            font_size,
            opacity,
        } => {
            let mut options = WatermarkOptions::new(text, position);
            options.font_size = font_size;
            options.opacity = opacity;
            options.validate()?;

            let pdf = load_pdf(&input)?;
            write_output(&output, &pdf.watermark(&options)?)?;
            println!("Watermarked {} page(s)", pdf.page_count());
        }

        Commands::ImagesToPdf { images, output } => {
            let buffers = images
                .iter()
                .map(|path| read_input(path))
                .collect::<Result<Vec<_>>>()?;
            write_output(&output, &images_to_pdf(&buffers)?)?;
            println!("Wrote {} page(s) to {}", images.len(), output.display());
        }

        Commands::WordToPdf { input, output } => {
            if extension_of(&file_name(&input)).as_deref() != Some("docx") {
                bail!("only .docx files are supported");
            }
            let paragraphs = extract_paragraphs(&read_input(&input)?)?;
            write_output(&output, &text_to_pdf(&paragraphs, TextLayout::default())?)?;
            println!("Converted {} paragraph(s) to {}", paragraphs.len(), output.display());
        }

        Commands::Convert {
            input,
            format,
            output,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(format.extension()));
            ensure_distinct(&input, &output)?;
            invoker(&cli.ffmpeg).run(&input, &output, &format.flags()).await?;
            println!("Converted to {}", output.display());
        }

        Commands::Compress {
            input,
            level,
            output,
        } => {
            let extension = extension_of(&file_name(&input)).unwrap_or_default();
            let (flags, out_extension) = compression_flags(level, &extension);
            let output = output.unwrap_or_else(|| {
                let stem = sanitize_stem(&file_name(&input));
                input.with_file_name(format!("{stem}_compressed.{out_extension}"))
            });
            ensure_distinct(&input, &output)?;
            invoker(&cli.ffmpeg).run(&input, &output, &flags).await?;
            println!("Compressed ({level}) to {}", output.display());
        }

        Commands::Chop {
            input,
            minutes,
            out_dir,
        } => {
            let flags = segment_flags(minutes)?;
            let name = file_name(&input);
            let extension = extension_of(&name).unwrap_or_else(|| "bin".to_string());
            let plan = SegmentPlan::new(&out_dir, &name, &extension);

            invoker(&cli.ffmpeg).run(&input, &plan.pattern(), &flags).await?;
            let segments = plan.collect_segments()?;
            if segments.is_empty() {
                bail!("the media tool produced no segments");
            }
            for segment in &segments {
                println!("{}", segment.display());
            }
        }

        Commands::Format { language, input } => {
            let text = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            println!("{}", format_text(language, &text)?);
        }
    }

    Ok(())
}

fn invoker(program: &Path) -> ToolInvoker {
    ToolInvoker::new(InvokerConfig {
        program: program.to_path_buf(),
        max_concurrent_jobs: 1,
        reject_when_saturated: false,
        timeout: None,
    })
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn load_pdf(path: &Path) -> Result<PdfFile> {
    let bytes = read_input(path)?;
    PdfFile::load(&bytes).with_context(|| format!("loading {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    if input == output {
        bail!("output {} would overwrite the input", output.display());
    }
    Ok(())
}

/// `PAGE=DEGREES`, page 1-based.
fn parse_rotation(value: &str) -> Result<(usize, i64), String> {
    let (page, degrees) = value
        .split_once('=')
        .ok_or_else(|| format!("expected PAGE=DEGREES, got '{value}'"))?;
    let page: usize = page
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number '{}'", page.trim()))?;
    if page == 0 {
        return Err("page numbers start at 1".to_string());
    }
    let degrees: i64 = degrees
        .trim()
        .parse()
        .map_err(|_| format!("invalid rotation '{}'", degrees.trim()))?;
    Ok((page, degrees))
}

/// `"3,1:90,1"` into page specs with 0-based indices.
fn parse_order(order: &str) -> Result<Vec<PageSpec>> {
    let mut specs = Vec::new();
    for token in order.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (page, rotation) = match token.split_once(':') {
            Some((page, rotation)) => (page, rotation.trim().parse::<i64>()?),
            None => (token, 0),
        };
        let page: usize = page.trim().parse().with_context(|| format!("invalid page '{token}'"))?;
        if page == 0 {
            bail!("page numbers start at 1");
        }
        specs.push(PageSpec::new(page - 1, rotation));
    }
    if specs.is_empty() {
        bail!("page order must not be empty");
    }
    Ok(specs)
}
