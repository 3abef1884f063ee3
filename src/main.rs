//! bookpress - build an EPUB from a JSON book description

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookpress::{Authors, Chapter, Epub, EpubOptions, EpubVersion, FetchConfig};

#[derive(Parser)]
#[command(name = "bookpress")]
#[command(version, about = "Build EPUB books from HTML chapters", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookpress book.json book.epub           Build an EPUB 3 book
    bookpress --epub2 book.json book.epub   Build an EPUB 2 book")]
struct Cli {
    /// Book description (JSON: options plus a `content` array of chapters)
    #[arg(value_name = "BOOK")]
    book: PathBuf,

    /// Output EPUB file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Produce EPUB 2 instead of EPUB 3
    #[arg(long)]
    epub2: bool,

    /// Replace the built-in stylesheet with this file
    #[arg(long, value_name = "FILE")]
    css: Option<PathBuf>,

    /// Number of concurrent asset downloads
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Retries per remote asset
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Log build progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorField {
    One(String),
    Many(Vec<String>),
}

impl From<AuthorField> for Authors {
    fn from(field: AuthorField) -> Self {
        match field {
            AuthorField::One(name) => Authors::One(name),
            AuthorField::Many(names) => Authors::Many(names),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookFile {
    title: String,
    author: Option<AuthorField>,
    publisher: Option<String>,
    description: Option<String>,
    cover: Option<String>,
    version: Option<u8>,
    css: Option<String>,
    #[serde(default)]
    fonts: Vec<PathBuf>,
    lang: Option<String>,
    toc_title: Option<String>,
    append_chapter_titles: Option<bool>,
    date: Option<String>,
    custom_opf_template_path: Option<PathBuf>,
    custom_ncx_toc_template_path: Option<PathBuf>,
    custom_html_toc_template_path: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    default_image_src: Option<String>,
    content: Vec<ChapterFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterFile {
    title: Option<String>,
    author: Option<AuthorField>,
    data: String,
    #[serde(default)]
    exclude_from_toc: bool,
    #[serde(default)]
    before_toc: bool,
    filename: Option<String>,
    url: Option<String>,
}

impl From<ChapterFile> for Chapter {
    fn from(file: ChapterFile) -> Self {
        Chapter {
            title: file.title,
            author: file.author.map(Authors::from),
            data: file.data,
            exclude_from_toc: file.exclude_from_toc,
            before_toc: file.before_toc,
            filename: file.filename,
            url: file.url,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(path) => {
            info!(path = %path.display(), "epub written");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<PathBuf> {
    let text = fs::read_to_string(&cli.book)
        .with_context(|| format!("reading {}", cli.book.display()))?;
    let book: BookFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", cli.book.display()))?;

    let (mut options, chapters) = into_build(book)?;
    if cli.epub2 {
        options.version = EpubVersion::V2;
    }
    if let Some(css) = &cli.css {
        let text = fs::read_to_string(css)
            .with_context(|| format!("reading stylesheet {}", css.display()))?;
        options.css = Some(text);
    }
    if let Some(concurrency) = cli.concurrency {
        options.fetch.concurrency = concurrency;
    }
    if let Some(retries) = cli.retries {
        options.fetch.retries = retries;
    }
    options.verbose = cli.verbose;

    let path = Epub::new(options, chapters)
        .build(&cli.output)
        .with_context(|| format!("building {}", cli.output.display()))?;
    Ok(path)
}

fn into_build(book: BookFile) -> anyhow::Result<(EpubOptions, Vec<Chapter>)> {
    let version = match book.version {
        None | Some(3) => EpubVersion::V3,
        Some(2) => EpubVersion::V2,
        Some(other) => bail!("unsupported EPUB version {other}"),
    };

    let defaults = EpubOptions::default();
    let options = EpubOptions {
        title: book.title,
        author: book
            .author
            .map(|a| Authors::from(a).to_vec())
            .unwrap_or_default(),
        publisher: book.publisher.unwrap_or(defaults.publisher),
        description: book.description,
        cover: book.cover,
        version,
        css: book.css,
        fonts: book.fonts,
        lang: book.lang.unwrap_or(defaults.lang),
        toc_title: book.toc_title.unwrap_or(defaults.toc_title),
        append_chapter_titles: book
            .append_chapter_titles
            .unwrap_or(defaults.append_chapter_titles),
        date: book.date,
        custom_opf_template_path: book.custom_opf_template_path,
        custom_ncx_toc_template_path: book.custom_ncx_toc_template_path,
        custom_html_toc_template_path: book.custom_html_toc_template_path,
        temp_dir: book.temp_dir,
        default_image_src: book.default_image_src,
        verbose: false,
        fetch: FetchConfig::default(),
    };

    let chapters = book.content.into_iter().map(Chapter::from).collect();
    Ok((options, chapters))
}
