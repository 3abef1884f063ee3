use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bookpress::{Chapter, Epub, EpubOptions, EpubVersion, Error, ErrorKind, FetchConfig, build_epub};
use quick_xml::Reader;
use quick_xml::events::Event;
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive};

/// Options that keep failing downloads fast and the working tree observable.
fn options(title: &str, work: &Path) -> EpubOptions {
    EpubOptions::new(title)
        .with_author("Test Author")
        .with_date("2024-01-01T00:00:00.000Z")
        .with_temp_dir(work)
        .with_fetch_config(FetchConfig {
            retries: 0,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(2),
            ..FetchConfig::default()
        })
}

fn open(path: &Path) -> ZipArchive<File> {
    ZipArchive::new(File::open(path).unwrap()).unwrap()
}

fn entry_names(path: &Path) -> Vec<String> {
    let mut archive = open(path);
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn read_entry(path: &Path, name: &str) -> String {
    let mut archive = open(path);
    let mut entry = archive.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

fn assert_well_formed(name: &str, xml: &str) {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => panic!("{name} is not well-formed: {err}"),
        }
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

/// Collects formatted log output so tests can assert on it.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
    path
}

#[test]
fn test_build_epub3() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let output = tmp.path().join("out/book.epub");

    let chapters = vec![
        Chapter::titled("Chapter One", "<p>Hello <b>world</b></p>"),
        Chapter::titled("Chapter Two", "<section><p>Second</p></section>").with_author("Guest"),
    ];
    let path = build_epub(options("My Book", &work), chapters, &output).unwrap();
    assert_eq!(path, output);

    let names = entry_names(&output);
    assert_eq!(names[0], "mimetype");
    for expected in [
        "META-INF/container.xml",
        "OEBPS/style.css",
        "OEBPS/content.opf",
        "OEBPS/toc.ncx",
        "OEBPS/toc.xhtml",
        "OEBPS/0_chapter-one.xhtml",
        "OEBPS/1_chapter-two.xhtml",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    assert!(!names.iter().any(|n| n.contains("ibooks")));

    let mut archive = open(&output);
    assert_eq!(
        archive.by_index(0).unwrap().compression(),
        CompressionMethod::Stored
    );
    drop(archive);
    assert_eq!(read_entry(&output, "mimetype"), "application/epub+zip");

    for name in names.iter().filter(|n| n.ends_with(".xhtml") || n.ends_with(".opf") || n.ends_with(".ncx")) {
        assert_well_formed(name, &read_entry(&output, name));
    }

    let chapter = read_entry(&output, "OEBPS/1_chapter-two.xhtml");
    assert!(chapter.contains("<section><p>Second</p></section>"));
    assert!(chapter.contains("<p class=\"epub-author\">Guest</p>"));

    let opf = read_entry(&output, "OEBPS/content.opf");
    assert!(opf.contains("<dc:title>My Book</dc:title>"));
    assert!(opf.contains("<dc:date>2024-01-01T00:00:00.000Z</dc:date>"));

    assert!(is_empty_dir(&work));
}

#[test]
fn test_build_epub2_downgrades_markup() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("book.epub");

    let chapters = vec![Chapter::titled(
        "Legacy",
        "<article><figure><p>inside</p></figure></article>",
    )];
    let options = options("Old Book", &tmp.path().join("work")).with_version(EpubVersion::V2);
    build_epub(options, chapters, &output).unwrap();

    let names = entry_names(&output);
    assert!(names.iter().any(|n| n == "META-INF/com.apple.ibooks.display-options.xml"));

    let chapter = read_entry(&output, "OEBPS/0_legacy.xhtml");
    assert!(chapter.contains("<div><div><p>inside</p></div></div>"));
    assert!(chapter.contains("XHTML 1.1"));
    assert!(read_entry(&output, "OEBPS/content.opf").contains("version=\"2.0\""));
}

#[test]
fn test_shared_image_is_packaged_once() {
    let tmp = TempDir::new().unwrap();
    let image = png(tmp.path(), "shared image.png");
    let url = format!("file://{}", image.display()).replace(' ', "%20");
    let output = tmp.path().join("book.epub");

    let html = format!(r#"<p><img src="{url}"></p>"#);
    let chapters = vec![
        Chapter::titled("One", html.clone()),
        Chapter::titled("Two", html),
    ];
    build_epub(options("Images", &tmp.path().join("work")), chapters, &output).unwrap();

    let images: Vec<String> = entry_names(&output)
        .into_iter()
        .filter(|n| n.starts_with("OEBPS/images/"))
        .collect();
    assert_eq!(images.len(), 1);
    assert!(images[0].ends_with(".png"));

    let href = images[0].trim_start_matches("OEBPS/");
    let one = read_entry(&output, "OEBPS/0_one.xhtml");
    let two = read_entry(&output, "OEBPS/1_two.xhtml");
    assert!(one.contains(&format!("src=\"{href}\"")));
    assert!(two.contains(&format!("src=\"{href}\"")));
    assert!(read_entry(&output, "OEBPS/content.opf").contains(&format!("href=\"{href}\"")));
}

#[test]
fn test_unreachable_image_does_not_fail_build() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let output = tmp.path().join("book.epub");

    let chapters = vec![Chapter::titled(
        "Remote",
        r#"<p><img src="http://127.0.0.1:9/missing.png"></p>"#,
    )];

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        build_epub(options("Remote", &work), chapters, &output)
    })
    .unwrap();

    let names = entry_names(&output);
    assert!(!names.iter().any(|n| n.starts_with("OEBPS/images/")));
    assert!(is_empty_dir(&work));

    let logs = logs.contents();
    assert!(
        logs.contains("error while downloading image, skipping it"),
        "{logs}"
    );
    assert!(logs.contains("http://127.0.0.1:9/missing.png"), "{logs}");
    assert!(logs.contains("some images could not be fetched"), "{logs}");
}

#[test]
fn test_data_uri_stays_inline() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("book.epub");
    let src = "data:image/gif;base64,R0lGODlhAQABAAAAACw=";

    let chapters = vec![Chapter::titled("Inline", format!(r#"<img src="{src}">"#))];
    build_epub(options("Inline", &tmp.path().join("work")), chapters, &output).unwrap();

    assert!(read_entry(&output, "OEBPS/0_inline.xhtml").contains(src));
    assert!(!read_entry(&output, "OEBPS/content.opf").contains("image/gif"));
}

#[test]
fn test_local_cover_is_packaged() {
    let tmp = TempDir::new().unwrap();
    let cover = png(tmp.path(), "cover.png");
    let output = tmp.path().join("book.epub");

    let options = options("Covered", &tmp.path().join("work")).with_cover(cover.to_string_lossy());
    build_epub(options, vec![Chapter::titled("A", "<p>a</p>")], &output).unwrap();

    assert!(entry_names(&output).iter().any(|n| n == "OEBPS/cover.png"));
    let opf = read_entry(&output, "OEBPS/content.opf");
    assert!(opf.contains(r#"href="cover.png" media-type="image/png""#));
}

#[test]
fn test_unreachable_cover_fails_without_output() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let output = tmp.path().join("book.epub");

    let options = options("No Cover", &work).with_cover("http://127.0.0.1:9/cover.jpg");
    let err = build_epub(options, vec![Chapter::titled("A", "<p>a</p>")], &output).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AssetFetch);
    assert!(!output.exists());
    assert!(is_empty_dir(&work));
}

#[test]
fn test_cover_without_extension_is_packaged_as_octet_stream() {
    let tmp = TempDir::new().unwrap();
    let cover = tmp.path().join("cover");
    fs::write(&cover, b"\x89PNG\r\n\x1a\n").unwrap();
    let output = tmp.path().join("book.epub");

    let options = options("Cover", &tmp.path().join("work")).with_cover(cover.to_string_lossy());
    build_epub(options, vec![Chapter::new("<p>a</p>")], &output).unwrap();

    assert!(entry_names(&output).iter().any(|n| n == "OEBPS/cover.bin"));
    let opf = read_entry(&output, "OEBPS/content.opf");
    assert!(opf.contains(r#"href="cover.bin" media-type="application/octet-stream""#));
}

#[test]
fn test_empty_cover_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("book.epub");

    let options = options("Cover", &tmp.path().join("work")).with_cover("");
    build_epub(options, vec![Chapter::new("<p>a</p>")], &output).unwrap();

    assert!(!entry_names(&output).iter().any(|n| n.starts_with("OEBPS/cover")));
    assert!(!read_entry(&output, "OEBPS/content.opf").contains("image_cover"));
}

#[test]
fn test_validation_errors_touch_nothing() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let output = tmp.path().join("book.epub");

    let err = build_epub(options("", &work), vec![Chapter::new("<p>a</p>")], &output).unwrap_err();
    assert!(matches!(err, Error::MissingTitleOrContent));

    let err = build_epub(options("Empty", &work), Vec::new(), &output).unwrap_err();
    assert!(matches!(err, Error::MissingTitleOrContent));

    let err = build_epub(options("Book", &work), vec![Chapter::new("x")], "").unwrap_err();
    assert!(matches!(err, Error::MissingOutputPath));
    assert_eq!(err.kind(), ErrorKind::Config);

    assert!(!work.exists());
    assert!(!output.exists());
}

#[test]
fn test_missing_font_and_template() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let output = tmp.path().join("book.epub");
    let chapters = || vec![Chapter::titled("A", "<p>a</p>")];

    let options_font = options("Fonts", &work).with_font(tmp.path().join("missing.ttf"));
    let err = build_epub(options_font, chapters(), &output).unwrap_err();
    assert!(matches!(err, Error::FontNotFound { .. }));

    let mut options_template = options("Templates", &work);
    options_template.custom_ncx_toc_template_path = Some(tmp.path().join("missing.ncx"));
    let err = build_epub(options_template, chapters(), &output).unwrap_err();
    assert!(matches!(err, Error::TemplateNotFound { kind: "NCX toc", .. }));

    assert!(!output.exists());
    assert!(is_empty_dir(&work));
}

#[test]
fn test_fonts_and_custom_template() {
    let tmp = TempDir::new().unwrap();
    let font = tmp.path().join("Merriweather.ttf");
    fs::write(&font, b"font").unwrap();
    let template = tmp.path().join("toc.xhtml.tpl");
    fs::write(
        &template,
        "<?xml version=\"1.0\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"><body><h1>{{toc_title}}</h1><ol>{{toc_items}}</ol></body></html>",
    )
    .unwrap();
    let output = tmp.path().join("book.epub");

    let mut options = options("Custom", &tmp.path().join("work"))
        .with_font(&font)
        .with_toc_title("Contents");
    options.custom_html_toc_template_path = Some(template);

    let chapters = vec![
        Chapter::titled("Listed", "<p>a</p>"),
        Chapter::titled("Hidden", "<p>b</p>").excluded_from_toc(),
    ];
    Epub::new(options, chapters).build(&output).unwrap();

    assert!(entry_names(&output).iter().any(|n| n == "OEBPS/fonts/Merriweather.ttf"));
    assert!(read_entry(&output, "OEBPS/content.opf").contains("href=\"fonts/Merriweather.ttf\""));

    let toc = read_entry(&output, "OEBPS/toc.xhtml");
    assert!(toc.contains("<h1>Contents</h1>"));
    assert!(toc.contains("Listed"));
    assert!(!toc.contains("Hidden"));
    assert_well_formed("toc.xhtml", &toc);
}
