//! Stock content.opf, toc.ncx and toc.xhtml for EPUB 2 and 3.

use quick_xml::escape::escape;

use super::RenderContext;
use crate::media::font_media_type;

/// Generate content.opf.
pub(super) fn content_opf(ctx: &RenderContext<'_>) -> String {
    let options = ctx.options;
    let legacy = options.version.is_legacy();
    let mut opf = String::new();

    if legacy {
        opf.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:identifier id="BookId" opf:scheme="UUID">urn:uuid:{}</dc:identifier>
"#,
            escape(ctx.id)
        ));
    } else {
        opf.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId" xml:lang="{}">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="BookId">urn:uuid:{}</dc:identifier>
"#,
            escape(&options.lang),
            escape(ctx.id)
        ));
    }

    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape(&options.title)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape(&options.lang)
    ));
    opf.push_str(&format!("    <dc:date>{}</dc:date>\n", escape(ctx.date)));
    opf.push_str(&format!(
        "    <dc:description>{}</dc:description>\n",
        escape(options.description())
    ));

    for (i, author) in options.authors().iter().enumerate() {
        if legacy {
            opf.push_str(&format!(
                "    <dc:creator opf:role=\"aut\" opf:file-as=\"{0}\">{0}</dc:creator>\n",
                escape(author)
            ));
        } else {
            opf.push_str(&format!(
                "    <dc:creator id=\"creator{i}\">{}</dc:creator>\n",
                escape(author)
            ));
            opf.push_str(&format!(
                "    <meta refines=\"#creator{i}\" property=\"role\" scheme=\"marc:relators\">aut</meta>\n"
            ));
        }
    }

    opf.push_str(&format!(
        "    <dc:publisher>{}</dc:publisher>\n",
        escape(&options.publisher)
    ));
    if !legacy {
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{}</meta>\n",
            escape(ctx.modified)
        ));
    }
    if ctx.cover.is_some() {
        opf.push_str("    <meta name=\"cover\" content=\"image_cover\"/>\n");
    }
    opf.push_str("    <meta name=\"generator\" content=\"bookpress\"/>\n");
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    opf.push_str(&manifest_items(ctx));
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    opf.push_str(&spine_items(ctx));
    opf.push_str("  </spine>\n");

    if legacy {
        opf.push_str(&format!(
            "  <guide>\n    <reference type=\"toc\" title=\"{}\" href=\"toc.xhtml\"/>\n  </guide>\n",
            escape(&options.toc_title)
        ));
    }

    opf.push_str("</package>\n");
    opf
}

/// `<item>` lines for every file under `OEBPS/`.
pub(super) fn manifest_items(ctx: &RenderContext<'_>) -> String {
    let legacy = ctx.options.version.is_legacy();
    let mut items = String::new();

    items.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    if legacy {
        items.push_str(
            "    <item id=\"toc\" href=\"toc.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
        );
    } else {
        items.push_str(
            "    <item id=\"toc\" href=\"toc.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        );
    }
    items.push_str("    <item id=\"css\" href=\"style.css\" media-type=\"text/css\"/>\n");

    if let Some(cover) = ctx.cover {
        let properties = if legacy { "" } else { " properties=\"cover-image\"" };
        items.push_str(&format!(
            "    <item id=\"image_cover\" href=\"{}\" media-type=\"{}\"{properties}/>\n",
            escape(&cover.href()),
            escape(&cover.media_type)
        ));
    }

    for (i, image) in ctx.images.iter().enumerate() {
        items.push_str(&format!(
            "    <item id=\"image_{i}\" href=\"{}\" media-type=\"{}\"/>\n",
            escape(&image.href()),
            escape(&image.media_type)
        ));
    }

    for (i, font) in ctx.fonts.iter().enumerate() {
        items.push_str(&format!(
            "    <item id=\"font_{i}\" href=\"fonts/{}\" media-type=\"{}\"/>\n",
            escape(font),
            font_media_type(font)
        ));
    }

    for chapter in ctx.content {
        items.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            escape(&chapter.id),
            escape(&chapter.href)
        ));
    }

    items
}

/// `<itemref>` lines: `before_toc` chapters, the ToC page, then the rest.
pub(super) fn spine_items(ctx: &RenderContext<'_>) -> String {
    let mut spine = String::new();
    let itemref = |spine: &mut String, id: &str| {
        spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape(id)));
    };

    for chapter in ctx.content.iter().filter(|c| c.before_toc) {
        itemref(&mut spine, &chapter.id);
    }
    itemref(&mut spine, "toc");
    for chapter in ctx.content.iter().filter(|c| !c.before_toc) {
        itemref(&mut spine, &chapter.id);
    }
    spine
}

/// Generate toc.ncx.
pub(super) fn toc_ncx(ctx: &RenderContext<'_>) -> String {
    let options = ctx.options;
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="urn:uuid:"#,
    );
    ncx.push_str(&escape(ctx.id));
    ncx.push_str(
        r#""/>
    <meta name="dtb:generator" content="bookpress"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape(&options.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <docAuthor>
    <text>"#,
    );
    ncx.push_str(&escape(&options.authors().join(", ")));
    ncx.push_str(
        r#"</text>
  </docAuthor>
  <navMap>
"#,
    );
    ncx.push_str(&nav_points(ctx));
    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// `<navPoint>` elements in reading order, the ToC page included.
pub(super) fn nav_points(ctx: &RenderContext<'_>) -> String {
    let entries = ctx.toc_entries();
    let mut ncx = String::new();
    let mut play_order = 1;

    let mut push = |ncx: &mut String, id: &str, title: &str, src: &str| {
        ncx.push_str(&format!(
            "    <navPoint id=\"{}\" playOrder=\"{play_order}\" class=\"chapter\">\n",
            escape(id)
        ));
        ncx.push_str(&format!(
            "      <navLabel><text>{}</text></navLabel>\n",
            escape(title)
        ));
        ncx.push_str(&format!("      <content src=\"{}\"/>\n", escape(src)));
        ncx.push_str("    </navPoint>\n");
        play_order += 1;
    };

    let (before, after): (Vec<_>, Vec<_>) = entries.into_iter().partition(|c| c.before_toc);
    for chapter in before {
        push(&mut ncx, &nav_point_id(chapter.index), chapter.display_title(), &chapter.href);
    }
    push(&mut ncx, "toc", &ctx.options.toc_title, "toc.xhtml");
    for chapter in after {
        push(&mut ncx, &nav_point_id(chapter.index), chapter.display_title(), &chapter.href);
    }
    ncx
}

fn nav_point_id(index: usize) -> String {
    format!("content_{index}")
}

/// Generate toc.xhtml: a `nav` document for EPUB 3, a plain XHTML 1.1 page
/// for EPUB 2.
pub(super) fn toc_xhtml(ctx: &RenderContext<'_>) -> String {
    let options = ctx.options;
    let legacy = options.version.is_legacy();
    let mut html = String::new();

    if legacy {
        html.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{0}" lang="{0}">
<head>
  <title>{1}</title>
  <meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
  <link rel="stylesheet" type="text/css" href="style.css"/>
</head>
<body>
<h1 class="h1">{2}</h1>
<div id="toc">
"#,
            escape(&options.lang),
            escape(&options.title),
            escape(&options.toc_title)
        ));
    } else {
        html.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{0}" lang="{0}">
<head>
  <title>{1}</title>
  <meta charset="UTF-8"/>
  <link rel="stylesheet" type="text/css" href="style.css"/>
</head>
<body>
<h1 class="h1">{2}</h1>
<nav id="toc" epub:type="toc">
"#,
            escape(&options.lang),
            escape(&options.title),
            escape(&options.toc_title)
        ));
    }

    html.push_str("  <ol>\n");
    html.push_str(&toc_items(ctx));
    html.push_str("  </ol>\n");
    html.push_str(if legacy { "</div>\n" } else { "</nav>\n" });
    html.push_str("</body>\n</html>\n");
    html
}

/// `<li>` entries linking each listed chapter, with its authors if any.
pub(super) fn toc_items(ctx: &RenderContext<'_>) -> String {
    let mut items = String::new();
    for chapter in ctx.toc_entries() {
        items.push_str(&format!(
            "    <li class=\"table-of-content\"><a href=\"{}\">{}",
            escape(&chapter.href),
            escape(chapter.display_title())
        ));
        if !chapter.author.is_empty() {
            items.push_str(&format!(
                " - <small class=\"toc-author\">{}</small>",
                escape(&chapter.author.join(", "))
            ));
        }
        items.push_str("</a></li>\n");
    }
    items
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::{EpubOptions, EpubVersion, ProcessedChapter};
    use crate::template::CoverInfo;

    fn chapter(index: usize, title: &str) -> ProcessedChapter {
        ProcessedChapter {
            id: format!("item_{index}"),
            index,
            title: Some(title.to_string()),
            author: Vec::new(),
            data: String::new(),
            exclude_from_toc: false,
            before_toc: false,
            filename: None,
            url: None,
            href: format!("{index}_{title}.xhtml"),
            file_path: PathBuf::from(format!("/w/OEBPS/{index}_{title}.xhtml")),
            dir: PathBuf::from("/w/OEBPS"),
        }
    }

    fn context<'a>(
        options: &'a EpubOptions,
        content: &'a [ProcessedChapter],
        cover: Option<&'a CoverInfo>,
    ) -> RenderContext<'a> {
        RenderContext {
            options,
            id: "1234",
            date: "2024-01-01T00:00:00.000Z",
            modified: "2024-01-01T00:00:00Z",
            content,
            images: Vec::new(),
            fonts: &[],
            cover,
        }
    }

    #[test]
    fn test_spine_puts_before_toc_chapters_first() {
        let options = EpubOptions::new("Book");
        let mut content = vec![chapter(0, "a"), chapter(1, "b"), chapter(2, "c")];
        content[2].before_toc = true;
        let opf = content_opf(&context(&options, &content, None));

        let c = opf.find("idref=\"item_2\"").unwrap();
        let toc = opf.find("idref=\"toc\"").unwrap();
        let a = opf.find("idref=\"item_0\"").unwrap();
        assert!(c < toc && toc < a);
    }

    #[test]
    fn test_excluded_chapters_stay_in_spine_but_not_toc() {
        let options = EpubOptions::new("Book");
        let mut content = vec![chapter(0, "a"), chapter(1, "hidden")];
        content[1].exclude_from_toc = true;
        let ctx = context(&options, &content, None);

        assert!(content_opf(&ctx).contains("idref=\"item_1\""));
        assert!(!toc_ncx(&ctx).contains("hidden"));
        assert!(!toc_xhtml(&ctx).contains("hidden"));
    }

    #[test]
    fn test_metadata_is_escaped() {
        let options = EpubOptions::new("Tom & Jerry <1>").with_author("A \"B\"");
        let ctx = context(&options, &[], None);
        let opf = content_opf(&ctx);
        assert!(opf.contains("<dc:title>Tom &amp; Jerry &lt;1&gt;</dc:title>"));
        assert!(opf.contains("A &quot;B&quot;"));
    }

    #[test]
    fn test_cover_manifest_entry() {
        let options = EpubOptions::new("Book");
        let cover = CoverInfo {
            media_type: "image/jpeg".into(),
            extension: "jpg".into(),
        };
        let opf = content_opf(&context(&options, &[], Some(&cover)));
        assert!(opf.contains(r#"href="cover.jpg" media-type="image/jpeg" properties="cover-image""#));
        assert!(opf.contains(r#"<meta name="cover" content="image_cover"/>"#));
    }

    #[test]
    fn test_version_specific_markup() {
        let v2 = EpubOptions::new("Book").with_version(EpubVersion::V2);
        let v3 = EpubOptions::new("Book");

        let opf2 = content_opf(&context(&v2, &[], None));
        assert!(opf2.contains("version=\"2.0\""));
        assert!(opf2.contains("<guide>"));
        assert!(!opf2.contains("dcterms:modified"));

        let opf3 = content_opf(&context(&v3, &[], None));
        assert!(opf3.contains("version=\"3.0\""));
        assert!(opf3.contains("properties=\"nav\""));
        assert!(opf3.contains("<meta property=\"dcterms:modified\">2024-01-01T00:00:00Z</meta>"));

        assert!(toc_xhtml(&context(&v2, &[], None)).contains("<div id=\"toc\">"));
        assert!(toc_xhtml(&context(&v3, &[], None)).contains("epub:type=\"toc\""));
    }

    #[test]
    fn test_nav_points_play_order() {
        let options = EpubOptions::new("Book");
        let content = vec![chapter(0, "a"), chapter(1, "b")];
        let ncx = toc_ncx(&context(&options, &content, None));
        assert!(ncx.contains(r#"<navPoint id="toc" playOrder="1""#));
        assert!(ncx.contains(r#"<navPoint id="content_0" playOrder="2""#));
        assert!(ncx.contains(r#"<navPoint id="content_1" playOrder="3""#));
        assert!(ncx.contains("<text>anonymous</text>"));
    }

    #[test]
    fn test_toc_item_lists_chapter_authors() {
        let options = EpubOptions::new("Book");
        let mut content = vec![chapter(0, "a")];
        content[0].author = vec!["X".into(), "Y".into()];
        let items = toc_items(&context(&options, &content, None));
        assert!(items.contains("<small class=\"toc-author\">X, Y</small>"));
    }
}
