//! Fixed files of the working tree and the chapter document shell.

use quick_xml::escape::escape;

use crate::model::{EpubOptions, ProcessedChapter};

/// META-INF/container.xml.
pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// META-INF/com.apple.ibooks.display-options.xml, written for EPUB 2 so that
/// iBooks honours embedded fonts.
pub const IBOOKS_DISPLAY_OPTIONS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<display_options>
  <platform name="*">
    <option name="specified-fonts">true</option>
  </platform>
</display_options>
"#;

pub const DEFAULT_CSS: &str = r#".epub-author {
  color: #555;
}

.epub-link {
  margin-bottom: 30px;
}

.epub-link a {
  color: #666;
  font-size: 90%;
}

.toc-author {
  font-size: 90%;
  color: #555;
}

.toc-link {
  color: #999;
  font-size: 85%;
  display: block;
}

hr {
  border: 0;
  border-bottom: 1px solid #dedede;
  margin: 60px 10%;
}
"#;

/// Wrap a sanitized fragment in a complete XHTML document.
pub fn chapter_document(options: &EpubOptions, chapter: &ProcessedChapter) -> String {
    let lang = escape(options.lang.as_str());
    let mut doc = String::new();

    if options.version.is_legacy() {
        doc.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" lang="{lang}">
<head>
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
"#
        ));
    } else {
        doc.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}">
<head>
<meta charset="UTF-8"/>
"#
        ));
    }

    let title = chapter.title.as_deref().unwrap_or_default();
    doc.push_str(&format!("<title>{}</title>\n", escape(title)));
    doc.push_str("<link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\"/>\n");
    doc.push_str("</head>\n<body>\n");

    // Heading, author and source lines only accompany titled chapters.
    if let Some(title) = chapter.title.as_deref() {
        if options.append_chapter_titles {
            doc.push_str(&format!("<h1>{}</h1>\n", escape(title)));
        }
        if !chapter.author.is_empty() {
            doc.push_str(&format!(
                "<p class=\"epub-author\">{}</p>\n",
                escape(chapter.author.join(", "))
            ));
        }
        if let Some(url) = chapter.url.as_deref() {
            let url = escape(url);
            doc.push_str(&format!(
                "<p class=\"epub-link\"><a href=\"{url}\">{url}</a></p>\n"
            ));
        }
    }

    doc.push_str(&chapter.data);
    doc.push_str("\n</body>\n</html>\n");
    doc
}
