//! Fixed attribute and tag allow-lists for chapter markup.

/// Attributes kept on any element. Everything else is stripped.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "about", "accesskey", "alt", "aria-activedescendant", "aria-atomic",
    "aria-autocomplete", "aria-busy", "aria-checked", "aria-controls",
    "aria-describedat", "aria-describedby", "aria-disabled", "aria-dropeffect",
    "aria-expanded", "aria-flowto", "aria-grabbed", "aria-haspopup", "aria-hidden",
    "aria-invalid", "aria-label", "aria-labelledby", "aria-level", "aria-live",
    "aria-multiline", "aria-multiselectable", "aria-orientation", "aria-owns",
    "aria-posinset", "aria-pressed", "aria-readonly", "aria-relevant",
    "aria-required", "aria-selected", "aria-setsize", "aria-sort", "aria-valuemax",
    "aria-valuemin", "aria-valuenow", "aria-valuetext", "class", "colspan", "content",
    "contenteditable", "contextmenu", "datatype", "dir", "draggable", "dropzone",
    "epub:prefix", "epub:type", "hidden", "href", "hreflang", "id", "inlist", "itemid",
    "itemref", "itemscope", "itemtype", "lang", "media", "ns1:type", "ns2:alphabet",
    "ns2:ph", "onabort", "onblur", "oncanplay", "oncanplaythrough", "onchange",
    "onclick", "oncontextmenu", "ondblclick", "ondrag", "ondragend", "ondragenter",
    "ondragleave", "ondragover", "ondragstart", "ondrop", "ondurationchange",
    "onemptied", "onended", "onerror", "onfocus", "oninput", "oninvalid", "onkeydown",
    "onkeypress", "onkeyup", "onload", "onloadeddata", "onloadedmetadata",
    "onloadstart", "onmousedown", "onmousemove", "onmouseout", "onmouseover",
    "onmouseup", "onmousewheel", "onpause", "onplay", "onplaying", "onprogress",
    "onratechange", "onreadystatechange", "onreset", "onscroll", "onseeked",
    "onseeking", "onselect", "onshow", "onstalled", "onsubmit", "onsuspend",
    "ontimeupdate", "onvolumechange", "onwaiting", "prefix", "property", "rel",
    "resource", "rev", "role", "rowspan", "spellcheck", "src", "style", "tabindex",
    "target", "title", "type", "typeof", "vocab", "xml:base", "xml:lang", "xml:space",
];

/// Tags allowed by the XHTML 1.1 DTD used for EPUB 2 content documents.
pub const XHTML11_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "applet", "b", "bar", "basefont", "bdo", "big",
    "blockquote", "br", "caption", "center", "cite", "code", "col", "colgroup", "dd",
    "del", "dfn", "div", "dl", "dt", "em", "embed", "font", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr", "i", "iframe", "img", "ins", "kbd", "li", "map", "noscript", "ns:svg",
    "object", "ol", "p", "param", "pre", "q", "s", "samp", "script", "small", "span",
    "strike", "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "tt", "u", "ul", "var",
];

pub fn is_allowed_attribute(element: &str, attribute: &str) -> bool {
    if attribute == "type" {
        return element == "script";
    }
    ALLOWED_ATTRIBUTES.binary_search(&attribute).is_ok()
}

pub fn is_xhtml11_tag(tag: &str) -> bool {
    XHTML11_TAGS.binary_search(&tag).is_ok()
}
