//! `{{name}}` expansion for user-supplied template files.

use std::collections::HashMap;

use quick_xml::escape::escape;
use tracing::debug;

use super::{RenderContext, builtin};

/// Values available to custom templates.
///
/// Scalars are XML-escaped. `manifest_items`, `spine_items`, `nav_points` and
/// `toc_items` are ready-made markup fragments.
pub(super) fn variables(ctx: &RenderContext<'_>) -> HashMap<&'static str, String> {
    let options = ctx.options;
    let cover_href = ctx.cover.map(|c| c.href()).unwrap_or_default();

    let mut vars = HashMap::new();
    vars.insert("id", escape(ctx.id).into_owned());
    vars.insert("uuid", escape(ctx.id).into_owned());
    vars.insert("title", escape(options.title.as_str()).into_owned());
    vars.insert("author", escape(options.authors().join(", ")).into_owned());
    vars.insert("publisher", escape(options.publisher.as_str()).into_owned());
    vars.insert("description", escape(options.description()).into_owned());
    vars.insert("lang", escape(options.lang.as_str()).into_owned());
    vars.insert("date", escape(ctx.date).into_owned());
    vars.insert("modified", escape(ctx.modified).into_owned());
    vars.insert("toc_title", escape(options.toc_title.as_str()).into_owned());
    vars.insert("version", options.version.number().to_string());
    vars.insert("cover", escape(cover_href).into_owned());
    vars.insert("manifest_items", builtin::manifest_items(ctx));
    vars.insert("spine_items", builtin::spine_items(ctx));
    vars.insert("nav_points", builtin::nav_points(ctx));
    vars.insert("toc_items", builtin::toc_items(ctx));
    vars
}

/// Replace every `{{ name }}` whose name is in `vars`. Unknown placeholders
/// are left as written.
pub fn expand(template: &str, vars: &HashMap<&'static str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let name = after[..end].trim();
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                debug!(placeholder = name, "unknown template placeholder");
                out.push_str(&rest[start..start + 2 + end + 2]);
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
