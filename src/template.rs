use crate::field::RenderedFields;

/// Substitute `{name}` placeholders with the matching rendered field and
/// terminate the line with `\n`.
///
/// Placeholders with no matching field are kept literally. The template is
/// scanned once, left to right, so braces inside substituted values are
/// never treated as placeholders.
pub fn render(template: &str, fields: &RenderedFields) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            fields.get(name).map(|value| (value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out.push('\n');
    out
}

/// Placeholder names used in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find(&['{', '}'][..]) {
            Some(close) if after[close..].starts_with('}') => {
                names.push(&after[..close]);
                rest = &after[close + 1..];
            }
            _ => rest = after,
        }
    }
    names
}
