use common::storage::types::content_item::ContentFields;

use crate::source::RemoteContentEntry;

/// Longest stored excerpt, counted in Unicode code points.
pub const MAX_EXCERPT_CHARS: usize = 400;

/// Maps one raw listing entry onto the fields we store locally.
pub fn normalize_entry(entry: RemoteContentEntry) -> ContentFields {
    let excerpt = truncate_chars(&strip_markup(&entry.excerpt.rendered), MAX_EXCERPT_CHARS);
    let category = entry
        .categories
        .first()
        .map(|term| term.name.clone())
        .unwrap_or_default();
    let tags = entry.tags.into_iter().map(|term| term.name).collect();

    ContentFields {
        external_id: entry.id.to_string(),
        title: strip_markup(&entry.title.rendered),
        slug: entry.slug,
        excerpt,
        // The listing endpoint carries no full body; search works on excerpts.
        body: String::new(),
        category,
        tags,
    }
}

/// Removes tags, decodes common entities, and collapses the whitespace
/// stripped tags leave behind. Unterminated markup is tolerated.
pub fn strip_markup(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                for inner in chars.by_ref() {
                    if inner == '>' {
                        break;
                    }
                }
                // A tag boundary separates words even when the markup hugged them.
                output.push(' ');
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&next) = chars.peek() {
                    if next == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    if entity.len() >= 8 || next == '&' || next == '<' {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }

                match decode_entity(&entity) {
                    Some(decoded) if terminated => output.push(decoded),
                    _ => {
                        output.push('&');
                        output.push_str(&entity);
                        if terminated {
                            output.push(';');
                        }
                    }
                }
            }
            _ => output.push(c),
        }
    }

    output.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = if let Some(hex) = digits
                .strip_prefix('x')
                .or_else(|| digits.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RemoteTerm, RenderedField};

    #[test]
    fn test_strip_markup_removes_tags_and_decodes_entities() {
        assert_eq!(
            strip_markup("<p>Ship it &amp; iterate</p>"),
            "Ship it & iterate"
        );
        assert_eq!(strip_markup("a<br/>b"), "a b");
        assert_eq!(strip_markup("5 &lt; 7 &gt; 3"), "5 < 7 > 3");
        assert_eq!(strip_markup("it&#8217;s &#x2713; done"), "it’s ✓ done");
    }

    #[test]
    fn test_strip_markup_tolerates_malformed_input() {
        assert_eq!(strip_markup("truncated <a href="), "truncated");
        assert_eq!(strip_markup("loose & ampersand"), "loose & ampersand");
        assert_eq!(strip_markup("&notarealentity;"), "&notarealentity;");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_strip_markup_collapses_whitespace() {
        assert_eq!(
            strip_markup("<p>first</p>\n\n<p>second   third</p>"),
            "first second third"
        );
    }

    #[test]
    fn test_truncate_counts_code_points_not_bytes() {
        let input = "ä".repeat(450);
        let truncated = truncate_chars(&input, MAX_EXCERPT_CHARS);
        assert_eq!(truncated.chars().count(), 400);

        assert_eq!(truncate_chars("short", 400), "short");
    }

    #[test]
    fn test_normalize_entry_maps_all_fields() {
        let entry = RemoteContentEntry {
            id: 314,
            title: RenderedField {
                rendered: "Why we &amp; how we deploy".to_string(),
            },
            slug: "why-we-deploy".to_string(),
            excerpt: RenderedField {
                rendered: "<p>Rolling releases, <em>every</em> week.</p>".to_string(),
            },
            categories: vec![
                RemoteTerm {
                    name: "Operations".to_string(),
                },
                RemoteTerm {
                    name: "Engineering".to_string(),
                },
            ],
            tags: vec![
                RemoteTerm {
                    name: "ci".to_string(),
                },
                RemoteTerm {
                    name: "release".to_string(),
                },
            ],
        };

        let fields = normalize_entry(entry);
        assert_eq!(fields.external_id, "314");
        assert_eq!(fields.title, "Why we & how we deploy");
        assert_eq!(fields.slug, "why-we-deploy");
        assert_eq!(fields.excerpt, "Rolling releases, every week.");
        assert_eq!(fields.category, "Operations", "First category wins");
        assert_eq!(fields.tags, vec!["ci".to_string(), "release".to_string()]);
        assert!(fields.body.is_empty());
    }

    #[test]
    fn test_normalize_entry_with_no_taxonomy() {
        let entry = RemoteContentEntry {
            id: 9,
            title: RenderedField::default(),
            slug: String::new(),
            excerpt: RenderedField::default(),
            categories: vec![],
            tags: vec![],
        };

        let fields = normalize_entry(entry);
        assert_eq!(fields.external_id, "9");
        assert!(fields.category.is_empty());
        assert!(fields.tags.is_empty());
        assert!(fields.excerpt.is_empty());
    }
}
