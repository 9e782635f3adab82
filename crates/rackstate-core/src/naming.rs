// ── Natural-key derivation ──
//
// Driver values arrive in operator spelling ("paris-dc1", "Rack 12").
// These helpers derive the names and slugs NetBox records are keyed by.

/// Human name for a site, location or rack: hyphens become spaces.
pub fn display_name(raw: &str) -> String {
    raw.replace('-', " ")
}

/// Slug for sites, locations and tenants: lowercase, spaces become hyphens.
pub fn natural_slug(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "-")
}

/// URL-safe slug: lowercase ASCII alphanumerics, runs of anything else
/// collapse to a single hyphen, no leading or trailing hyphen.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_hyphen = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_names_restore_spaces() {
        assert_eq!(display_name("paris-dc1"), "paris dc1");
        assert_eq!(natural_slug("Paris DC1"), "paris-dc1");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Debian GNU/Linux 12 (bookworm)"), "debian-gnu-linux-12-bookworm");
        assert_eq!(slugify("  PowerEdge R640  "), "poweredge-r640");
        assert_eq!(slugify("server_chassis"), "server_chassis");
    }

    #[test]
    fn slugify_of_symbols_is_empty() {
        assert_eq!(slugify("--//--"), "");
    }
}
