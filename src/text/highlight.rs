//! Highlighting of resolved place mentions
//!
//! Only mentions that became markers are rendered as interactive references;
//! every other span loses its markup and renders as plain text.

use std::collections::HashSet;

use super::{PLACE_MARKUP, escape_html};

/// Case-insensitive set of place names that resolved to a marker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoundSet {
    names: HashSet<String>,
}

impl FoundSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.trim().to_lowercase());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FoundSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FoundSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

/// Rewrite `**Name**` spans into interactive references or plain text.
///
/// The result is HTML-escaped outside of the generated `<span>` elements.
#[must_use]
pub fn highlight(text: &str, found: &FoundSet) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;

    for caps in PLACE_MARKUP.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_plain(&mut out, &text[last..whole.start()]);

        let name = inner.as_str().trim();
        if !name.is_empty() && found.contains(name) {
            let escaped = escape_html(name);
            out.push_str(&format!(
                r#"<span class="place-name" data-place="{escaped}">{escaped}</span>"#
            ));
        } else {
            out.push_str(&escape_html(name));
        }
        last = whole.end();
    }
    push_plain(&mut out, &text[last..]);
    out
}

/// Plain text between spans; stray delimiters are dropped
fn push_plain(out: &mut String, segment: &str) {
    out.push_str(&escape_html(&segment.replace("**", "")));
}
