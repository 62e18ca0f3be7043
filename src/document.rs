use crate::engine::Engine;
use crate::error::{Error, Result};
use log::debug;
use std::cmp::Reverse;
use std::ops::Range;

pub type FragmentId = usize;

const FRAGMENT_TAGS: &[&str] = &["p", "li"];
// Bodies the browser never parses as markup.
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title"];

/// A collaborator that hands out element HTML and accepts the rewritten HTML.
pub trait ElementTextSource {
    fn fragments(&self) -> Vec<(FragmentId, String)>;
    fn set_fragment(&mut self, id: FragmentId, html: String) -> Result<()>;
}

/// An HTML page whose `<p>` and `<li>` contents are the fragments.
///
/// An element nested in another one is covered by the outer fragment, so
/// every byte of the page is transformed at most once.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    source: String,
    elements: Vec<Range<usize>>,
    replaced: Vec<Option<String>>,
}

impl HtmlDocument {
    pub fn parse(html: impl Into<String>) -> Self {
        let source = html.into();

        let mut found = element_ranges(&source);
        found.sort_by_key(|r| (r.start, Reverse(r.end)));

        let mut elements: Vec<Range<usize>> = Vec::with_capacity(found.len());
        for range in found {
            if elements.last().is_some_and(|last| range.start < last.end) {
                continue;
            }
            elements.push(range);
        }

        let replaced = vec![None; elements.len()];
        Self {
            source,
            elements,
            replaced,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The page with every written fragment spliced back in.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut last = 0;
        for (range, replacement) in self.elements.iter().zip(&self.replaced) {
            if let Some(html) = replacement {
                out.push_str(&self.source[last..range.start]);
                out.push_str(html);
                last = range.end;
            }
        }
        out.push_str(&self.source[last..]);
        out
    }
}

impl ElementTextSource for HtmlDocument {
    fn fragments(&self) -> Vec<(FragmentId, String)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(id, range)| (id, self.source[range.clone()].to_string()))
            .collect()
    }

    fn set_fragment(&mut self, id: FragmentId, html: String) -> Result<()> {
        let slot = self
            .replaced
            .get_mut(id)
            .ok_or(Error::UnknownFragment(id))?;
        *slot = Some(html);
        Ok(())
    }
}

/// Inner ranges of every balanced `<p>`/`<li>` element. Comments and
/// raw-text bodies are skipped; unclosed elements are dropped.
fn element_ranges(source: &str) -> Vec<Range<usize>> {
    // ASCII lowercasing keeps byte offsets identical to `source`.
    let lower = source.to_ascii_lowercase();
    let mut open: Vec<(&str, usize)> = Vec::new();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = lower[pos..].find('<') {
        let start = pos + offset;
        let rest = &lower[start..];

        if rest.starts_with("<!--") {
            pos = rest.find("-->").map_or(lower.len(), |i| start + i + 3);
            continue;
        }

        let closing = rest.starts_with("</");
        let name_start = start + if closing { 2 } else { 1 };
        if !lower[name_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            pos = start + 1;
            continue;
        }
        let Some(end) = rest.find('>').map(|i| start + i) else {
            break;
        };
        let name_len = lower[name_start..end]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(end - name_start);
        let name = &lower[name_start..name_start + name_len];
        pos = end + 1;

        if closing {
            if let Some(depth) = open.iter().rposition(|(tag, _)| *tag == name) {
                found.push(open[depth].1..start);
                open.truncate(depth);
            }
        } else if RAW_TEXT_TAGS.contains(&name) {
            let close = format!("</{name}");
            pos = lower[pos..].find(&close).map_or(lower.len(), |i| pos + i);
        } else if FRAGMENT_TAGS.contains(&name) && !lower[..end].ends_with('/') {
            open.push((name, pos));
        }
    }
    found
}

/// Runs every fragment of `source` through `engine` and writes back the ones
/// that changed. Returns how many changed.
pub fn highlight_source<S: ElementTextSource + ?Sized>(
    source: &mut S,
    engine: &Engine,
) -> Result<usize> {
    let mut changed = 0;
    for (id, html) in source.fragments() {
        let out = engine.transform(&html);
        if out != html {
            source.set_fragment(id, out)?;
            changed += 1;
        }
    }
    debug!("fragments changed: {changed}");
    Ok(changed)
}
