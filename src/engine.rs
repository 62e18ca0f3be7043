use crate::config::{Config, Mode};
use crate::error::{Error, Result};
use crate::text::LiteralRule;

#[derive(Debug)]
enum Segment {
    Text(String),
    Frozen(String),
}

#[derive(Debug)]
pub struct Engine {
    mode: Mode,
    highlights: Vec<LiteralRule>,
    fixups: Vec<LiteralRule>,
}

impl Engine {
    pub fn new(config: &Config) -> Result<Self> {
        if config.color.contains(['\'', '"', '<', '>']) {
            return Err(Error::InvalidColor(config.color.clone()));
        }

        let highlights = config
            .keywords
            .iter()
            .map(|keyword| {
                if keyword.is_empty() {
                    return Err(Error::EmptyPattern("highlight"));
                }
                LiteralRule::new(keyword, &highlight_markup(&config.color, keyword))
            })
            .collect::<Result<Vec<_>>>()?;

        let fixups = config
            .fixups
            .iter()
            .map(|fixup| {
                if fixup.pattern.is_empty() {
                    return Err(Error::EmptyPattern("fixup"));
                }
                LiteralRule::new(&fixup.pattern, &fixup.replacement)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mode: config.mode,
            highlights,
            fixups,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn rule_count(&self) -> usize {
        self.highlights.len() + self.fixups.len()
    }

    pub fn transform(&self, html: &str) -> String {
        match self.mode {
            Mode::Protected => self.transform_protected(html),
            Mode::Sequential => self.transform_sequential(html),
        }
    }

    fn transform_sequential(&self, html: &str) -> String {
        let mut text = html.to_string();
        for rule in self.highlights.iter().chain(&self.fixups) {
            rule.apply_in_place(&mut text);
        }
        text
    }

    fn transform_protected(&self, html: &str) -> String {
        let mut segments = split_tags(html);

        for rule in &self.highlights {
            if !segments.iter().any(|s| matches!(s, Segment::Text(_))) {
                break;
            }
            segments = segments
                .into_iter()
                .flat_map(|segment| match segment {
                    Segment::Text(text) => claim_matches(rule, text),
                    frozen => vec![frozen],
                })
                .collect();
        }

        for rule in &self.fixups {
            for segment in &mut segments {
                if let Segment::Text(text) = segment {
                    rule.apply_in_place(text);
                }
            }
        }

        let mut out = String::with_capacity(html.len());
        for segment in &segments {
            match segment {
                Segment::Text(s) | Segment::Frozen(s) => out.push_str(s),
            }
        }
        out
    }
}

fn highlight_markup(color: &str, keyword: &str) -> String {
    format!("<span style='color: {color}'>{keyword}</span>")
}

/// Splits `text` around the matches of `rule`, freezing each replacement.
fn claim_matches(rule: &LiteralRule, text: String) -> Vec<Segment> {
    let ranges: Vec<_> = rule.find_ranges(&text).collect();
    if ranges.is_empty() {
        return vec![Segment::Text(text)];
    }

    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut last = 0;
    for range in ranges {
        if range.start > last {
            segments.push(Segment::Text(text[last..range.start].to_string()));
        }
        segments.push(Segment::Frozen(rule.replacement().to_string()));
        last = range.end;
    }
    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }
    segments
}

/// Freezes comments and everything that looks like a tag: `<` followed by a
/// letter, `/`, `!` or `?`, up to the next `>`. A stray `<` stays text.
fn split_tags(html: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let open = pos + offset;
        let starts_tag = html[open + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        let close = if html[open..].starts_with("<!--") {
            html[open..].find("-->").map(|i| open + i + 2)
        } else {
            html[open..].find('>').map(|i| open + i)
        };

        match (starts_tag, close) {
            (true, Some(close)) => {
                if open > text_start {
                    segments.push(Segment::Text(html[text_start..open].to_string()));
                }
                segments.push(Segment::Frozen(html[open..=close].to_string()));
                text_start = close + 1;
                pos = close + 1;
            }
            _ => pos = open + 1,
        }
    }

    if text_start < html.len() {
        segments.push(Segment::Text(html[text_start..].to_string()));
    }
    segments
}
