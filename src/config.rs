use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Inserted markup and existing tags are never rescanned
    #[default]
    Protected,
    /// Every rule rescans the cumulative output, markup included
    Sequential,
}

impl Mode {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "protected" => Some(Mode::Protected),
            "sequential" => Some(Mode::Sequential),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Fixup {
    pub pattern: String,
    pub replacement: String,
}

impl Fixup {
    fn new(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_true")]
    pub use_default_rules: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub fixups: Vec<Fixup>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: default_color(),
            mode: Mode::default(),
            use_default_rules: true,
            keywords: Vec::new(),
            fixups: Vec::new(),
        }
    }
}

impl Config {
    /// Defaults merged in, ready for the engine.
    pub fn builtin() -> Self {
        let mut config = Config::default();
        config.merge_defaults();
        config
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// User keywords go after the built-in ones; user fixups run first so
    /// their abbreviations are settled before the sentence splitter.
    fn merge_defaults(&mut self) {
        if !self.use_default_rules {
            return;
        }
        let mut keywords = default_keywords();
        keywords.append(&mut self.keywords);
        self.keywords = keywords;

        self.fixups.extend(default_fixups());

        // Lists are now complete; serializing must not pull defaults in twice.
        self.use_default_rules = false;
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(color) = var("CFHIGHLIGHT_COLOR") {
            self.color = color;
        }
        if let Some(mode) = var("CFHIGHLIGHT_MODE") {
            match Mode::from_name(&mode) {
                Some(mode) => self.mode = mode,
                None => warn!("ignoring unknown CFHIGHLIGHT_MODE={mode:?}"),
            }
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("cfhighlight.toml")
}

fn default_true() -> bool {
    true
}

fn default_color() -> String {
    // IntelliJ Light keyword blue
    "#008dde".to_string()
}

fn default_keywords() -> Vec<String> {
    [
        // Negation first, then the longer phrases that contain shorter words
        " not ", "don't", "didn't", "doesn't", "can't", " no ",
        "if and only if", "and all", "or all",
        "If ", " if ", "Otherwise", "otherwise", " and ", " or ", "either",
        " any", " all ", "every", " both ",
        "same", "different", "unique", "distinct",
        "more", "must", "only", "exactly", "always",
        // Optimisation targets and bounds
        "minimize", "maximize", "minimum", "maximum", "minimal", "maximal", "smallest", "largest",
        " small ", " big ", " large ",
        "at least", "at most",
        "non-zero", "positive", "negative", "integers", "an integer", "integer", "pairwise",
        "Initially", "initially", "guaranteed",
        "modulo",
        "permutations", "permutation",
        "lowercase", "uppercase",
        "lexicographically", "lexicographical",
        "expected value",
        "operations", "Operations", "operation", "Operation",
        // Chinese statements
        "没有", "不是",
        "所有", "任何", "任意", "和", "或",
        "最小", "最大", "最少", "最多", "最短", "最长",
        "至少", "至多",
        "连续", "子数组", "子区间", "区间", "子序列", "子字符串", "子串",
        "严格", "递增", "递减", "升序", "降序", "字典序",
        "返回",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_fixups() -> Vec<Fixup> {
    [
        // Abbreviations whose period must not end a paragraph
        ("Mr. ", "Mr."),
        ("mr. ", "mr."),
        ("I.e. ", "I.e."),
        ("i.e. ", "i.e."),
        ("i. e. ", "i.e."),
        ("Div. ", "Div."),
        ("div. ", "div."),
        ("...", "⋯"),
        // Paragraph breaks
        (". ", ".</p><p>"),
        (".\n", ".</p><p>"),
        ("。", "。</p><p>"),
        // TeX ellipses, after the splitter so their dots survive
        ("\\dots", "~.~.~.~"),
        ("\\ldots", "~.~.~.~"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Fixup::new(pattern, replacement))
    .collect()
}

pub fn load_config(path: Option<&Path>) -> Config {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let mut config = if let Ok(content) = std::fs::read_to_string(&path) {
        match Config::from_toml_str(&content) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to parse {path:?}: {e}");
                Config::default()
            }
        }
    } else {
        debug!("no config at {path:?}, using built-in rules");
        Config::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok());
    config.merge_defaults();

    debug!(
        "color={} mode={:?} keywords={} fixups={}",
        config.color,
        config.mode,
        config.keywords.len(),
        config.fixups.len()
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_rules_keep_their_order() {
        let config = Config::builtin();
        assert_eq!(config.color, "#008dde");
        assert_eq!(config.mode, Mode::Protected);

        let pos = |w: &str| config.keywords.iter().position(|k| k == w).unwrap();
        assert!(pos("if and only if") < pos("If "));
        assert!(pos("if and only if") < pos(" if "));
        assert!(pos("permutations") < pos("permutation"));

        let fix = |p: &str| config.fixups.iter().position(|f| f.pattern == p).unwrap();
        assert!(fix("Mr. ") < fix(". "));
        assert!(fix("...") < fix(". "));
        assert!(fix(". ") < fix("\\dots"));
    }

    #[test]
    fn user_rules_merge_around_defaults() {
        let mut config = Config::from_toml_str(
            r#"
color = "red"
keywords = ["subsequence"]

[[fixups]]
pattern = "e.g. "
replacement = "e.g."
"#,
        )
        .unwrap();
        config.merge_defaults();

        assert_eq!(config.color, "red");
        assert_eq!(config.keywords.first().map(String::as_str), Some(" not "));
        assert_eq!(config.keywords.last().map(String::as_str), Some("subsequence"));
        assert_eq!(config.fixups[0], Fixup::new("e.g. ", "e.g."));
        assert_eq!(config.fixups.len(), default_fixups().len() + 1);
    }

    #[test]
    fn defaults_can_be_disabled() {
        let mut config = Config::from_toml_str(
            r#"
use_default_rules = false
mode = "sequential"
keywords = ["only"]
"#,
        )
        .unwrap();
        config.merge_defaults();

        assert_eq!(config.mode, Mode::Sequential);
        assert_eq!(config.keywords, vec!["only".to_string()]);
        assert!(config.fixups.is_empty());
    }

    #[test]
    fn env_overrides_color_and_mode() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "CFHIGHLIGHT_COLOR" => Some("#ff0000".to_string()),
            "CFHIGHLIGHT_MODE" => Some("Sequential".to_string()),
            _ => None,
        });
        assert_eq!(config.color, "#ff0000");
        assert_eq!(config.mode, Mode::Sequential);

        config.apply_overrides(|key| (key == "CFHIGHLIGHT_MODE").then(|| "bogus".to_string()));
        assert_eq!(config.mode, Mode::Sequential);
    }

    #[test]
    fn load_config_reads_file_and_falls_back_on_garbage() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "keywords = [\"tree\"]").unwrap();
        let config = load_config(Some(file.path()));
        assert_eq!(config.keywords.last().map(String::as_str), Some("tree"));

        let mut broken = NamedTempFile::new().unwrap();
        writeln!(broken, "keywords = [").unwrap();
        let config = load_config(Some(broken.path()));
        assert_eq!(config.keywords, default_keywords());
        assert_eq!(config.fixups, default_fixups());
    }

    #[test]
    fn resolved_config_round_trips_without_doubling() {
        let config = Config::builtin();
        let text = toml::to_string(&config).unwrap();
        let mut reloaded = Config::from_toml_str(&text).unwrap();
        reloaded.merge_defaults();
        assert_eq!(reloaded.keywords, config.keywords);
        assert_eq!(reloaded.fixups, config.fixups);
    }
}
