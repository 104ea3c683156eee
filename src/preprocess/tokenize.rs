use anyhow::Result;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const MIN_TOKEN_LEN: usize = 2;
pub const MAX_TOKEN_LEN: usize = 15;

/// Markup stripping and word tokenization.
pub struct Tokenizer {
    code_re: Regex,
    tag_re: Regex,
    word_re: Regex,
}

impl Tokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            code_re: Regex::new(r"(?s)<code>.*?</code>")?,
            tag_re: Regex::new(r"(?s)<.*?>")?,
            // letters and underscores, no digits
            word_re: Regex::new(r"[^\W\d]+")?,
        })
    }

    /// Remove `<code>` blocks with their content, then every remaining tag.
    pub fn strip_markup(&self, text: &str) -> String {
        let no_code = self.code_re.replace_all(text, "");
        self.tag_re.replace_all(&no_code, "").into_owned()
    }

    /// Lowercase, strip accents, split into alphabetic runs and keep tokens of
    /// 2..=15 characters that do not start with `_`.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let folded = deaccent(&text.to_lowercase());
        self.word_re
            .find_iter(&folded)
            .map(|m| m.as_str())
            .filter(|t| {
                let n = t.chars().count();
                (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&n) && !t.starts_with('_')
            })
            .map(str::to_string)
            .collect()
    }
}

/// Decompose and drop combining marks ("é" -> "e").
pub fn deaccent(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

