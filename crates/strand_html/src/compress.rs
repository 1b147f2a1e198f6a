//! Whitespace compaction for rendered markup.

use std::sync::OnceLock;

use regex::Regex;

/// Strips inter-tag whitespace while leaving whitespace-sensitive
/// elements untouched.
pub struct HtmlCompressor {
    preserved: Regex,
    after_tag: Regex,
    before_tag: Regex,
}

impl HtmlCompressor {
    pub fn new() -> Self {
        Self {
            preserved: Regex::new(
                r"(?is)<pre\b.*?</pre\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<textarea\b.*?</textarea\s*>",
            )
            .expect("preserved block pattern is valid"),
            after_tag: Regex::new(r">\s+").expect("after tag pattern is valid"),
            before_tag: Regex::new(r"\s+<").expect("before tag pattern is valid"),
        }
    }

    pub fn compress(&self, markup: &str) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut last = 0;

        for block in self.preserved.find_iter(markup) {
            // Preserved blocks open and close on a tag, so the gap around
            // them is inter-tag whitespace too.
            let gap = &markup[last..block.start()];
            let gap = if last > 0 { gap.trim_start() } else { gap };
            out.push_str(&self.collapse(gap.trim_end()));
            out.push_str(block.as_str());
            last = block.end();
        }
        let tail = &markup[last..];
        let tail = if last > 0 { tail.trim_start() } else { tail };
        out.push_str(&self.collapse(tail));

        out.trim().to_string()
    }

    fn collapse(&self, gap: &str) -> String {
        let trimmed = self.after_tag.replace_all(gap, ">");
        self.before_tag.replace_all(&trimmed, "<").into_owned()
    }
}

impl Default for HtmlCompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact `markup` with a shared compressor.
pub fn compress_html(markup: &str) -> String {
    static COMPRESSOR: OnceLock<HtmlCompressor> = OnceLock::new();
    COMPRESSOR.get_or_init(HtmlCompressor::new).compress(markup)
}
