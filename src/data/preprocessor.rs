// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans one raw corpus line before tokenisation.
//
// Cleaning steps (applied in order):
//   1. Drop every backslash (escape residue in the raw corpus)
//   2. Replace tabs, Unicode space variants and control
//      characters with a plain space
//   3. Collapse runs of spaces into one
//   4. Trim leading/trailing whitespace
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a single document line.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true;

        for c in text.chars() {
            let c = match c {
                '\\' => continue,
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            };
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim_end().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
