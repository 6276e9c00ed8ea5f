use regex::Regex;
use std::sync::LazyLock;

/// Delimiter wrapped around every cleaned formula.
pub const FORMULA_DELIMITER: char = '$';

static PAGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Page\s+\d+.*$").expect("static regex"));
static DASH_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+\s*\d+\s*-+").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

static MATHRM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\mathrm\{([A-Za-z]+)\}").expect("static regex"));
static SPLIT_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s+(\d)").expect("static regex"));
static BACKSLASH_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\s+").expect("static regex"));

/// Normalizes OCR text and recognizer LaTeX. Pure string transforms.
#[derive(Debug, Clone)]
pub struct TextFormulaCleaner {
    remove_page_footer: bool,
}

impl Default for TextFormulaCleaner {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TextFormulaCleaner {
    pub fn new(remove_page_footer: bool) -> Self {
        Self { remove_page_footer }
    }

    /// Strip "Page N" lines and "- N -" separators, collapse whitespace, trim.
    pub fn clean_text(&self, raw: &str) -> String {
        let text = if self.remove_page_footer {
            let without_pages = PAGE_LINE.replace_all(raw, "");
            DASH_PAGE_NUMBER.replace_all(&without_pages, "").into_owned()
        } else {
            raw.to_string()
        };

        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }

    /// Repair common recognizer artifacts and wrap the result in `$...$`.
    pub fn clean_latex(&self, raw: &str) -> String {
        let mut latex = MATHRM.replace_all(raw, r"\text{$1}").into_owned();

        // "1 2 3" needs two passes: matches cannot overlap
        loop {
            let joined = SPLIT_DIGITS.replace_all(&latex, "$1$2");
            if joined == latex {
                break;
            }
            latex = joined.into_owned();
        }

        let latex = BACKSLASH_SPACE.replace_all(&latex, r"\");
        wrap_formula(latex.trim())
    }
}

fn wrap_formula(latex: &str) -> String {
    if latex.starts_with(FORMULA_DELIMITER) && latex.ends_with(FORMULA_DELIMITER) {
        latex.to_string()
    } else {
        format!("{FORMULA_DELIMITER}{latex}{FORMULA_DELIMITER}")
    }
}

/// Formula markup with its delimiters removed.
pub fn formula_body(latex: &str) -> &str {
    latex.trim().trim_matches(FORMULA_DELIMITER)
}

/// True when there is nothing but delimiters and whitespace.
pub fn is_blank_formula(latex: &str) -> bool {
    formula_body(latex).trim().is_empty()
}
