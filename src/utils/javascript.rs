//! Script fragments run against single elements through `Runtime.callFunctionOn`,
//! plus XPath building for text-match locators.

pub const IS_DISPLAYED: &str = r#"function() {
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
        return false;
    }
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

pub const IS_ENABLED: &str = r#"function() {
    return !this.disabled && this.getAttribute('aria-disabled') !== 'true';
}"#;

pub const IS_OBSCURED: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const x = rect.left + rect.width / 2;
    const y = rect.top + rect.height / 2;
    if (x < 0 || y < 0 || x > window.innerWidth || y > window.innerHeight) {
        return false;
    }
    const hit = document.elementFromPoint(x, y);
    return hit !== null && hit !== this && !this.contains(hit);
}"#;

pub const TAG_NAME: &str = "function() { return this.tagName.toLowerCase(); }";

pub const CLICK: &str = "function() { this.click(); }";

pub const SCROLL_INTO_VIEW: &str = "function() { this.scrollIntoView(true); }";

/// Select the first option whose trimmed text equals the argument, firing
/// `input` and `change`. Returns false when no option matches.
pub const SELECT_BY_TEXT: &str = r#"function(text) {
    const options = Array.from(this.options || []);
    const index = options.findIndex(o => o.text.trim() === text);
    if (index < 0) {
        return false;
    }
    this.selectedIndex = index;
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

/// XPath string literal for `value`, using `concat()` when it holds both
/// quote kinds.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Union XPath over `tags` for elements whose normalized text contains
/// `text`. A relative query (`.//`) is produced for scoped searches.
pub fn text_match_xpath(tags: &[String], text: &str, relative: bool) -> String {
    let prefix = if relative { ".//" } else { "//" };
    let literal = xpath_literal(text);
    let tags: Vec<&str> = if tags.is_empty() {
        vec!["*"]
    } else {
        tags.iter().map(String::as_str).collect()
    };
    tags.iter()
        .map(|tag| format!("{}{}[contains(normalize-space(.), {})]", prefix, tag, literal))
        .collect::<Vec<_>>()
        .join(" | ")
}
