//! Identifier rendering for generated SQL.
//!
//! Snowflake resolves an unquoted identifier by upper-casing it, so a name
//! that is already in canonical upper-case form can be emitted bare. Anything
//! else (lower case, spaces, punctuation, a leading digit, embedded quotes)
//! is double-quoted with inner quotes doubled, which makes it impossible for
//! a name to escape its identifier position.

/// `true` when `name` matches `^[A-Z_][A-Z0-9_$]*$`.
pub fn is_canonical(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

/// Render `name` so that it resolves to exactly `name` in Snowflake SQL.
pub fn render_ident(name: &str) -> String {
    if is_canonical(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Render a dotted path such as `database.schema.table`.
pub fn render_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| render_ident(p))
        .collect::<Vec<_>>()
        .join(".")
}
