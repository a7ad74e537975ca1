// =============================================================================
// EXPRESSION PREPROCESSING
// =============================================================================

/// Prepare raw user input for classification and parsing.
///
/// Trims, strips one leading `y=`, spells `^` as `**` and replaces the
/// Greek aliases the input widgets insert.
pub fn normalize(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("y=") {
        s = rest;
    }

    s.replace('^', "**")
        .replace(['θ', 'Θ'], "theta")
        .replace('π', "pi")
}
