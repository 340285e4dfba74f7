//! Concatenates multiple input files into a single tagged source
//! stream, in a fixed file order: `.def` files first, then `main.s`,
//! then remaining `.s` files alphabetically. Files with any other
//! extension are skipped.

/// Orders `files` the way the assembler's front end expects.
fn ordered<'a>(files: &'a [(String, String)]) -> Vec<&'a (String, String)> {
    let mut defs: Vec<&(String, String)> = files
        .iter()
        .filter(|(name, _)| name.ends_with(".def"))
        .collect();
    defs.sort_by(|a, b| a.0.cmp(&b.0));

    let main = files.iter().find(|(name, _)| name == "main.s");

    let mut rest: Vec<&(String, String)> = files
        .iter()
        .filter(|(name, _)| name.ends_with(".s") && name != "main.s")
        .collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = defs;
    if let Some(m) = main {
        out.push(m);
    }
    out.extend(rest);
    out
}

/// Concatenates the ordered files into a single string, prepending
/// `[$filename$:line]␠` to every line. Line numbers are 1-based per
/// file.
#[must_use]
pub fn preprocess(files: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, text) in ordered(files) {
        for (i, line) in text.lines().enumerate() {
            out.push_str(&format!("[${name}$:{}] {line}\n", i + 1));
        }
    }
    out
}
