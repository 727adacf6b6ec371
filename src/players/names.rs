/// Fixed-width "name.ext" rendering used on the status screen, e.g. 8.3 or
/// 16.3. Both parts are truncated and padded with spaces; a name without an
/// extension gets blanks where the dot and extension would be.
pub fn short_name(width: usize, ext_width: usize, filename: &str) -> String {
    let (stem, ext) = match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], Some(&filename[dot + 1..])),
        _ => (filename, None),
    };

    let stem: String = stem.chars().take(width).collect();
    let mut out = format!("{stem:<width$}");
    match ext {
        Some(ext) => {
            let ext: String = ext.chars().take(ext_width).collect();
            out.push('.');
            out.push_str(&format!("{ext:<ext_width$}"));
        }
        None => out.push_str(&" ".repeat(ext_width + 1)),
    }
    out
}
