/// Derive a URL slug from a category or product name.
///
/// Transliterates accented Latin characters to ASCII, lower-cases, and
/// collapses every run of non-alphanumeric characters into a single hyphen.
/// Leading and trailing hyphens are trimmed, so `"Ópticas"` becomes
/// `"opticas"` and `"Chalecos / Placas"` becomes `"chalecos-placas"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        let c = transliterate(c);
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Map one accented character to its ASCII base letter. Characters outside
/// the table pass through; non-alphanumerics are hyphenated by the caller.
fn transliterate(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_accents() {
        assert_eq!(slugify("Ópticas"), "opticas");
        assert_eq!(slugify("Munición"), "municion");
        assert_eq!(slugify("Añejo"), "anejo");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("Chalecos / Placas"), "chalecos-placas");
        assert_eq!(slugify("  Botas   tácticas  "), "botas-tacticas");
    }

    #[test]
    fn trims_edge_hyphens() {
        assert_eq!(slugify("--Linternas--"), "linternas");
        assert_eq!(slugify("!"), "");
    }

    #[test]
    fn fallback_category_slug() {
        assert_eq!(slugify("FALTA CATEGORIA"), "falta-categoria");
        assert_eq!(slugify("FALTA CATEGORÍA"), "falta-categoria");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Mira 4x32"), "mira-4x32");
    }
}
