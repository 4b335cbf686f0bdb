//! Normalization of feature (gene) and sample (cell) identifiers.

/// Removes a `b'...'` / `b"..."` wrapper left behind when byte strings were
/// stringified before being stored as names.
fn strip_byte_literal(s: &str) -> &str {
    let t = s.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = t.strip_prefix('b').and_then(|r| r.strip_prefix(q)) {
            if let Some(inner) = inner.strip_suffix(q) {
                return inner;
            }
        }
    }
    s
}

/// Feature names are upper-cased and trimmed.
pub fn clean_feature_name(name: &str) -> String {
    strip_byte_literal(name).trim().to_uppercase()
}

/// Sample names are only trimmed.
pub fn clean_sample_name(name: &str) -> String {
    strip_byte_literal(name).trim().to_owned()
}

pub fn clean_feature_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|n| clean_feature_name(n.as_ref())).collect()
}

pub fn clean_sample_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|n| clean_sample_name(n.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_are_upper_cased_and_trimmed() {
        assert_eq!(clean_feature_name("  Actb\t"), "ACTB");
        assert_eq!(clean_feature_name("mt-Co1"), "MT-CO1");
    }

    #[test]
    fn samples_keep_their_case() {
        assert_eq!(clean_sample_name(" AAACCTGAGAAGGCCT-1 "), "AAACCTGAGAAGGCCT-1");
        assert_eq!(clean_sample_name("cell_a"), "cell_a");
    }

    #[test]
    fn byte_literal_wrappers_are_removed() {
        assert_eq!(clean_feature_name("b'Gapdh'"), "GAPDH");
        assert_eq!(clean_sample_name("b\"cell 1 \""), "cell 1");
        // a leading `b` alone is part of the name
        assert_eq!(clean_feature_name("bcl2"), "BCL2");
        assert_eq!(clean_sample_name("b'unterminated"), "b'unterminated");
    }

    #[test]
    fn slices_are_cleaned_elementwise() {
        let genes = clean_feature_names(&["a ", " b"]);
        assert_eq!(genes, vec!["A".to_owned(), "B".to_owned()]);
        let cells = clean_sample_names(&[" x".to_owned()]);
        assert_eq!(cells, vec!["x".to_owned()]);
    }
}
