//! Query normalisation — turns the raw search text into the term list sent
//! to the backend.

/// Terms offered on the landing screen before anything has been searched.
pub const SUGGESTIONS: [&str; 5] = [
    "Japanese Jazz",
    "90s Memphis Rap",
    "Dreampop",
    "Darkwave",
    "Ethiopian Funk",
];

/// Split on commas, trim each segment, drop the empty ones.  Input order is
/// kept and duplicates are not removed.
pub fn split_terms(query: &str) -> Vec<String> {
    query
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the query would produce no request at all.
pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(split_terms("a, ,b,"), vec!["a", "b"]);
        assert_eq!(split_terms(",,,"), Vec::<String>::new());
        assert_eq!(split_terms(""), Vec::<String>::new());
    }

    #[test]
    fn test_split_keeps_order_and_duplicates() {
        assert_eq!(
            split_terms("  Sade ,Cocteau Twins,Sade"),
            vec!["Sade", "Cocteau Twins", "Sade"]
        );
    }

    #[test]
    fn test_split_single_term_with_inner_spaces() {
        assert_eq!(split_terms("Ethiopian Funk"), vec!["Ethiopian Funk"]);
        assert_eq!(split_terms("\tMulatu Astatke \n"), vec!["Mulatu Astatke"]);
    }

    #[test]
    fn test_blank_queries() {
        assert!(is_blank(""));
        assert!(is_blank("   \t"));
        assert!(!is_blank(" x "));
        // Commas alone are not blank, they just split into nothing.
        assert!(!is_blank(","));
    }

    #[test]
    fn test_no_term_is_ever_empty() {
        for input in ["a,,b", " , a , ", "x", ",", " ,\t, ", "é, ü ,"] {
            assert!(split_terms(input).iter().all(|t| !t.is_empty() && t.trim() == t));
        }
    }
}
