//! Case conversion for `rename_all`.

/// Case conversion rules for `rename_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum RenameRule {
    /// `lowercase`
    LowerCase,
    /// `UPPERCASE`
    UpperCase,
    /// `camelCase`
    CamelCase,
    /// `PascalCase`
    PascalCase,
    /// `snake_case`
    SnakeCase,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnakeCase,
    /// `kebab-case`
    KebabCase,
    /// `SCREAMING-KEBAB-CASE`
    ScreamingKebabCase,
}

const RULES: [(&str, RenameRule); 8] = [
    ("lowercase", RenameRule::LowerCase),
    ("UPPERCASE", RenameRule::UpperCase),
    ("camelCase", RenameRule::CamelCase),
    ("PascalCase", RenameRule::PascalCase),
    ("snake_case", RenameRule::SnakeCase),
    ("SCREAMING_SNAKE_CASE", RenameRule::ScreamingSnakeCase),
    ("kebab-case", RenameRule::KebabCase),
    ("SCREAMING-KEBAB-CASE", RenameRule::ScreamingKebabCase),
];

impl RenameRule {
    pub fn parse(s: &str) -> Option<Self> {
        RULES
            .iter()
            .find_map(|(name, rule)| (*name == s).then_some(*rule))
    }

    /// Comma-separated list of accepted rule names, for error messages.
    pub fn expected() -> String {
        RULES
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Apply the rule to a field name (`snake_case`) or variant name
    /// (`PascalCase`).
    pub fn apply(self, name: &str) -> String {
        let words = split_words(name);
        match self {
            Self::LowerCase => words.concat(),
            Self::UpperCase => words.concat().to_uppercase(),
            Self::CamelCase => words
                .iter()
                .enumerate()
                .map(|(index, word)| {
                    if index == 0 {
                        word.clone()
                    } else {
                        capitalize(word)
                    }
                })
                .collect(),
            Self::PascalCase => words.iter().map(|word| capitalize(word)).collect(),
            Self::SnakeCase => words.join("_"),
            Self::ScreamingSnakeCase => words.join("_").to_uppercase(),
            Self::KebabCase => words.join("-"),
            Self::ScreamingKebabCase => words.join("-").to_uppercase(),
        }
    }
}

/// Lower-case words of an identifier, split on `_` and on upper-case letters.
fn split_words(name: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c == '_' || (c.is_uppercase() && !current.is_empty()) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if c == '_' {
                continue;
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names() {
        let name = "page_size";
        assert_eq!(RenameRule::CamelCase.apply(name), "pageSize");
        assert_eq!(RenameRule::PascalCase.apply(name), "PageSize");
        assert_eq!(RenameRule::SnakeCase.apply(name), "page_size");
        assert_eq!(RenameRule::ScreamingSnakeCase.apply(name), "PAGE_SIZE");
        assert_eq!(RenameRule::KebabCase.apply(name), "page-size");
        assert_eq!(RenameRule::ScreamingKebabCase.apply(name), "PAGE-SIZE");
        assert_eq!(RenameRule::LowerCase.apply(name), "pagesize");
        assert_eq!(RenameRule::UpperCase.apply(name), "PAGESIZE");
    }

    #[test]
    fn variant_names() {
        let name = "InProgress";
        assert_eq!(RenameRule::SnakeCase.apply(name), "in_progress");
        assert_eq!(RenameRule::CamelCase.apply(name), "inProgress");
        assert_eq!(RenameRule::PascalCase.apply(name), "InProgress");
        assert_eq!(RenameRule::KebabCase.apply(name), "in-progress");
        assert_eq!(RenameRule::LowerCase.apply(name), "inprogress");
    }

    #[test]
    fn parse_known_rules() {
        assert_eq!(RenameRule::parse("camelCase"), Some(RenameRule::CamelCase));
        assert_eq!(RenameRule::parse("Camel"), None);
        assert!(RenameRule::expected().starts_with("lowercase, UPPERCASE"));
    }

    #[test]
    fn leading_and_repeated_underscores() {
        assert_eq!(split_words("_private__id"), ["private", "id"]);
        assert_eq!(RenameRule::CamelCase.apply("_private__id"), "privateId");
    }
}
