//! Local keyword screening for captions.

use regex_lite::Regex;

/// Case-insensitive keyword matcher over caption text.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Builds a filter; keywords are trimmed, lowercased and empty ones dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !unique.contains(&keyword) {
                unique.push(keyword);
            }
        }
        Self { keywords: unique }
    }

    /// Keywords that occur anywhere in `text`, each reported once.
    pub fn hits(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }

    /// Replaces whole-word keyword matches with asterisks.
    pub fn censor(&self, text: &str) -> String {
        let mut censored = text.to_string();
        for keyword in &self.keywords {
            let pattern = format!(r"(?i)\b{}\b", regex_lite::escape(keyword));
            if let Ok(re) = Regex::new(&pattern) {
                let stars = "*".repeat(keyword.chars().count());
                censored = re.replace_all(&censored, stars.as_str()).into_owned();
            }
        }
        censored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> KeywordFilter {
        KeywordFilter::new(["porn", " XXX ", "nsfw", ""])
    }

    #[test]
    fn test_hits_case_insensitive() {
        let f = filter();
        assert_eq!(f.hits("Totally SFW content"), Vec::<&str>::new());
        assert_eq!(f.hits("NSFW warning"), vec!["nsfw"]);
        assert_eq!(f.hits("xxx and porn"), vec!["porn", "xxx"]);
    }

    #[test]
    fn test_each_keyword_counts_once() {
        assert_eq!(filter().hits("nsfw nsfw nsfw").len(), 1);
    }

    #[test]
    fn test_censor_whole_words() {
        let f = filter();
        assert_eq!(f.censor("This is NSFW, sorry"), "This is ****, sorry");
        assert_eq!(f.censor("pornography"), "pornography");
    }
}
