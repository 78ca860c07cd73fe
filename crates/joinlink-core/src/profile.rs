//! Reader/writer for Refractor `.con` profile files.
//!
//! A line is `Object.method value`, e.g. `LocalProfile.setName "Player"`.
//! Lines that do not fit the shape are dropped on parse. A key can appear more
//! than once; [`ConFile::get`] joins its values with `;`.

use crate::config::LaunchDefaults;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConEntry {
    key: String,
    /// Raw value tokens, quotes preserved.
    values: Vec<String>,
}

/// Parsed contents of a `.con` file, keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConFile {
    entries: Vec<ConEntry>,
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}

fn is_comment(line: &str) -> bool {
    let mut words = line.split_whitespace();
    matches!(words.next(), Some(word) if word.eq_ignore_ascii_case("rem"))
}

impl ConFile {
    /// Parse file contents.
    pub fn parse(content: &str) -> Self {
        let mut file = ConFile::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || is_comment(line) {
                continue;
            }

            let Some((key, value)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() || !key.contains('.') {
                continue;
            }

            file.push(key, value.to_string());
        }

        file
    }

    fn push(&mut self, key: &str, raw_value: String) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.values.push(raw_value),
            None => self.entries.push(ConEntry {
                key: key.to_string(),
                values: vec![raw_value],
            }),
        }
    }

    /// Unquoted value of a key; repeated keys are joined with `;`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.iter().find(|e| e.key == key).map(|entry| {
            entry
                .values
                .iter()
                .map(|v| unquote(v))
                .collect::<Vec<_>>()
                .join(LaunchDefaults::PROFILE_VALUE_SEPARATOR)
        })
    }

    /// Replace every value of `key` with a single quoted value.
    pub fn set(&mut self, key: &str, value: &str) {
        let quoted = format!("\"{}\"", value);
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.values = vec![quoted],
            None => self.entries.push(ConEntry {
                key: key.to_string(),
                values: vec![quoted],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back to file contents, one line per value, CRLF-terminated.
    pub fn to_con_string(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            for value in &entry.values {
                out.push_str(&entry.key);
                out.push(' ');
                out.push_str(value);
                out.push_str("\r\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL_CON: &str = "GlobalSettings.setDefaultUser \"0001\"\r\n\
        GlobalSettings.setNamePrefix \"\"\r\n\
        rem written by the game\r\n\
        garbage\r\n\
        \r\n\
        GlobalSettings.setServerFilter \"a\"\r\n\
        GlobalSettings.setServerFilter \"b\"\r\n";

    #[test]
    fn test_parse_reads_quoted_values() {
        let file = ConFile::parse(GLOBAL_CON);
        assert_eq!(
            file.get("GlobalSettings.setDefaultUser").as_deref(),
            Some("0001")
        );
        assert_eq!(file.get("GlobalSettings.setNamePrefix").as_deref(), Some(""));
    }

    #[test]
    fn test_malformed_and_comment_lines_are_ignored() {
        let file = ConFile::parse(GLOBAL_CON);
        assert_eq!(file.len(), 3);
        assert_eq!(file.get("garbage"), None);
        assert_eq!(ConFile::parse("novalue.key\nnodot value\n").len(), 0);
    }

    #[test]
    fn test_duplicate_keys_are_joined() {
        let file = ConFile::parse(GLOBAL_CON);
        assert_eq!(
            file.get("GlobalSettings.setServerFilter").as_deref(),
            Some("a;b")
        );
    }

    #[test]
    fn test_set_replaces_all_values_and_keeps_order() {
        let mut file = ConFile::parse(GLOBAL_CON);
        file.set("GlobalSettings.setServerFilter", "c");
        file.set("GlobalSettings.setDefaultUser", "0002");
        file.set("GlobalSettings.setNew", "x y");

        assert_eq!(
            file.to_con_string(),
            "GlobalSettings.setDefaultUser \"0002\"\r\n\
             GlobalSettings.setNamePrefix \"\"\r\n\
             GlobalSettings.setServerFilter \"c\"\r\n\
             GlobalSettings.setNew \"x y\"\r\n"
        );
    }

    #[test]
    fn test_unquoted_numbers_survive_rewrite() {
        let file = ConFile::parse("LocalProfile.setTotalPlayedTime 1234\n");
        assert_eq!(file.to_con_string(), "LocalProfile.setTotalPlayedTime 1234\r\n");
    }
}
