#![forbid(unsafe_code)]

//! Dictionary spell checker.
//!
//! Text content is split into words on Unicode word boundaries. A word is
//! reported when its lowercase form is not in the dictionary; if a
//! dictionary word lies within [`MAX_SUGGESTION_DISTANCE`] edits, it is
//! offered as a suggestion. Tokens containing digits are never reported.
//!
//! Suggestions prefer the smallest edit distance, then the word that was
//! added first. The built-in list starts with the most common words.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use tracing::debug;
use treedit_core::ElementRef;
use treedit_runtime::{SpellChecker, SpellIssue};
use unicode_segmentation::UnicodeSegmentation;

/// Suggestions farther than this many edits are not offered.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

const BUILTIN_WORDS: &str = "
a about above after again against all also am an and any are as at
be because been before being below between both but by
can could did do does doing down during each few for from further
had has have having he her here hers herself him himself his how
i if in into is it its itself just me more most my myself no nor not now
of off on once only or other our ours ourselves out over own
same she should so some such than that the their theirs them themselves
then there these they this those through to too under until up upon us
very was we were what when where which while who whom why will with would
you your yours yourself yourselves
able across add added address after age ago air almost alone along already
always among amount another answer anything appear apple area around ask
away back bad base became become begin behind believe best better big
bird black blue board body book bottom box boy bring brought build built
call came car care carry case cat cause center change check child children
city class clear close cold color come common company complete contact
content copy country course cover cross cut dark data day dear deep
develop difference different direction discover distance document dog done
door draw dream drive dry early earth ease east eat edge edit editor else
end enough even evening ever every example eye face fact fall family far
farm fast father feel feet field figure file fill final find fine fire
first fish five flower fly follow food foot force form found four free
friend front full game gave general get girl give glass go gold good got
great green ground group grow guide half hand happen happy hard head hear
heard heart heat help high hill history hold home hope horse hot hour house
however hundred idea important inside interest island item keep kind king
know known land language large last late later laugh lead learn leave left
less let letter life light like line link list listen little live long look
lot love low made main make man many map mark may mean measure men might
mile mind minute miss model moment money month moon morning mother mountain
move much music must name near need never new next night note nothing
notice number object often oil old one open order page paper part pass past
people perhaps person picture piece place plain plan plant play point
position possible power press pretty problem product program pull put
question quick quickly quite rain ran reach read ready real reason record
red remember rest right river road rock room round rule run said saw say
school science sea second section see seem seen self sentence set several
shape ship short show side simple since sing sit six size sky small snow
soft something sometimes son song soon sound south space special spell
stand star start state stay step still stone stood stop story street strong
study style sun sure surface table take talk tell ten test text thank thing
think third thought three time title today together told took top toward
town tree true try turn two type understand unit use usual value voice walk
want warm watch water way week well went west white whole wide wind window
word work world write year yes yet young
hello hi welcome world web site home news contact blog post header footer
menu nav navigation main section article aside paragraph heading image
caption button link input form submit search login logout sign register
profile settings page home privacy terms copyright
";

/// Spell checker backed by a ranked word set.
#[derive(Debug, Clone)]
pub struct DictionaryChecker {
    /// Lowercase word -> insertion rank.
    words: HashMap<String, usize>,
}

impl Default for DictionaryChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryChecker {
    /// Checker with the built-in word list.
    #[must_use]
    pub fn new() -> Self {
        Self::empty().with_words(BUILTIN_WORDS.split_whitespace())
    }

    /// Checker with no words at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    /// Add words (case-insensitive).
    #[must_use]
    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend(words);
        self
    }

    fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim();
            if !word.is_empty() && !word.starts_with('#') {
                let rank = self.words.len();
                self.words.entry(word.to_lowercase()).or_insert(rank);
            }
        }
    }

    /// Load extra words from a file, one per line. Blank lines and lines
    /// starting with `#` are skipped. Returns the number of lines read.
    pub fn load_words(&mut self, path: impl AsRef<Path>) -> io::Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let before = self.words.len();
        let lines = content.lines().count();
        self.extend(content.lines());
        debug!(
            path = %path.display(),
            lines,
            added = self.words.len() - before,
            "loaded dictionary"
        );
        Ok(lines)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(&word.to_lowercase())
    }

    /// Closest dictionary word within [`MAX_SUGGESTION_DISTANCE`]; ties go
    /// to the earlier-added word.
    #[must_use]
    pub fn suggest(&self, word: &str) -> Option<&str> {
        let word = word.to_lowercase();
        let len = word.chars().count();
        self.words
            .iter()
            .filter(|(candidate, _)| {
                candidate.chars().count().abs_diff(len) <= MAX_SUGGESTION_DISTANCE
            })
            .map(|(candidate, &rank)| (edit_distance(&word, candidate), rank, candidate))
            .filter(|&(distance, _, _)| distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|&(distance, rank, _)| (distance, rank))
            .map(|(_, _, candidate)| candidate.as_str())
    }

    /// Issue message for `word`, or `None` if the word is fine.
    fn issue_for(&self, word: &str) -> Option<String> {
        if word.chars().any(|c| c.is_numeric()) || self.contains(word) {
            return None;
        }
        Some(match self.suggest(word) {
            Some(suggestion) => format!("unknown word '{word}' (did you mean '{suggestion}'?)"),
            None => format!("unknown word '{word}'"),
        })
    }
}

impl SpellChecker for DictionaryChecker {
    fn check(&self, root: ElementRef<'_>) -> Vec<SpellIssue> {
        let mut issues = Vec::new();
        for element in root.descendants() {
            for word in element.text().unicode_words() {
                if let Some(message) = self.issue_for(word) {
                    issues.push(SpellIssue::new(element.id(), message));
                }
            }
        }
        issues
    }
}

/// Edit distance over chars, counting insertions, deletions, substitutions
/// and swaps of adjacent chars as one edit each.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    // Rows for i-2, i-1 and i.
    let mut before: Vec<usize> = vec![0; b.len() + 1];
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (prev[j - 1] + cost).min(prev[j] + 1).min(curr[j - 1] + 1);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(before[j - 2] + 1);
            }
            curr[j] = best;
        }
        std::mem::swap(&mut before, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use treedit_core::Document;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("teh", "the"), 1);
        assert_eq!(edit_distance("ab", "ba"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("word", "world"), 1);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("café", "cafe"), 1);
    }

    #[test]
    fn test_suggestion_prefers_common_words() {
        let checker = DictionaryChecker::new();
        assert_eq!(checker.suggest("teh"), Some("the"));
        assert_eq!(checker.suggest("qqqqqq"), None);
    }

    #[test]
    fn test_builtin_words_are_known() {
        let checker = DictionaryChecker::new();
        for word in ["the", "Hello", "WORLD", "paragraph"] {
            assert!(checker.contains(word), "{word}");
        }
        assert!(!checker.contains("zzyzx"));
    }

    #[test]
    fn test_reports_unknown_words_with_suggestion() {
        let mut doc = Document::new();
        doc.add_element("p", "p1", "root", "Thier wrold, 2024 times").unwrap();
        doc.add_element("p", "p2", "root", "all good here").unwrap();

        let issues = DictionaryChecker::new().check(doc.root());
        assert_eq!(
            issues,
            vec![
                SpellIssue::new("p1", "unknown word 'Thier' (did you mean 'their'?)"),
                SpellIssue::new("p1", "unknown word 'wrold' (did you mean 'world'?)"),
                SpellIssue::new("p1", "unknown word 'times' (did you mean 'time'?)"),
            ]
        );
    }

    #[test]
    fn test_no_suggestion_when_too_far() {
        let checker = DictionaryChecker::empty().with_words(["cat"]);
        let mut doc = Document::new();
        doc.add_element("p", "p1", "root", "elephant cat").unwrap();
        assert_eq!(
            checker.check(doc.root()),
            vec![SpellIssue::new("p1", "unknown word 'elephant'")]
        );
    }

    #[test]
    fn test_issues_follow_document_order() {
        let checker = DictionaryChecker::empty();
        let mut doc = Document::new();
        doc.add_element("div", "outer", "root", "x").unwrap();
        doc.add_element("p", "inner", "outer", "y").unwrap();
        doc.add_element("p", "after", "root", "z").unwrap();
        let ids: Vec<String> = checker
            .check(doc.root())
            .into_iter()
            .map(|issue| issue.element_id)
            .collect();
        assert_eq!(ids, vec!["outer", "inner", "after"]);
    }

    #[test]
    fn test_load_words_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "# project words\ntreedit\n\nFrobnicate\n").unwrap();

        let mut checker = DictionaryChecker::empty();
        assert_eq!(checker.load_words(&path).unwrap(), 4);
        assert_eq!(checker.len(), 2);
        assert!(checker.contains("frobnicate"));
        assert!(checker.contains("TREEDIT"));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let mut checker = DictionaryChecker::empty();
        let err = checker.load_words("/definitely/not/here.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(checker.is_empty());
    }
}
