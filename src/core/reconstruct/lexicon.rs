use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Common English words matched against raw letter sequences.
pub static COMMON_WORDS: &[&str] = &[
    // 1 letter
    "a", "i",
    // 2 letters
    "am", "an", "as", "at", "be", "by", "do", "go", "he", "hi", "if", "in", "is", "it", "me",
    "my", "no", "of", "ok", "on", "or", "so", "to", "up", "us", "we",
    // 3 letters
    "all", "and", "any", "are", "ask", "bad", "big", "boy", "but", "buy", "can", "car", "cat",
    "dad", "day", "did", "dog", "eat", "end", "eye", "far", "few", "for", "fun", "get", "god",
    "got", "guy", "had", "has", "her", "him", "his", "hot", "how", "its", "job", "joy", "key",
    "kid", "let", "lot", "man", "may", "mom", "mrs", "new", "not", "now", "off", "old", "one",
    "our", "out", "own", "pay", "put", "ran", "run", "sad", "sat", "saw", "say", "see", "set",
    "she", "sit", "six", "son", "ten", "the", "too", "top", "try", "two", "use", "war", "was",
    "way", "who", "why", "win", "won", "yes", "yet", "you",
    // 4 letters
    "able", "also", "back", "ball", "bank", "been", "best", "bill", "body", "book", "both",
    "call", "came", "city", "come", "cool", "dark", "data", "deal", "does", "done", "door",
    "down", "each", "east", "easy", "else", "even", "ever", "face", "fact", "fall", "feel",
    "find", "fire", "food", "four", "free", "from", "full", "game", "gave", "girl", "give",
    "glad", "goes", "gone", "good", "grow", "hair", "half", "hand", "hard", "have", "head",
    "hear", "help", "here", "high", "hold", "home", "hope", "hour", "idea", "into", "just",
    "keep", "kind", "knew", "know", "land", "last", "late", "left", "less", "life", "like",
    "line", "live", "long", "look", "love", "made", "main", "make", "many", "meet", "mind",
    "more", "most", "move", "much", "must", "name", "near", "need", "next", "nice", "none",
    "once", "only", "open", "over", "paid", "part", "pass", "past", "pick", "plan", "play",
    "read", "real", "rest", "road", "room", "safe", "said", "same", "save", "seen", "self",
    "send", "show", "side", "sign", "size", "some", "soon", "stay", "stop", "such", "sure",
    "take", "talk", "tell", "text", "than", "that", "them", "then", "they", "this", "thus",
    "time", "told", "took", "tree", "true", "turn", "type", "upon", "used", "user", "very",
    "view", "wait", "walk", "wall", "want", "week", "well", "went", "were", "west", "what",
    "when", "will", "with", "word", "work", "year", "your",
    // 5 letters
    "about", "above", "after", "again", "being", "below", "black", "bring", "cause", "child",
    "clear", "close", "could", "doing", "early", "every", "field", "first", "found", "front",
    "given", "going", "great", "green", "group", "happy", "heard", "heart", "hello", "house",
    "human", "known", "large", "later", "learn", "leave", "level", "light", "local", "might",
    "money", "month", "never", "night", "often", "order", "other", "party", "peace", "place",
    "plant", "point", "power", "press", "quite", "ready", "right", "river", "round", "seems",
    "shall", "short", "shown", "since", "small", "sorry", "sound", "south", "space", "start",
    "state", "still", "study", "table", "taken", "thank", "their", "there", "these", "thing",
    "think", "third", "those", "three", "today", "under", "until", "using", "value", "voice",
    "watch", "water", "white", "whole", "woman", "women", "world", "would", "write", "wrong",
    "young",
    // 6+ letters
    "always", "around", "become", "before", "better", "called", "change", "coming", "enough",
    "family", "friend", "having", "itself", "little", "making", "matter", "minute", "moment",
    "mother", "number", "people", "person", "please", "rather", "really", "reason", "school",
    "should", "simple", "social", "system", "thanks", "things", "though", "toward", "wanted",
    "because", "between", "brought", "country", "during", "example", "father", "general",
    "getting", "however", "looking", "morning", "nothing", "problem", "program", "several",
    "special", "started", "through", "whether", "without", "working", "another", "together",
    "something", "government", "understand",
];

/// Lexicon indexed by word length, buckets sorted for deterministic scans.
#[derive(Debug, Clone)]
struct LexiconIndex {
    words: HashSet<String>,
    by_len: HashMap<usize, Vec<String>>,
}

impl LexiconIndex {
    fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self {
            words: HashSet::new(),
            by_len: HashMap::new(),
        };
        for word in words {
            let word = word.into();
            if word.is_empty() || !index.words.insert(word.clone()) {
                continue;
            }
            index.by_len.entry(word.len()).or_default().push(word);
        }
        for bucket in index.by_len.values_mut() {
            bucket.sort_unstable();
        }
        index
    }
}

static BUILTIN_INDEX: Lazy<LexiconIndex> =
    Lazy::new(|| LexiconIndex::from_words(COMMON_WORDS.iter().copied()));

/// Levenshtein edit distance, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let s: Vec<char> = a.chars().collect();
    let t: Vec<char> = b.chars().collect();
    if t.is_empty() {
        return s.len();
    }
    if s.is_empty() {
        return t.len();
    }

    let mut prev: Vec<usize> = (0..=t.len()).collect();
    let mut curr = vec![0usize; t.len() + 1];

    for (i, &cs) in s.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &ct) in t.iter().enumerate() {
            let insertion = prev[j + 1] + 1;
            let deletion = curr[j] + 1;
            let substitution = prev[j] + usize::from(cs != ct);
            curr[j + 1] = insertion.min(deletion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[t.len()]
}

/// 词典纠正器 - 有界编辑距离搜索的离线回退
///
/// Ties resolve deterministically: length buckets are scanned shortest
/// first and kept sorted, and only a strictly smaller distance replaces
/// the current best, so equally close candidates fall to the shortest,
/// then lexicographically smallest word.
pub struct DictionaryCorrector {
    index: LexiconIndex,
    max_distance: usize,
}

impl DictionaryCorrector {
    pub const DEFAULT_MAX_DISTANCE: usize = 2;

    pub fn new() -> Self {
        Self {
            index: BUILTIN_INDEX.clone(),
            max_distance: Self::DEFAULT_MAX_DISTANCE,
        }
    }

    pub fn with_lexicon<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index: LexiconIndex::from_words(words),
            max_distance: Self::DEFAULT_MAX_DISTANCE,
        }
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Best lexicon match for `raw`, or `raw` itself when nothing is close.
    ///
    /// Only words whose length is within `max_distance` of the input are
    /// considered. Never returns an empty string.
    pub fn correct(&self, raw: &str) -> String {
        let raw_lower = raw.to_lowercase();
        if self.index.words.contains(&raw_lower) {
            return raw_lower;
        }

        let raw_len = raw_lower.len();
        let min_len = raw_len.saturating_sub(self.max_distance).max(1);
        let mut best: Option<(usize, &str)> = None;

        for length in min_len..=raw_len + self.max_distance {
            let bucket = match self.index.by_len.get(&length) {
                Some(bucket) => bucket,
                None => continue,
            };
            for word in bucket {
                let dist = levenshtein(&raw_lower, word);
                if best.map_or(true, |(best_dist, _)| dist < best_dist) {
                    best = Some((dist, word));
                    if dist == 0 {
                        return word.clone();
                    }
                }
            }
        }

        match best {
            Some((dist, word)) if dist <= self.max_distance => word.to_string(),
            _ => raw.to_string(),
        }
    }
}

impl Default for DictionaryCorrector {
    fn default() -> Self {
        Self::new()
    }
}
