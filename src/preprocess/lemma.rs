//! Rule-based English lemmatizer.
//!
//! Closed-class words (determiners, pronouns, prepositions, conjunctions,
//! auxiliaries, particles, interjections, numerals) yield `None`: only
//! nouns, adjectives, verbs and adverbs survive. Open-class words are
//! reduced with an irregular-form table, then with plural and verb-inflection
//! suffix rules.

use ahash::{AHashMap, AHashSet};

const CLOSED_CLASS: &[&str] = &[
    // determiners
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "either", "neither",
    "some", "any", "no", "another", "such", "what", "which", "whichever", "whatever", "all", "both",
    "few", "many", "much", "several", "enough", "own", "same",
    // pronouns
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "yourselves", "he", "him",
    "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our",
    "ours", "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom", "whose",
    "someone", "somebody", "something", "anyone", "anybody", "anything", "everyone", "everybody",
    "everything", "nobody", "nothing", "none", "one", "ones",
    // prepositions
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "besides", "between", "beyond", "by", "despite", "down",
    "during", "except", "for", "from", "in", "inside", "into", "near", "of", "off", "on", "onto",
    "out", "outside", "over", "past", "per", "since", "through", "throughout", "till", "toward",
    "towards", "under", "underneath", "until", "unto", "up", "upon", "via", "with", "within", "without",
    // conjunctions and subordinators
    "and", "or", "but", "nor", "so", "yet", "if", "because", "although", "though", "while", "whereas",
    "unless", "whether", "than", "as", "once", "lest",
    // auxiliaries and modals
    "am", "is", "are", "was", "were", "be", "been", "being", "do", "does", "did", "doing", "have",
    "has", "had", "having", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
    "ought", "ca", "wo", "sha",
    // particles
    "to", "not", "nt", "ll", "ve", "re",
    // interjections
    "oh", "hey", "hi", "hello", "yes", "yeah", "ok", "okay", "wow", "um", "uh", "please", "thanks",
    "thank", "ah", "hmm",
    // numerals
    "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven", "twelve",
    "twenty", "thirty", "forty", "fifty", "hundred", "thousand", "million", "billion",
];

const IRREGULAR: &[(&str, &str)] = &[
    // verbs
    ("went", "go"), ("gone", "go"), ("goes", "go"), ("made", "make"), ("got", "get"), ("gotten", "get"),
    ("gave", "give"), ("given", "give"), ("took", "take"), ("taken", "take"), ("came", "come"),
    ("saw", "see"), ("seen", "see"), ("knew", "know"), ("known", "know"), ("thought", "think"),
    ("found", "find"), ("told", "tell"), ("said", "say"), ("says", "say"), ("ran", "run"),
    ("began", "begin"), ("begun", "begin"), ("wrote", "write"), ("written", "write"), ("built", "build"),
    ("kept", "keep"), ("held", "hold"), ("brought", "bring"), ("bought", "buy"), ("sent", "send"),
    ("spent", "spend"), ("meant", "mean"), ("left", "leave"), ("felt", "feel"), ("led", "lead"),
    ("understood", "understand"), ("chose", "choose"), ("chosen", "choose"), ("broke", "break"),
    ("broken", "break"), ("drew", "draw"), ("drawn", "draw"), ("grew", "grow"), ("grown", "grow"),
    ("shown", "show"), ("lost", "lose"), ("paid", "pay"), ("stood", "stand"), ("taught", "teach"),
    ("sought", "seek"), ("fell", "fall"), ("fallen", "fall"), ("forgot", "forget"), ("forgotten", "forget"),
    ("became", "become"), ("ate", "eat"), ("eaten", "eat"), ("hid", "hide"), ("hidden", "hide"),
    ("dealt", "deal"), ("lying", "lie"), ("dying", "die"), ("tying", "tie"),
    // nouns
    ("children", "child"), ("men", "man"), ("women", "woman"), ("people", "people"), ("mice", "mouse"),
    ("feet", "foot"), ("teeth", "tooth"), ("matrices", "matrix"), ("vertices", "vertex"),
    ("indices", "index"), ("analyses", "analysis"), ("hypotheses", "hypothesis"), ("theses", "thesis"),
    ("bases", "basis"), ("axes", "axis"), ("phenomena", "phenomenon"), ("criteria", "criterion"),
    ("data", "datum"), ("spectra", "spectrum"), ("quanta", "quantum"), ("ansatze", "ansatz"),
    // adjectives and adverbs
    ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"), ("further", "far"),
    ("farther", "far"), ("less", "little"), ("least", "little"), ("more", "more"), ("most", "most"),
];

/// Open-class words whose endings look inflected but are not.
const KEEP_AS_IS: &[&str] = &[
    "thing", "string", "ring", "king", "bring", "spring", "morning", "evening", "ceiling", "wing",
    "swing", "sing", "sting", "nothing", "need", "seed", "speed", "feed", "bed", "red", "shed", "embed",
    "indeed", "breed", "proceed", "succeed", "exceed", "bias", "gas", "always", "perhaps",
    "physics", "mathematics", "statistics", "analysis", "basis", "thesis", "axis", "status", "virus",
    "bus", "plus", "minus", "bonus", "focus", "campus", "consensus", "calculus", "modulus", "radius",
    "corpus", "process", "access", "success", "less", "loss", "pass", "class", "mass", "cross", "boss",
    "chess", "gauss", "thus", "various", "previous", "serious", "obvious",
    "numerous", "continuous", "famous", "ambiguous", "anonymous", "analogous",
];

pub struct Lemmatizer {
    closed: AHashSet<&'static str>,
    irregular: AHashMap<&'static str, &'static str>,
    keep: AHashSet<&'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self {
            closed: CLOSED_CLASS.iter().copied().collect(),
            irregular: IRREGULAR.iter().copied().collect(),
            keep: KEEP_AS_IS.iter().copied().collect(),
        }
    }
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn has_vowel(s: &str) -> bool {
    s.bytes().any(|c| is_vowel(c) || c == b'y')
}

/// "runn" -> "run", "stopp" -> "stop"; "fill" and "pass" stay.
fn undouble(stem: &str) -> &str {
    let b = stem.as_bytes();
    let n = b.len();
    if n >= 3 && b[n - 1] == b[n - 2] && !is_vowel(b[n - 1]) && !matches!(b[n - 1], b'l' | b's' | b'z') {
        &stem[..n - 1]
    } else {
        stem
    }
}

impl Lemmatizer {
    pub fn is_content_word(&self, token: &str) -> bool {
        !self.closed.contains(token)
    }

    /// Lemma of a content word, `None` for closed-class tokens.
    pub fn lemmatize(&self, token: &str) -> Option<String> {
        if !self.is_content_word(token) {
            return None;
        }
        if let Some(l) = self.irregular.get(token) {
            return Some((*l).to_string());
        }
        if self.keep.contains(token) {
            return Some(token.to_string());
        }
        if !token.is_ascii() {
            return Some(token.to_string());
        }
        Some(self.reduce_suffix(token))
    }

    fn reduce_suffix(&self, t: &str) -> String {
        let n = t.len();
        if n > 4 && t.ends_with("ies") {
            return format!("{}y", &t[..n - 3]);
        }
        if n > 4 && t.ends_with("ied") {
            return format!("{}y", &t[..n - 3]);
        }
        if n > 4 && (t.ends_with("sses") || t.ends_with("shes") || t.ends_with("ches") || t.ends_with("xes") || t.ends_with("zes")) {
            return t[..n - 2].to_string();
        }
        if n > 5 && t.ends_with("ing") {
            let stem = &t[..n - 3];
            if has_vowel(stem) {
                return undouble(stem).to_string();
            }
        }
        if n > 4 && t.ends_with("ed") && !t.ends_with("eed") {
            let stem = &t[..n - 2];
            if has_vowel(stem) {
                return undouble(stem).to_string();
            }
        }
        if n > 3 && t.ends_with('s') && !t.ends_with("ss") && !t.ends_with("us") && !t.ends_with("is") {
            return t[..n - 1].to_string();
        }
        t.to_string()
    }

    /// Lemmatize a token sequence, dropping closed-class tokens.
    pub fn lemmatize_all(&self, tokens: &[String]) -> Vec<String> {
        tokens.iter().filter_map(|t| self.lemmatize(t)).collect()
    }
}
