use crate::error::Result;
use crate::query::Language;
use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    // Accent-free forms; tokens are folded before lookup.
    static ref GREEK_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "ο","η","το","οι","τα","του","της","των","τον","την","τη","τους","τις","ενα","ενας","μια","μιας","ενος",
            "και","κι","κ","ειμαι","εισαι","ειναι","ειμαστε","ειστε","ηταν","ημουν","θα","να","δε","δεν","μη","μην",
            "με","σε","στο","στη","στην","στον","στα","στους","στις","στου","στης","για","απο","προς","κατα","μετα",
            "παρα","αντι","χωρις","ως","σαν","μεχρι","ωσπου","επι","υπο","δια","περι","ανα","εως",
            "αλλα","ομως","ουτε","ειτε","αν","οταν","αφου","ενω","επειδη","γιατι","οτι","πως","που","ποιος",
            "ποια","ποιο","ποιοι","ποιες","ποιων","ποιους","οπως","οπου","τι","αυτος","αυτη","αυτο","αυτοι","αυτες",
            "αυτα","αυτου","αυτης","αυτων","αυτον","αυτην","αυτους","εκεινος","εκεινη","εκεινο","εκεινοι","εκεινες",
            "εκεινα","τοτε","τωρα","ηδη","ακομα","ακομη","μονο","πολυ","πιο","λιγο","ολα","ολοι","ολες","ολη","ολο",
            "καθε","καποιος","καποια","καποιο","αλλος","αλλη","αλλο","αλλοι","αλλες","εγω","εσυ","εμεις","εσεις",
            "μου","σου","μας","σας","εδω","εκει","ετσι","επισης","λοιπον","ισως","μαλλον","ναι","οχι",
        ];
        words.iter().copied().collect()
    };
}

/// Grammatical hint passed to the stemmer. Snowball ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordClass {
    #[default]
    Noun,
    Verb,
}

/// Reduces a word to its radical. Output is lowercase and deterministic.
pub trait Stem {
    fn stem(&self, word: &str, hint: WordClass) -> Result<String>;
}

pub struct SnowballStemmer {
    inner: Stemmer,
}

impl SnowballStemmer {
    pub fn new(language: Language) -> Self {
        let algorithm = match language {
            Language::Greek => Algorithm::Greek,
            Language::English => Algorithm::English,
        };
        Self { inner: Stemmer::create(algorithm) }
    }
}

impl Stem for SnowballStemmer {
    fn stem(&self, word: &str, _hint: WordClass) -> Result<String> {
        Ok(self.inner.stem(&fold(word)).into_owned())
    }
}

pub fn stopwords(language: Language) -> &'static HashSet<&'static str> {
    match language {
        Language::Greek => &GREEK_STOPWORDS,
        Language::English => &ENGLISH_STOPWORDS,
    }
}

pub fn is_stopword(language: Language, token: &str) -> bool {
    let folded = fold(token);
    stopwords(language).contains(folded.as_str())
}

/// Lowercase and strip combining accents (`Κρίση` -> `κριση`).
pub fn fold(word: &str) -> String {
    word.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

/// Split a source line into display tokens on whitespace and periods.
pub fn line_tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == '.').filter(|t| !t.is_empty())
}

/// The word inside a display token, without surrounding punctuation.
pub fn word_core(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}
