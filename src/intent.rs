//! Heuristic intent classifier for reply text.
//!
//! Maps assistant reply text to one of 8 coarse semantic intents used for
//! motion selection. Rules are evaluated in fixed priority order (first
//! match wins); each rule is a disjunction of case-insensitive English and
//! Chinese patterns. The ordering is a deliberate tie-break: the specific
//! buckets (greeting/thanks/apology/affirm) are checked before the generic
//! exclaim/question buckets, so "Thank you!" classifies as thanks, and
//! affirm is checked before negate so phrases like "no problem" are not
//! consumed by the negate rule.

/// Coarse semantic category assigned to reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Greeting,
    Thanks,
    Apology,
    Affirm,
    Negate,
    Exclaim,
    Question,
    Neutral,
}

// ── Pattern tables ──────────────────────────────────────────────────────
//
// `words` match on word boundaries in the lowercased text (so "no" never
// fires inside "know"); `phrases` match as substrings and carry the
// multi-word English patterns and all Chinese patterns.

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "greetings", "welcome"];
const GREETING_PHRASES: &[&str] = &[
    "good morning",
    "good afternoon",
    "good evening",
    "你好",
    "您好",
    "大家好",
    "早上好",
    "下午好",
    "晚上好",
    "嗨",
    "哈喽",
    "欢迎",
];

const THANKS_WORDS: &[&str] = &["thanks", "thank", "thx", "grateful"];
const THANKS_PHRASES: &[&str] = &["appreciate it", "谢谢", "多谢", "感谢", "辛苦了"];

const APOLOGY_WORDS: &[&str] = &["sorry", "apologies", "apologize", "apologise"];
const APOLOGY_PHRASES: &[&str] = &[
    "my bad",
    "excuse me",
    "对不起",
    "抱歉",
    "不好意思",
    "请原谅",
];

const AFFIRM_WORDS: &[&str] = &["yes", "yeah", "yep", "sure", "ok", "okay", "correct"];
const AFFIRM_PHRASES: &[&str] = &[
    "of course",
    "no problem",
    "好的",
    "是的",
    "没问题",
    "当然",
    "可以",
    "没错",
];

const NEGATE_WORDS: &[&str] = &["no", "nope", "not", "never", "cannot"];
const NEGATE_PHRASES: &[&str] = &[
    "can't", "won't", "don't", "不是", "不行", "没有", "不可以", "不要",
];

const EXCLAIM_WORDS: &[&str] = &["wow", "amazing", "awesome", "incredible", "unbelievable"];
const EXCLAIM_PHRASES: &[&str] = &["太棒了", "太好了", "厉害", "哇", "真棒"];

const QUESTION_WORDS: &[&str] = &[
    "what", "who", "whom", "when", "where", "why", "how", "which",
];
const QUESTION_PHRASES: &[&str] = &["吗", "什么", "为什么", "怎么", "哪里", "是不是", "多少", "谁"];

/// Classify reply text into an [`Intent`].
///
/// Pure function; empty or unmatched text is [`Intent::Neutral`].
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let trimmed = lower.trim_end();

    if matches_rule(&lower, GREETING_WORDS, GREETING_PHRASES) {
        return Intent::Greeting;
    }
    if matches_rule(&lower, THANKS_WORDS, THANKS_PHRASES) {
        return Intent::Thanks;
    }
    if matches_rule(&lower, APOLOGY_WORDS, APOLOGY_PHRASES) {
        return Intent::Apology;
    }
    if matches_rule(&lower, AFFIRM_WORDS, AFFIRM_PHRASES) {
        return Intent::Affirm;
    }
    if matches_rule(&lower, NEGATE_WORDS, NEGATE_PHRASES) {
        return Intent::Negate;
    }
    // Exclaim: trailing exclamation mark or excitement words. Question
    // marks belong to the question rule below.
    if trimmed.ends_with('!')
        || trimmed.ends_with('！')
        || matches_rule(&lower, EXCLAIM_WORDS, EXCLAIM_PHRASES)
    {
        return Intent::Exclaim;
    }
    if lower.contains('?')
        || lower.contains('？')
        || matches_rule(&lower, QUESTION_WORDS, QUESTION_PHRASES)
    {
        return Intent::Question;
    }
    Intent::Neutral
}

fn matches_rule(lower: &str, words: &[&str], phrases: &[&str]) -> bool {
    words.iter().any(|w| contains_word(lower, w))
        || phrases.iter().any(|p| lower.contains(p))
}

/// Substring match constrained to word boundaries (non-alphanumeric or
/// string edges on both sides).
fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(i, _)| {
        let before_ok = text[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = text[i + word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Priority ordering ───────────────────────────────────────────────

    #[test]
    fn thanks_wins_over_exclaim() {
        assert_eq!(classify("Thank you so much!"), Intent::Thanks);
    }

    #[test]
    fn greeting_wins_over_question() {
        assert_eq!(classify("Hello, how are you?"), Intent::Greeting);
    }

    #[test]
    fn affirm_wins_over_negate_on_no_problem() {
        assert_eq!(classify("No problem at all."), Intent::Affirm);
    }

    #[test]
    fn apology_wins_over_negate() {
        assert_eq!(classify("Sorry, I can't do that."), Intent::Apology);
    }

    // ── Bilingual patterns ──────────────────────────────────────────────

    #[test]
    fn chinese_thanks() {
        assert_eq!(classify("谢谢"), Intent::Thanks);
    }

    #[test]
    fn chinese_greeting() {
        assert_eq!(classify("你好"), Intent::Greeting);
    }

    #[test]
    fn chinese_apology() {
        assert_eq!(classify("不好意思，我来晚了"), Intent::Apology);
    }

    #[test]
    fn chinese_question_particle() {
        assert_eq!(classify("这样可以吗"), Intent::Affirm); // 可以 fires first
        assert_eq!(classify("在哪里"), Intent::Question);
    }

    #[test]
    fn chinese_negate() {
        assert_eq!(classify("不行"), Intent::Negate);
    }

    // ── English patterns ────────────────────────────────────────────────

    #[test]
    fn english_question() {
        assert_eq!(classify("What time is it?"), Intent::Question);
    }

    #[test]
    fn question_without_mark() {
        assert_eq!(classify("where is the station"), Intent::Question);
    }

    #[test]
    fn exclaim_on_trailing_bang() {
        assert_eq!(classify("Let's go!"), Intent::Exclaim);
    }

    #[test]
    fn exclaim_on_excitement_word() {
        assert_eq!(classify("wow that is something"), Intent::Exclaim);
    }

    #[test]
    fn negate_requires_word_boundary() {
        // "no" inside "know" or "normal" must not fire.
        assert_eq!(classify("I know the normal routine"), Intent::Neutral);
        assert_eq!(classify("no, that is wrong"), Intent::Negate);
    }

    #[test]
    fn affirm_plain() {
        assert_eq!(classify("Yes, I will."), Intent::Affirm);
    }

    // ── Edge cases ──────────────────────────────────────────────────────

    #[test]
    fn empty_text_is_neutral() {
        assert_eq!(classify(""), Intent::Neutral);
    }

    #[test]
    fn plain_statement_is_neutral() {
        assert_eq!(classify("The weather report is ready."), Intent::Neutral);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(classify("HELLO THERE"), Intent::Greeting);
        assert_eq!(classify("THANKS"), Intent::Thanks);
    }

    #[test]
    fn fullwidth_punctuation() {
        assert_eq!(classify("走吧！"), Intent::Exclaim);
        assert_eq!(classify("几点了？"), Intent::Question);
    }
}
