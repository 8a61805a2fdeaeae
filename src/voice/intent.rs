//! Keyword-based intent parsing for spoken replies.
//!
//! [`IntentParser`] lower-cases a transcript, strips punctuation and matches
//! whole words / phrases against static keyword tables. Tables are checked
//! in order and the first hit wins, so more specific phrases ("stop talking",
//! "not bad", "average pace") sit before the shorter words they contain.
//!
//! Stopping the run only counts when the stop phrase opens the utterance, so
//! "don't stop me now" inside a check-in answer never ends a session.

use serde::{Deserialize, Serialize};

use crate::session::SessionCommand;

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// A metric the runner can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsMetric {
    CurrentPace,
    AveragePace,
    Distance,
    ElapsedTime,
    HeartRate,
    Zone,
    LastSplit,
}

impl StatsMetric {
    pub fn label(self) -> &'static str {
        match self {
            StatsMetric::CurrentPace => "pace",
            StatsMetric::AveragePace => "average pace",
            StatsMetric::Distance => "distance",
            StatsMetric::ElapsedTime => "time",
            StatsMetric::HeartRate => "heart rate",
            StatsMetric::Zone => "zone",
            StatsMetric::LastSplit => "last split",
        }
    }
}

/// How the runner says they feel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// What a transcript asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    StatsRequest { metric: StatsMetric },
    Command { command: SessionCommand },
    FeelingResponse { sentiment: Sentiment },
    Unknown,
}

// ---------------------------------------------------------------------------
// Static keyword tables
// ---------------------------------------------------------------------------

struct KeywordRule<T: 'static> {
    value: T,
    phrases: &'static [&'static str],
}

static COMMANDS: &[KeywordRule<SessionCommand>] = &[
    KeywordRule {
        value: SessionCommand::Unmute,
        phrases: &["unmute", "start talking", "talk to me", "voice on", "sound on"],
    },
    KeywordRule {
        value: SessionCommand::Mute,
        phrases: &[
            "mute",
            "stop talking",
            "be quiet",
            "quiet",
            "shut up",
            "silence",
            "voice off",
        ],
    },
    KeywordRule {
        value: SessionCommand::Pause,
        phrases: &["pause", "hold on", "take a break"],
    },
    KeywordRule {
        value: SessionCommand::Resume,
        phrases: &["resume", "unpause", "continue", "keep going", "start again"],
    },
    KeywordRule {
        value: SessionCommand::Stop,
        phrases: &["stop", "end run", "end the run", "finish run", "end workout", "im done"],
    },
];

/// Words allowed in front of a stop phrase ("ok stop", "please end the run").
const LEADING_FILLER: &[&str] = &[
    "ok", "okay", "please", "hey", "coach", "alright", "yeah", "so", "lets",
];

/// Words that flip a positive feeling word up to two words after them.
const NEGATIONS: &[&str] = &["not", "never", "isnt", "arent", "wasnt", "dont", "hardly"];

static METRICS: &[KeywordRule<StatsMetric>] = &[
    KeywordRule {
        value: StatsMetric::LastSplit,
        phrases: &["last split", "split", "splits", "lap", "last kilometer", "last mile"],
    },
    KeywordRule {
        value: StatsMetric::AveragePace,
        phrases: &["average pace", "avg pace", "average speed", "overall pace"],
    },
    KeywordRule {
        value: StatsMetric::Zone,
        phrases: &["zone", "heart zone", "hr zone"],
    },
    KeywordRule {
        value: StatsMetric::HeartRate,
        phrases: &["heart rate", "heart", "pulse", "bpm"],
    },
    KeywordRule {
        value: StatsMetric::CurrentPace,
        phrases: &["pace", "how fast", "speed"],
    },
    KeywordRule {
        value: StatsMetric::Distance,
        phrases: &["distance", "how far", "kilometers", "km", "miles", "how many k"],
    },
    KeywordRule {
        value: StatsMetric::ElapsedTime,
        phrases: &["time", "how long", "elapsed", "duration", "minutes"],
    },
];

static SENTIMENTS: &[KeywordRule<Sentiment>] = &[
    KeywordRule {
        value: Sentiment::Neutral,
        phrases: &["not bad", "okay", "ok", "fine", "alright", "all right", "so so", "meh"],
    },
    KeywordRule {
        value: Sentiment::Negative,
        phrases: &[
            "not good",
            "not great",
            "tired",
            "exhausted",
            "bad",
            "terrible",
            "awful",
            "hard",
            "tough",
            "struggling",
            "hurts",
            "pain",
            "heavy",
            "dying",
        ],
    },
    KeywordRule {
        value: Sentiment::Positive,
        phrases: &[
            "good",
            "great",
            "amazing",
            "awesome",
            "strong",
            "fantastic",
            "excellent",
            "fresh",
            "easy",
            "better",
            "well",
        ],
    },
];

// ---------------------------------------------------------------------------
// IntentParser
// ---------------------------------------------------------------------------

/// Maps a transcript to one [`Intent`].
///
/// # Example
/// ```rust
/// use runaway_coach::voice::{Intent, IntentParser, Sentiment};
///
/// let parser = IntentParser::new();
/// assert_eq!(
///     parser.parse("Feeling great!", true),
///     Intent::FeelingResponse { sentiment: Sentiment::Positive }
/// );
/// assert_eq!(parser.parse("good", false), Intent::Unknown);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentParser;

impl IntentParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `text`.
    ///
    /// Feeling words only count when `expecting_feeling` is set (a check-in
    /// is pending or was answered moments ago). Commands win over everything
    /// else, except that a feeling answer outranks an incidental resume
    /// phrase ("keep going, feeling strong"). While a feeling is expected it
    /// also wins over a stats request.
    pub fn parse(&self, text: &str, expecting_feeling: bool) -> Intent {
        let padded = normalize(text);
        if padded.trim().is_empty() {
            return Intent::Unknown;
        }

        let command = match_command(&padded);
        let feeling = if expecting_feeling {
            match_sentiment(&padded)
        } else {
            None
        };

        match (command, feeling) {
            (Some(SessionCommand::Resume), Some(sentiment)) => Intent::FeelingResponse { sentiment },
            (Some(command), _) => Intent::Command { command },
            (None, Some(sentiment)) => Intent::FeelingResponse { sentiment },
            (None, None) => match first_match(METRICS, &padded) {
                Some(metric) => Intent::StatsRequest { metric },
                None => Intent::Unknown,
            },
        }
    }
}

/// Lower-case, drop apostrophes, turn other punctuation into spaces and pad
/// with one space on each side so phrases can be matched as ` phrase `.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch == '\'' || ch == '’' {
            continue;
        }
        if ch.is_alphanumeric() {
            out.push(ch);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

fn contains_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {phrase} "))
}

fn first_match<T: Copy>(rules: &[KeywordRule<T>], padded: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.phrases.iter().any(|phrase| contains_phrase(padded, phrase)))
        .map(|rule| rule.value)
}

fn match_command(padded: &str) -> Option<SessionCommand> {
    let opening = strip_leading_filler(padded);
    COMMANDS
        .iter()
        .find(|rule| {
            rule.phrases.iter().any(|phrase| match rule.value {
                SessionCommand::Stop => opening.starts_with(&format!(" {phrase} ")),
                _ => contains_phrase(padded, phrase),
            })
        })
        .map(|rule| rule.value)
}

/// `padded` with any [`LEADING_FILLER`] words removed, still padded.
fn strip_leading_filler(padded: &str) -> &str {
    let mut rest = padded;
    while let Some(word) = rest.split_whitespace().next() {
        if !LEADING_FILLER.contains(&word) {
            break;
        }
        // Keep the leading space of the next word.
        rest = &rest[1 + word.len()..];
    }
    rest
}

fn match_sentiment(padded: &str) -> Option<Sentiment> {
    match first_match(SENTIMENTS, padded)? {
        Sentiment::Positive if positive_is_negated(padded) => Some(Sentiment::Negative),
        sentiment => Some(sentiment),
    }
}

/// True when a positive word has a negation at most two words before it
/// ("not so good", "don't feel great").
fn positive_is_negated(padded: &str) -> bool {
    let positive: Vec<&str> = SENTIMENTS
        .iter()
        .filter(|rule| rule.value == Sentiment::Positive)
        .flat_map(|rule| rule.phrases.iter().copied())
        .collect();
    let words: Vec<&str> = padded.split_whitespace().collect();

    words.iter().enumerate().any(|(i, word)| {
        positive.contains(word)
            && words[i.saturating_sub(2)..i]
                .iter()
                .any(|before| NEGATIONS.contains(before))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
