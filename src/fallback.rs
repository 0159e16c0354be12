//! Alternate query phrasings for topics that under-supply results.
//!
//! Topic categories are matched by case-insensitive substring over both
//! English labels and Turkish phrasings, so classifier output
//! (`"black_circle"`) and free text (`"göz altı kremi"`) land in the
//! same bucket. The table is additive: a new category is one more row.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TopicCategory {
    UnderEye,
    Acne,
    Wrinkle,
    Stain,
    Pore,
}

struct CategoryRule {
    category: TopicCategory,
    keywords: &'static [&'static str],
    alternates: &'static [&'static str],
}

static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: TopicCategory::UnderEye,
        keywords: &["black_circle", "göz altı"],
        alternates: &[
            "göz altı bakım kremi trendyol",
            "göz çevresi bakım kremi trendyol",
            "göz altı morluk kremi trendyol",
        ],
    },
    CategoryRule {
        category: TopicCategory::Acne,
        keywords: &["acne", "akne"],
        alternates: &[
            "akne karşıtı krem trendyol",
            "sivilce kremi trendyol",
            "akne bakım seti trendyol",
        ],
    },
    CategoryRule {
        category: TopicCategory::Wrinkle,
        keywords: &["wrinkle", "kırışık"],
        alternates: &[
            "kırışıklık karşıtı krem trendyol",
            "anti aging krem trendyol",
            "yaşlanma karşıtı serum trendyol",
        ],
    },
    CategoryRule {
        category: TopicCategory::Stain,
        keywords: &["stain", "leke"],
        alternates: &[
            "leke karşıtı krem trendyol",
            "cilt lekesi kremi trendyol",
            "leke giderici serum trendyol",
        ],
    },
    CategoryRule {
        category: TopicCategory::Pore,
        keywords: &["pockmark", "gözenek"],
        alternates: &[
            "gözenek sıkılaştırıcı krem trendyol",
            "gözenek bakım kremi trendyol",
            "gözenek minimizer trendyol",
        ],
    },
];

/// Rephrasings tried by the search client when the under-eye category
/// returns no items at all; these keep the site filter inline.
pub(crate) static UNDER_EYE_RETRY_QUERIES: &[&str] = &[
    "göz altı morluk kremi",
    "göz altı halkası kremi",
    "dark circle eye cream",
    "göz çevresi bakım kremi",
];

pub(crate) fn category_for(topic: &str) -> Option<TopicCategory> {
    let lower = topic.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.category)
}

/// Alternate queries for a topic, in randomized order.
///
/// Topics outside the known categories get three generic skin-care
/// phrasings built from the topic's first word.
pub(crate) fn alternate_queries(topic: &str, rng: &mut StdRng) -> Vec<String> {
    let lower = topic.to_lowercase();
    let mut alternates: Vec<String> = match CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
    {
        Some(rule) => rule.alternates.iter().map(|s| s.to_string()).collect(),
        None => generic_alternates(topic),
    };
    alternates.shuffle(rng);
    alternates
}

fn generic_alternates(topic: &str) -> Vec<String> {
    let first_word = topic.split_whitespace().next().unwrap_or(topic);
    vec![
        format!("{first_word} cilt bakım trendyol"),
        format!("{first_word} yüz bakım trendyol"),
        format!("{first_word} dermokozmetik trendyol"),
    ]
}
