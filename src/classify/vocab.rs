//! Controlled vocabularies for field classification.

/// Beverage class/type keywords that anchor a class/type phrase.
pub const SPIRIT_TYPES: &[&str] = &[
    "whisky", "whiskey", "bourbon", "vodka", "rum", "gin", "tequila", "brandy", "rye", "scotch",
    "cognac", "mezcal", "liqueur", "absinthe", "vermouth", "malt",
];

/// Descriptor words that commonly precede a spirit type on a label.
pub const SPIRIT_DESCRIPTORS: &[&str] = &[
    "straight", "single", "barrel", "double", "aged", "small", "batch", "blended", "pure",
    "premium", "rare", "reserve", "select", "special", "cask", "strength", "malt", "grain",
    "kentucky", "tennessee", "irish", "japanese", "canadian", "american", "extra", "anejo",
    "reposado", "blanco",
];

/// Structural words that are definitely not part of a brand name.
const STRUCTURAL_WORDS: &[&str] = &[
    "distilled", "bottled", "produced", "imported", "brewed", "by:", "by", "and", "the", "of",
    "a", "an", "government", "warning", "according", "surgeon", "general", "net", "contents",
    "alcohol", "alc", "vol", "proof", "ml", "l", "oz", "liter", "litre",
];

/// Whether a lowercased token is excluded from brand-name candidacy.
pub fn is_stop_word(lower: &str) -> bool {
    STRUCTURAL_WORDS.contains(&lower)
        || SPIRIT_TYPES.contains(&lower)
        || SPIRIT_DESCRIPTORS.contains(&lower)
}

/// Whether a lowercased token is a spirit type keyword.
pub fn is_spirit_type(lower: &str) -> bool {
    SPIRIT_TYPES.contains(&lower)
}

/// Whether a lowercased token may extend a class/type phrase.
pub fn is_descriptor_or_type(lower: &str) -> bool {
    SPIRIT_DESCRIPTORS.contains(&lower) || SPIRIT_TYPES.contains(&lower)
}
