//! Emoji decoration for portfolio names.

/// Ordered (substring, emoji) rules. The first rule whose pattern occurs in
/// the lowercased name wins, so more specific patterns must come first.
const RULES: &[(&str, &str)] = &[
    ("fii", "🏢"),
    ("fiis", "🏢"),
    ("fundos listados", "🏢"),
    ("dividendo", "💰"),
    ("dividend", "💰"),
    ("ações", "📈"),
    ("ação", "📈"),
    ("small cap", "🚀"),
    ("bdr", "🌎"),
    ("global", "🌐"),
    ("etf", "🌐"),
    ("internacional", "🌍"),
    ("bunker", "🛡️"),
    ("multi", "🎯"),
    ("quant", "🤖"),
    ("horizonte", "🔭"),
    ("híbrida", "⚖️"),
    ("renda", "💵"),
    ("wisir", "🧠"),
    ("levante", "🔥"),
    ("eleven", "⭐"),
    ("benndorf", "🏛️"),
    ("gráfica", "📊"),
    ("mensal", "📅"),
    ("top", "🏆"),
    ("mix", "🔀"),
];

const FALLBACK: &str = "📁";

/// Emoji for a portfolio name.
pub fn emoji_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    RULES
        .iter()
        .find(|(pattern, _)| lower.contains(*pattern))
        .map_or(FALLBACK, |&(_, emoji)| emoji)
}

/// `"<emoji> <name>"`.
pub fn decorate(name: &str) -> String {
    format!("{} {name}", emoji_for(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        // "Renda" also matches, but "fii" comes first.
        assert_eq!(emoji_for("FII Renda Mensal"), "🏢");
        assert_eq!(emoji_for("Carteira Dividendos"), "💰");
        assert_eq!(emoji_for("AÇÕES Small Cap"), "📈");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(emoji_for("Sem Categoria"), "📁");
        assert_eq!(decorate("Outros"), "📁 Outros");
    }
}
