//! Built-in keyword taxonomy
//!
//! Used when no taxonomy file is configured. Order is priority: an item
//! mentioning both a missile strike and sanctions is filed as military.

use crate::model::CategorySpec;

fn category(
    id: &str,
    label: &str,
    words: &[&str],
    substrings: &[&str],
    regexes: &[&str],
) -> CategorySpec {
    CategorySpec {
        id: id.to_string(),
        label: label.to_string(),
        words: words.iter().map(|s| s.to_string()).collect(),
        substrings: substrings.iter().map(|s| s.to_string()).collect(),
        regexes: regexes.iter().map(|s| s.to_string()).collect(),
    }
}

/// The default category list, in priority order
pub fn builtin_categories() -> Vec<CategorySpec> {
    vec![
        category(
            "military",
            "⚔️ Military action, weapons or defence",
            &[
                "missile", "missiles", "drone", "drones", "uav", "tank", "tanks", "artillery",
                "airstrike", "air strike", "offensive", "invasion", "shelling", "troops",
                "nato", "navy", "warship", "nuclear", "hypersonic", "sarmat", "avangard",
                "kalibr", "wagner", "mobilization", "mobilisation", "frontline",
                "ракета", "ракеты", "дрон", "дроны", "беспилотник", "беспилотники",
                "обстрел", "наступление", "мобилизация", "ракети", "обстріл",
            ],
            &["导弹", "无人机", "军队"],
            &[r"\bmilitary\s+exercis\w*", r"\bstrategic\s+forces\b"],
        ),
        category(
            "sanctions_economy",
            "📊 Sanctions, restrictions or economic pressure",
            &[
                "sanction", "sanctions", "embargo", "blacklist", "frozen assets", "price cap",
                "import ban", "export ban", "export controls", "gazprom", "novatek", "rosneft",
                "nord stream", "turkstream", "ruble", "rouble", "swift", "central bank",
                "oil price", "gas price", "inflation",
                "санкции", "санкций", "эмбарго", "рубль", "рубля", "газпром", "роснефть",
                "инфляция", "санкції",
            ],
            &["制裁"],
            &[],
        ),
        category(
            "crypto_finance",
            "💸 Crypto and digital finance",
            &[
                "bitcoin", "btc", "ethereum", "crypto", "cryptocurrency", "stablecoin",
                "tether", "usdt", "digital ruble", "cbdc", "blockchain", "crypto exchange",
                "биткоин", "криптовалюта", "криптовалюты", "цифровой рубль", "стейблкоин",
            ],
            &["比特币", "加密货币"],
            &[],
        ),
        category(
            "public_health",
            "🩺 Public health",
            &[
                "pandemic", "epidemic", "outbreak", "vaccine", "vaccination", "covid",
                "measles", "cholera", "bird flu", "avian influenza", "world health organization",
                "эпидемия", "пандемия", "вакцина", "вспышка", "ковид",
            ],
            &["疫情", "疫苗"],
            &[],
        ),
        category(
            "diplomacy",
            "🤝 Diplomatic talks and contacts",
            &[
                "talks", "negotiations", "summit", "ceasefire", "truce", "peace deal",
                "peace plan", "ambassador", "foreign minister", "lavrov", "peskov",
                "grain deal", "security guarantees",
                "переговоры", "саммит", "перемирие", "посол", "лавров", "песков",
                "переговори",
            ],
            &["谈判", "峰会"],
            &[r"\bdiplomat\w*", r"\bnegotiat\w*"],
        ),
        category(
            "geopolitics",
            "🌐 Russia, Ukraine and the wider region",
            &[
                "russia", "russian", "russians", "putin", "kremlin", "moscow", "ukraine",
                "ukrainian", "kyiv", "kiev", "zelensky", "zelenskyy", "crimea", "donbas",
                "donetsk", "luhansk", "kharkiv", "kherson", "odesa", "belarus", "moldova",
                "georgia", "armenia", "azerbaijan", "kazakhstan", "baltic", "brics", "eaeu",
                "csto", "transnistria",
                "россия", "россии", "путин", "кремль", "москва", "украина", "украины",
                "киев", "зеленский", "крым", "донбасс", "беларусь", "україна", "київ",
            ],
            &["俄罗斯", "乌克兰"],
            &[],
        ),
    ]
}
