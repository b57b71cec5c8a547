// Closed category sets for expenses, revenues and investments, with their
// Portuguese display labels and keyword tables.

use serde::{Deserialize, Deserializer, Serialize};

use crate::classify::KeywordTable;

/// A closed category enumeration with an `other` sentinel.
pub trait Category: Copy + Eq + Sized + 'static {
    /// The sentinel returned when nothing matches.
    const OTHER: Self;

    /// Every member, in declaration order.
    fn all() -> &'static [Self];

    /// Canonical (stored) name, e.g. `fixed-income`.
    fn as_str(&self) -> &'static str;

    /// Portuguese display label.
    fn label(&self) -> &'static str;

    /// Keyword table used by [`crate::classify::normalize`].
    fn keywords() -> &'static KeywordTable<Self>;

    /// Exact, case-insensitive match against the canonical name or the
    /// label. Underscores are accepted in place of hyphens.
    fn from_canonical(text: &str) -> Option<Self> {
        let wanted = text.trim().to_lowercase().replace('_', "-");
        if wanted.is_empty() {
            return None;
        }
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted || c.label().to_lowercase() == wanted)
    }

    /// Decode a stored column value; unknown values read as `OTHER`.
    fn from_stored(text: &str) -> Self {
        Self::from_canonical(text).unwrap_or(Self::OTHER)
    }
}

// ---------------------------------------------------------------------------
// Stored values
// ---------------------------------------------------------------------------

/// Read a stored category column through [`Category::from_stored`]. Both
/// store backends decode through this, so labels and unknown values read the
/// same everywhere.
fn deserialize_stored<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: Category,
{
    let text = String::deserialize(deserializer)?;
    Ok(C::from_stored(&text))
}

macro_rules! deserialize_via_stored {
    ($($ty:ty),*) => {
        $(
            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    deserialize_stored(deserializer)
                }
            }
        )*
    };
}

deserialize_via_stored!(ExpenseCategory, RevenueCategory, InvestmentType);

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Housing,
    Leisure,
    Health,
    Other,
}

pub static EXPENSE_KEYWORDS: KeywordTable<ExpenseCategory> = KeywordTable::new(&[
    (
        ExpenseCategory::Food,
        &[
            "alimentação", "alimentacao", "comida", "almoço", "almoco", "jantar", "lanche",
            "café", "cafe", "restaurante", "mercado", "padaria", "ifood", "pizza",
            "hamburguer", "food",
        ],
    ),
    (
        ExpenseCategory::Transport,
        &[
            "transporte", "uber", "táxi", "taxi", "ônibus", "onibus", "metrô", "gasolina",
            "combustível", "combustivel", "estacionamento", "pedágio", "pedagio", "passagem",
            "transport",
        ],
    ),
    (
        ExpenseCategory::Housing,
        &[
            "moradia", "aluguel", "condomínio", "condominio", "conta de luz", "energia",
            "conta de água", "conta de agua", "internet", "iptu", "housing",
        ],
    ),
    (
        ExpenseCategory::Leisure,
        &[
            "lazer", "cinema", "show", "viagem", "festa", "netflix", "spotify", "streaming",
            "ingresso", "leisure",
        ],
    ),
    (
        ExpenseCategory::Health,
        &[
            "saúde", "saude", "farmácia", "farmacia", "remédio", "remedio", "médico", "medico",
            "consulta", "dentista", "hospital", "academia", "exame", "health",
        ],
    ),
]);

impl Category for ExpenseCategory {
    const OTHER: Self = ExpenseCategory::Other;

    fn all() -> &'static [Self] {
        &[
            ExpenseCategory::Food,
            ExpenseCategory::Transport,
            ExpenseCategory::Housing,
            ExpenseCategory::Leisure,
            ExpenseCategory::Health,
            ExpenseCategory::Other,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Housing => "housing",
            ExpenseCategory::Leisure => "leisure",
            ExpenseCategory::Health => "health",
            ExpenseCategory::Other => "other",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Alimentação",
            ExpenseCategory::Transport => "Transporte",
            ExpenseCategory::Housing => "Moradia",
            ExpenseCategory::Leisure => "Lazer",
            ExpenseCategory::Health => "Saúde",
            ExpenseCategory::Other => "Outros",
        }
    }

    fn keywords() -> &'static KeywordTable<Self> {
        &EXPENSE_KEYWORDS
    }
}

// ---------------------------------------------------------------------------
// Revenues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevenueCategory {
    Salary,
    Freelance,
    InvestmentIncome,
    Other,
}

pub static REVENUE_KEYWORDS: KeywordTable<RevenueCategory> = KeywordTable::new(&[
    (
        RevenueCategory::Salary,
        &[
            "salário", "salario", "holerite", "contracheque", "décimo terceiro",
            "decimo terceiro", "salary",
        ],
    ),
    (
        RevenueCategory::Freelance,
        &[
            "freela", "bico", "projeto", "serviço prestado", "servico prestado", "autônomo",
            "autonomo", "consultoria",
        ],
    ),
    (
        RevenueCategory::InvestmentIncome,
        &["dividendo", "rendimento", "juros", "proventos", "aluguel recebido", "investment"],
    ),
]);

impl Category for RevenueCategory {
    const OTHER: Self = RevenueCategory::Other;

    fn all() -> &'static [Self] {
        &[
            RevenueCategory::Salary,
            RevenueCategory::Freelance,
            RevenueCategory::InvestmentIncome,
            RevenueCategory::Other,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            RevenueCategory::Salary => "salary",
            RevenueCategory::Freelance => "freelance",
            RevenueCategory::InvestmentIncome => "investment-income",
            RevenueCategory::Other => "other",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RevenueCategory::Salary => "Salário",
            RevenueCategory::Freelance => "Freelance",
            RevenueCategory::InvestmentIncome => "Rendimentos",
            RevenueCategory::Other => "Outros",
        }
    }

    fn keywords() -> &'static KeywordTable<Self> {
        &REVENUE_KEYWORDS
    }
}

// ---------------------------------------------------------------------------
// Investments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvestmentType {
    FixedIncome,
    Equities,
    Funds,
    Crypto,
    Other,
}

pub static INVESTMENT_KEYWORDS: KeywordTable<InvestmentType> = KeywordTable::new(&[
    (
        InvestmentType::FixedIncome,
        &[
            "renda fixa", "cdb", "lci", "lca", "tesouro", "poupança", "poupanca", "debênture",
            "debenture", "fixed",
        ],
    ),
    (
        InvestmentType::Equities,
        &["ações", "acoes", "bolsa", "b3", "stock", "equities", "equity"],
    ),
    (InvestmentType::Funds, &["fundo", "fii", "etf", "funds"]),
    (
        InvestmentType::Crypto,
        &["cripto", "crypto", "bitcoin", "btc", "ethereum", "solana"],
    ),
]);

impl Category for InvestmentType {
    const OTHER: Self = InvestmentType::Other;

    fn all() -> &'static [Self] {
        &[
            InvestmentType::FixedIncome,
            InvestmentType::Equities,
            InvestmentType::Funds,
            InvestmentType::Crypto,
            InvestmentType::Other,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            InvestmentType::FixedIncome => "fixed-income",
            InvestmentType::Equities => "equities",
            InvestmentType::Funds => "funds",
            InvestmentType::Crypto => "crypto",
            InvestmentType::Other => "other",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            InvestmentType::FixedIncome => "Renda fixa",
            InvestmentType::Equities => "Ações",
            InvestmentType::Funds => "Fundos",
            InvestmentType::Crypto => "Criptomoedas",
            InvestmentType::Other => "Outros",
        }
    }

    fn keywords() -> &'static KeywordTable<Self> {
        &INVESTMENT_KEYWORDS
    }
}

/// Canonical names of a category set, for tool schema enums.
pub fn canonical_names<C: Category>() -> Vec<&'static str> {
    C::all().iter().map(|c| c.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&RevenueCategory::InvestmentIncome).unwrap();
        assert_eq!(json, "\"investment-income\"");
        let parsed: InvestmentType = serde_json::from_str("\"fixed-income\"").unwrap();
        assert_eq!(parsed, InvestmentType::FixedIncome);
    }

    #[test]
    fn serde_unknown_reads_as_other() {
        let parsed: ExpenseCategory = serde_json::from_str("\"pets\"").unwrap();
        assert_eq!(parsed, ExpenseCategory::Other);
    }

    #[test]
    fn serde_reads_labels_like_from_stored() {
        let parsed: ExpenseCategory = serde_json::from_str("\"Alimentação\"").unwrap();
        assert_eq!(parsed, ExpenseCategory::Food);
        assert_eq!(parsed, ExpenseCategory::from_stored("Alimentação"));
        let parsed: InvestmentType = serde_json::from_str("\"fixed_income\"").unwrap();
        assert_eq!(parsed, InvestmentType::FixedIncome);
    }

    #[test]
    fn serde_and_as_str_agree() {
        for c in ExpenseCategory::all() {
            assert_eq!(serde_json::to_value(c).unwrap(), c.as_str());
        }
        for c in RevenueCategory::all() {
            assert_eq!(serde_json::to_value(c).unwrap(), c.as_str());
        }
        for c in InvestmentType::all() {
            assert_eq!(serde_json::to_value(c).unwrap(), c.as_str());
        }
    }

    #[test]
    fn from_canonical_accepts_labels() {
        assert_eq!(ExpenseCategory::from_canonical("Saúde"), Some(ExpenseCategory::Health));
        assert_eq!(ExpenseCategory::from_canonical("  FOOD "), Some(ExpenseCategory::Food));
        assert_eq!(ExpenseCategory::from_canonical(""), None);
        assert_eq!(InvestmentType::from_stored("garbage"), InvestmentType::Other);
    }

    #[test]
    fn canonical_names_cover_all_members() {
        assert_eq!(
            canonical_names::<ExpenseCategory>(),
            vec!["food", "transport", "housing", "leisure", "health", "other"]
        );
    }

    #[test]
    fn canonical_names_classify_to_themselves() {
        use crate::classify::normalize;
        for c in ExpenseCategory::all() {
            assert_eq!(normalize::<ExpenseCategory>(Some(c.as_str()), None), *c);
        }
        for c in RevenueCategory::all() {
            assert_eq!(normalize::<RevenueCategory>(Some(c.as_str()), None), *c);
        }
        for c in InvestmentType::all() {
            assert_eq!(normalize::<InvestmentType>(Some(c.as_str()), None), *c);
        }
    }
}
