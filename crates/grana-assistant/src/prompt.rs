// System instruction prepended to every conversation.
//
// Carries today's date so relative expressions ("hoje", "ontem", "este mês")
// resolve against the request clock, plus the category vocabularies the tool
// schemas expect.

use chrono::NaiveDate;
use grana_core::category::{Category, ExpenseCategory, InvestmentType, RevenueCategory};
use grana_core::dates::format_br;

/// Build the Portuguese system prompt for a conversation on `today`.
pub fn system_prompt(today: NaiveDate) -> String {
    format!(
        "Você é o assistente financeiro do GranaApp. Responda sempre em português do Brasil, \
         de forma curta e amigável.\n\
         \n\
         Hoje é {br} ({iso}).\n\
         \n\
         Regras:\n\
         - Use as funções disponíveis para registrar despesas, receitas, investimentos e horas \
         extras, e para consultar totais e lançamentos.\n\
         - Quando o usuário não informar a data, use a data de hoje.\n\
         - Valores são em reais (R$). Envie apenas o número no campo do valor.\n\
         - Se faltar um dado obrigatório, como o valor, ou se o pedido for ambíguo, pergunte \
         antes de chamar qualquer função.\n\
         - Depois de executar uma função, confirme o resultado usando a mensagem retornada.\n\
         - Nunca invente lançamentos, valores ou totais.\n\
         \n\
         Categorias de despesa: {expenses}.\n\
         Categorias de receita: {revenues}.\n\
         Tipos de investimento: {investments}.",
        br = format_br(today),
        iso = today.format("%Y-%m-%d"),
        expenses = vocabulary::<ExpenseCategory>(),
        revenues = vocabulary::<RevenueCategory>(),
        investments = vocabulary::<InvestmentType>(),
    )
}

/// `food (Alimentação), transport (Transporte), ...`
fn vocabulary<C: Category>() -> String {
    C::all()
        .iter()
        .map(|c| format!("{} ({})", c.as_str(), c.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_today_in_both_formats() {
        let prompt = system_prompt(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert!(prompt.contains("Hoje é 16/10/2026 (2026-10-16)."));
    }

    #[test]
    fn prompt_lists_vocabularies() {
        let prompt = system_prompt(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert!(prompt.contains("food (Alimentação)"));
        assert!(prompt.contains("investment-income (Rendimentos)"));
        assert!(prompt.contains("fixed-income (Renda fixa)"));
        assert!(prompt.contains("pergunte antes de chamar"));
    }
}
