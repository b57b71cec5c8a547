// JSON-Schema descriptions of the seven tools. Parameter names are the
// contract with the model; handlers deserialize exactly these keys.

use grana_core::category::{canonical_names, ExpenseCategory, InvestmentType, RevenueCategory};
use grana_llm::FunctionSchema;
use serde_json::{json, Value};

use super::Tool;

const RESOURCES: [&str; 4] = ["expenses", "revenues", "investments", "overtime"];

pub(super) fn function_schema(tool: Tool) -> FunctionSchema {
    let (description, parameters) = match tool {
        Tool::CreateExpense => (
            "Registra uma despesa (gasto) do usuário.",
            json!({
                "type": "object",
                "properties": {
                    "amount": amount("Valor gasto em reais"),
                    "category": enumerated("Categoria da despesa", canonical_names::<ExpenseCategory>()),
                    "description": text("Descrição curta do gasto, ex.: 'almoço no restaurante'"),
                    "payment_method": text("Forma de pagamento, ex.: pix, cartão de crédito, dinheiro"),
                    "date": date("Data do gasto (AAAA-MM-DD). Padrão: hoje")
                },
                "required": ["amount"]
            }),
        ),
        Tool::CreateRevenue => (
            "Registra uma receita (entrada de dinheiro) do usuário.",
            json!({
                "type": "object",
                "properties": {
                    "amount": amount("Valor recebido em reais"),
                    "category": enumerated("Categoria da receita", canonical_names::<RevenueCategory>()),
                    "description": text("Descrição curta da receita"),
                    "date": date("Data do recebimento (AAAA-MM-DD). Padrão: hoje")
                },
                "required": ["amount"]
            }),
        ),
        Tool::CreateInvestment => (
            "Registra um investimento (aporte) do usuário.",
            json!({
                "type": "object",
                "properties": {
                    "amount": amount("Valor investido em reais"),
                    "investment_type": enumerated("Tipo de investimento", canonical_names::<InvestmentType>()),
                    "where_invested": text("Onde foi investido: banco, corretora ou ativo"),
                    "description": text("Descrição curta do investimento"),
                    "date": date("Data do aporte (AAAA-MM-DD). Padrão: hoje")
                },
                "required": ["amount"]
            }),
        ),
        Tool::CreateOvertime => (
            "Registra horas extras trabalhadas pelo usuário.",
            json!({
                "type": "object",
                "properties": {
                    "hourly_rate": amount("Valor da hora normal em reais"),
                    "overtime_percentage": {
                        "type": "number",
                        "description": "Adicional de hora extra como fração (0.5 = 50%, 1.0 = 100%). Padrão: 1.0"
                    },
                    "start_time": timestamp("Início das horas extras (AAAA-MM-DDTHH:MM). Padrão: agora"),
                    "end_time": timestamp("Fim das horas extras (AAAA-MM-DDTHH:MM). Padrão: agora"),
                    "payment_date": date("Data prevista de pagamento (AAAA-MM-DD). Padrão: hoje"),
                    "total_value": amount("Valor total a receber, se o usuário informou")
                },
                "required": ["hourly_rate"]
            }),
        ),
        Tool::GetExpenseSummary => (
            "Soma as despesas do usuário em um período, opcionalmente por categoria.",
            json!({
                "type": "object",
                "properties": {
                    "category": enumerated("Filtrar por categoria", canonical_names::<ExpenseCategory>()),
                    "from": date("Início do período (AAAA-MM-DD). Padrão: primeiro dia do mês"),
                    "to": date("Fim do período (AAAA-MM-DD). Padrão: hoje")
                }
            }),
        ),
        Tool::GetFinancialSummary => (
            "Soma despesas, receitas, investimentos ou horas extras em um período.",
            json!({
                "type": "object",
                "properties": {
                    "resource": enumerated("Tipo de lançamento a somar", RESOURCES.to_vec()),
                    "category": text("Filtrar por categoria (ou tipo de investimento)"),
                    "from": date("Início do período (AAAA-MM-DD). Padrão: primeiro dia do mês"),
                    "to": date("Fim do período (AAAA-MM-DD). Padrão: hoje")
                },
                "required": ["resource"]
            }),
        ),
        Tool::GetFinancialDetails => (
            "Lista os lançamentos mais recentes de um tipo em um período.",
            json!({
                "type": "object",
                "properties": {
                    "resource": enumerated("Tipo de lançamento a listar", RESOURCES.to_vec()),
                    "category": text("Filtrar por categoria (ou tipo de investimento)"),
                    "from": date("Início do período (AAAA-MM-DD). Padrão: primeiro dia do mês"),
                    "to": date("Fim do período (AAAA-MM-DD). Padrão: hoje"),
                    "limit": {
                        "type": "integer",
                        "description": "Quantidade máxima de lançamentos (1 a 50). Padrão: 20"
                    }
                },
                "required": ["resource"]
            }),
        ),
    };

    FunctionSchema {
        name: tool.name().to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn amount(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

fn text(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn date(description: &str) -> Value {
    json!({ "type": "string", "format": "date", "description": description })
}

fn timestamp(description: &str) -> Value {
    json!({ "type": "string", "format": "date-time", "description": description })
}

fn enumerated(description: &str, values: Vec<&'static str>) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_tools_require_their_amount() {
        for (tool, field) in [
            (Tool::CreateExpense, "amount"),
            (Tool::CreateRevenue, "amount"),
            (Tool::CreateInvestment, "amount"),
            (Tool::CreateOvertime, "hourly_rate"),
        ] {
            let schema = function_schema(tool);
            assert_eq!(schema.parameters["required"], json!([field]), "{}", tool.name());
        }
    }

    #[test]
    fn financial_tools_require_resource() {
        for tool in [Tool::GetFinancialSummary, Tool::GetFinancialDetails] {
            let schema = function_schema(tool);
            assert_eq!(schema.parameters["required"], json!(["resource"]));
            assert_eq!(
                schema.parameters["properties"]["resource"]["enum"],
                json!(["expenses", "revenues", "investments", "overtime"])
            );
        }
    }

    #[test]
    fn investment_type_lists_canonical_names() {
        let schema = function_schema(Tool::CreateInvestment);
        assert_eq!(
            schema.parameters["properties"]["investment_type"]["enum"],
            json!(["fixed-income", "equities", "funds", "crypto", "other"])
        );
    }
}
